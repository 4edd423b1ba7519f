//! Boundary to the discovery daemon.

use crate::error::AnnounceError;
use crate::resolve::ResolvedMetadata;

/// A service record ready to be published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    /// Instance name, e.g. the host name
    pub service_name: String,

    /// DNS-SD service type as configured, e.g. `_demo._tcp`
    pub service_type: String,

    /// Port of the advertised service
    pub port: u16,

    /// TXT record contents
    pub metadata: ResolvedMetadata,
}

/// A session with a zeroconf discovery daemon.
///
/// Implementations hold a connection established once at startup. Each call
/// adds the record on every interface and protocol, with the daemon's default
/// domain and host, and commits it so broadcasting begins.
pub trait Announcer: Send + Sync {
    fn announce(&self, announcement: &Announcement) -> Result<(), AnnounceError>;
}
