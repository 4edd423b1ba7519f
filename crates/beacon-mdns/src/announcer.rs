//! Service announcement through the `mdns-sd` responder.

use beacon_core::{AnnounceError, Announcement, Announcer};
use mdns_sd::{ServiceDaemon, ServiceInfo};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Default DNS-SD domain.
const LOCAL_DOMAIN: &str = "local";

/// Announces services on every interface through one mDNS responder.
pub struct MdnsAnnouncer {
    /// mDNS service daemon, shared by every announcement
    daemon: ServiceDaemon,

    /// Host name records point at, e.g. `box1.local.`
    host_name: String,

    /// Full names of registered services, unregistered on shutdown
    registered: Mutex<Vec<String>>,

    shut_down: AtomicBool,
}

impl MdnsAnnouncer {
    /// Starts the mDNS responder.
    ///
    /// # Errors
    ///
    /// Returns [`AnnounceError::Unavailable`] if the daemon cannot be started,
    /// typically because multicast sockets cannot be opened.
    pub fn connect() -> Result<Self, AnnounceError> {
        let daemon = ServiceDaemon::new().map_err(|e| {
            AnnounceError::Unavailable(format!("Failed to create mDNS daemon: {}", e))
        })?;

        let host_name = local_host_name()?;
        info!(host_name = %host_name, "mDNS responder started");

        Ok(Self {
            daemon,
            host_name,
            registered: Mutex::new(Vec::new()),
            shut_down: AtomicBool::new(false),
        })
    }

    /// Unregisters every announced service and stops the responder.
    pub fn shutdown(&self) -> Result<(), AnnounceError> {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        for fullname in self.registered.lock().drain(..) {
            match self.daemon.unregister(&fullname) {
                Ok(_) => debug!(service = %fullname, "Service unregistered"),
                Err(e) => warn!(service = %fullname, error = %e, "Failed to unregister service"),
            }
        }

        self.daemon.shutdown().map_err(|e| {
            AnnounceError::Unavailable(format!("Failed to shutdown mDNS daemon: {}", e))
        })?;

        info!("mDNS responder stopped");
        Ok(())
    }
}

impl Announcer for MdnsAnnouncer {
    fn announce(&self, announcement: &Announcement) -> Result<(), AnnounceError> {
        let service_info = service_info(announcement, &self.host_name)?;
        let fullname = service_info.get_fullname().to_string();

        debug!(
            service = %fullname,
            port = announcement.port,
            "Registering mDNS service"
        );

        self.daemon
            .register(service_info)
            .map_err(|e| AnnounceError::RegisterFailed {
                service_name: announcement.service_name.clone(),
                reason: e.to_string(),
            })?;

        self.registered.lock().push(fullname);
        Ok(())
    }
}

impl Drop for MdnsAnnouncer {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "Failed to stop mDNS responder on drop");
        }
    }
}

/// Qualifies a configured service type with the local domain.
///
/// `_demo._tcp`, `_demo._tcp.local` and `_demo._tcp.local.` all become
/// `_demo._tcp.local.`.
pub fn normalize_service_type(service_type: &str) -> String {
    let trimmed = service_type.trim_end_matches('.');
    let suffix = format!(".{}", LOCAL_DOMAIN);
    if trimmed.ends_with(&suffix) {
        format!("{}.", trimmed)
    } else {
        format!("{}{}.", trimmed, suffix)
    }
}

/// Builds the service record, with addresses filled in by the daemon for
/// every interface.
fn service_info(announcement: &Announcement, host_name: &str) -> Result<ServiceInfo, AnnounceError> {
    // TXT entries go on the wire in configured order.
    let properties: Vec<(&str, &str)> = announcement.metadata.iter().collect();

    let service_info = ServiceInfo::new(
        &normalize_service_type(&announcement.service_type),
        &announcement.service_name,
        host_name,
        "",
        announcement.port,
        properties.as_slice(),
    )
    .map_err(|e| AnnounceError::InvalidRecord {
        service_name: announcement.service_name.clone(),
        reason: e.to_string(),
    })?;

    Ok(service_info.enable_addr_auto())
}

fn local_host_name() -> Result<String, AnnounceError> {
    let name = hostname::get()
        .map_err(|e| AnnounceError::Unavailable(format!("Failed to read hostname: {}", e)))?;
    let name = name.to_string_lossy();
    let short = name.split('.').next().unwrap_or(&name);
    Ok(format!("{}.{}.", short, LOCAL_DOMAIN))
}
