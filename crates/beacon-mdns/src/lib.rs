//! mDNS binding for the zeroconf beacon.
//!
//! [`MdnsAnnouncer`] owns a single `mdns-sd` responder daemon for the whole
//! process. It is connected once at startup and handed to the beacon
//! controller as its [`beacon_core::Announcer`]. If the daemon cannot be
//! started the host simply does not schedule the beacon.
//!
//! # Example
//!
//! ```no_run
//! use beacon_core::{BeaconController, Grains};
//! use beacon_mdns::MdnsAnnouncer;
//! use std::sync::Arc;
//!
//! let announcer = MdnsAnnouncer::connect().expect("mDNS daemon unavailable");
//! let controller = BeaconController::new(
//!     "avahi_announce",
//!     Arc::new(announcer),
//!     Arc::new(Grains::collect()),
//! );
//! ```

mod announcer;

pub use announcer::{normalize_service_type, MdnsAnnouncer};
