//! # Beacon Core
//!
//! Validation, metadata resolution and the one-shot registration state machine
//! behind the zeroconf announcement beacon.
//!
//! A beacon is invoked on a schedule. On its first tick it validates its raw
//! configuration, resolves every `txt` value (literal, or `grains.<name>`
//! looked up in the host facts store), hands the record to an [`Announcer`]
//! and reports the registration as a [`ChangeRecord`]. Every later tick is a
//! no-op.
//!
//! - **Config**: YAML application configuration (`logging`, `grains`, `beacons`).
//! - **Grains**: read-only host facts, collected once at startup.
//! - **Controller**: the [`BeaconController`] and its [`RegistrationState`].
//!
//! ## Example
//!
//! ```
//! use beacon_core::{Announcement, Announcer, AnnounceError, BeaconController, Grains};
//! use std::sync::Arc;
//!
//! struct Discard;
//!
//! impl Announcer for Discard {
//!     fn announce(&self, _: &Announcement) -> Result<(), AnnounceError> {
//!         Ok(())
//!     }
//! }
//!
//! let grains = Grains::from_pairs([("host", "box1")]);
//! let controller = BeaconController::new("avahi_announce", Arc::new(Discard), Arc::new(grains));
//!
//! let config: serde_yaml::Value = serde_yaml::from_str(
//!     "servicetype: _demo._tcp\nport: 1234\ntxt:\n  Comments: hi\n",
//! )
//! .unwrap();
//!
//! assert_eq!(controller.tick(&config).unwrap().len(), 1);
//! assert!(controller.tick(&config).unwrap().is_empty());
//! ```

pub mod announce;
pub mod beacon;
pub mod config;
pub mod controller;
pub mod error;
pub mod grains;
pub mod resolve;

pub use announce::{Announcement, Announcer};
pub use beacon::{validate, BeaconConfig};
pub use config::AppConfig;
pub use controller::{BeaconController, ChangeRecord, RegistrationState};
pub use error::{AnnounceError, BeaconError, ConfigError, Result};
pub use grains::{GrainSource, Grains};
pub use resolve::{resolve, ResolvedMetadata};
