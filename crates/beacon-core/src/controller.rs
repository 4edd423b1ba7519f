//! One-shot registration state machine.
//!
//! A [`BeaconController`] starts uninitialized. The first call to
//! [`BeaconController::tick`] claims the registration attempt before anything
//! else happens, so a failed attempt (bad configuration, missing grain,
//! daemon error) is never retried for the lifetime of the controller. Every
//! later tick returns no changes, whatever configuration it is given.

use crate::announce::{Announcement, Announcer};
use crate::beacon::{validate, BeaconConfig};
use crate::error::{BeaconError, Result};
use crate::grains::GrainSource;
use crate::resolve::ResolvedMetadata;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use serde_yaml::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Sticky "registration attempted" flag.
#[derive(Debug, Default)]
pub struct RegistrationState {
    initialized: AtomicBool,
}

impl RegistrationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically flips the state to initialized.
    ///
    /// Returns true for exactly one caller over the lifetime of the state.
    pub fn try_claim(&self) -> bool {
        self.initialized
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}

/// Change event reported to the scheduler on the registering tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub tag: String,

    /// `txt.<key>` entries in configured order, then `servicename`,
    /// `servicetype` and `port`
    pub changes: Map<String, JsonValue>,
}

impl ChangeRecord {
    /// Creates a record with the `result` tag.
    pub fn result(changes: Map<String, JsonValue>) -> Self {
        Self {
            tag: "result".to_string(),
            changes,
        }
    }
}

/// Drives a single beacon from uninitialized to registered.
pub struct BeaconController {
    name: String,
    state: RegistrationState,
    announcer: Arc<dyn Announcer>,
    grains: Arc<dyn GrainSource>,
}

impl BeaconController {
    /// Creates a controller for the named beacon.
    ///
    /// The announcer must already be connected to its daemon.
    pub fn new(
        name: impl Into<String>,
        announcer: Arc<dyn Announcer>,
        grains: Arc<dyn GrainSource>,
    ) -> Self {
        Self {
            name: name.into(),
            state: RegistrationState::new(),
            announcer,
            grains,
        }
    }

    /// Returns the beacon name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true once the registration attempt has been consumed.
    pub fn is_initialized(&self) -> bool {
        self.state.is_initialized()
    }

    /// Runs one scheduler invocation.
    ///
    /// Invalid configuration is logged and yields no changes. Lookup and
    /// daemon failures are returned as errors. In every case the attempt is
    /// consumed.
    pub fn tick(&self, config: &Value) -> Result<Vec<ChangeRecord>> {
        if !self.state.try_claim() {
            debug!(beacon = %self.name, "Beacon already initialized, nothing to do");
            return Ok(Vec::new());
        }

        if let Err(message) = validate(config) {
            warn!(
                beacon = %self.name,
                "Beacon {} configuration invalid, not adding. {}", self.name, message
            );
            return Ok(Vec::new());
        }

        let beacon = match BeaconConfig::from_value(config) {
            Ok(beacon) => beacon,
            Err(e) => {
                warn!(
                    beacon = %self.name,
                    "Beacon {} configuration invalid, not adding. {}", self.name, e
                );
                return Ok(Vec::new());
            }
        };

        let record = self.register(&beacon)?;
        Ok(vec![record])
    }

    fn register(&self, beacon: &BeaconConfig) -> Result<ChangeRecord> {
        let service_name = match &beacon.servicename {
            Some(name) => name.clone(),
            None => self
                .grains
                .grain("host")
                .ok_or_else(|| BeaconError::missing_grain("host"))?,
        };

        let metadata = ResolvedMetadata::resolve_all(beacon.txt_entries()?, self.grains.as_ref())?;

        let mut changes = Map::new();
        for (key, value) in metadata.iter() {
            changes.insert(format!("txt.{}", key), JsonValue::from(value));
        }

        let announcement = Announcement {
            service_name,
            service_type: beacon.servicetype.clone(),
            port: beacon.port,
            metadata,
        };
        self.announcer.announce(&announcement)?;

        info!(
            beacon = %self.name,
            service_name = %announcement.service_name,
            service_type = %announcement.service_type,
            port = announcement.port,
            txt_entries = announcement.metadata.len(),
            "Service announced"
        );

        changes.insert(
            "servicename".to_string(),
            JsonValue::from(announcement.service_name),
        );
        changes.insert(
            "servicetype".to_string(),
            JsonValue::from(announcement.service_type),
        );
        changes.insert("port".to_string(), JsonValue::from(announcement.port));

        Ok(ChangeRecord::result(changes))
    }
}

impl std::fmt::Debug for BeaconController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeaconController")
            .field("name", &self.name)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
