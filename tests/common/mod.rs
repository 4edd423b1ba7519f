//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use beacon_core::{AnnounceError, Announcement, Announcer, BeaconController, Grains};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

/// Get the path to test fixtures
pub fn fixtures_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir).join("tests").join("fixtures")
}

/// Parse a beacon body from YAML
pub fn beacon_config(yaml: &str) -> serde_yaml::Value {
    serde_yaml::from_str(yaml)
        .unwrap_or_else(|e| panic!("Invalid test beacon config: {}", e))
}

/// Announcer that records every announcement instead of talking to a daemon
#[derive(Default)]
pub struct RecordingAnnouncer {
    announced: Mutex<Vec<Announcement>>,
}

impl RecordingAnnouncer {
    pub fn announced(&self) -> Vec<Announcement> {
        self.announced.lock().clone()
    }
}

impl Announcer for RecordingAnnouncer {
    fn announce(&self, announcement: &Announcement) -> Result<(), AnnounceError> {
        self.announced.lock().push(announcement.clone());
        Ok(())
    }
}

/// Announcer whose daemon always rejects the record
pub struct RejectingAnnouncer;

impl Announcer for RejectingAnnouncer {
    fn announce(&self, announcement: &Announcement) -> Result<(), AnnounceError> {
        Err(AnnounceError::RegisterFailed {
            service_name: announcement.service_name.clone(),
            reason: "entry group commit failed".to_string(),
        })
    }
}

/// Build a controller backed by a recording announcer
pub fn recording_controller(grains: Grains) -> (BeaconController, Arc<RecordingAnnouncer>) {
    let announcer = Arc::new(RecordingAnnouncer::default());
    let controller = BeaconController::new("avahi_announce", announcer.clone(), Arc::new(grains));
    (controller, announcer)
}
