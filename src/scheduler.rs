//! Periodic invocation of beacons.
//!
//! Each beacon gets its own task. A beacon with a positive `interval` is
//! ticked on that period; any other beacon is ticked once. Ticks of one
//! beacon never overlap.

use beacon_core::config::beacon_interval;
use beacon_core::{BeaconController, ChangeRecord};
use chrono::Utc;
use serde_yaml::Value;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info};

/// A beacon together with the configuration it is ticked with.
pub struct ScheduledBeacon {
    controller: BeaconController,
    config: Value,
    interval: Option<Duration>,
}

impl ScheduledBeacon {
    pub fn new(controller: BeaconController, config: Value) -> Self {
        let interval = beacon_interval(&config);
        Self {
            controller,
            config,
            interval,
        }
    }

    pub fn name(&self) -> &str {
        self.controller.name()
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Runs one tick and reports its events.
    pub fn run_once(&self) -> Vec<ChangeRecord> {
        match self.controller.tick(&self.config) {
            Ok(records) => {
                for record in &records {
                    emit(self.name(), record);
                }
                records
            }
            Err(e) => {
                error!(beacon = self.name(), error = %e, "Beacon tick failed");
                Vec::new()
            }
        }
    }

    async fn drive(self) {
        match self.interval {
            Some(period) => {
                let mut ticker = tokio::time::interval(period);
                loop {
                    ticker.tick().await;
                    self.run_once();
                }
            }
            None => {
                self.run_once();
            }
        }
    }
}

/// Spawns one task per beacon.
pub fn spawn_all(beacons: Vec<ScheduledBeacon>) -> JoinSet<()> {
    let mut tasks = JoinSet::new();
    for beacon in beacons {
        info!(
            beacon = beacon.name(),
            interval_secs = beacon.interval().map(|d| d.as_secs()),
            "Scheduling beacon"
        );
        tasks.spawn(beacon.drive());
    }
    tasks
}

fn emit(beacon: &str, record: &ChangeRecord) {
    match serde_json::to_string(record) {
        Ok(event) => info!(
            beacon,
            tag = %record.tag,
            stamp = %Utc::now().to_rfc3339(),
            event = %event,
            "Beacon event"
        ),
        Err(e) => error!(beacon, error = %e, "Failed to serialize beacon event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::{AnnounceError, Announcement, Announcer, Grains};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct Counter {
        calls: AtomicUsize,
    }

    impl Announcer for Counter {
        fn announce(&self, _: &Announcement) -> Result<(), AnnounceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn scheduled(body: &str, counter: Arc<Counter>) -> ScheduledBeacon {
        let controller = BeaconController::new(
            "avahi_announce",
            counter,
            Arc::new(Grains::from_pairs([("host", "box1")])),
        );
        ScheduledBeacon::new(controller, serde_yaml::from_str(body).unwrap())
    }

    #[test]
    fn test_interval_from_config() {
        let counter = Arc::new(Counter::default());
        let once = scheduled(
            "interval: -1\nservicetype: _demo._tcp\nport: 1\ntxt: {}\n",
            counter.clone(),
        );
        assert_eq!(once.interval(), None);

        let periodic = scheduled(
            "interval: 10\nservicetype: _demo._tcp\nport: 1\ntxt: {}\n",
            counter,
        );
        assert_eq!(periodic.interval(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_run_once_reports_first_tick_only() {
        let counter = Arc::new(Counter::default());
        let beacon = scheduled(
            "servicetype: _demo._tcp\nport: 1234\ntxt:\n  Comments: hi\n",
            counter.clone(),
        );

        assert_eq!(beacon.run_once().len(), 1);
        assert!(beacon.run_once().is_empty());
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_beacon_announces_once() {
        let counter = Arc::new(Counter::default());
        let beacon = scheduled(
            "interval: 5\nservicetype: _demo._tcp\nport: 1234\ntxt: {}\n",
            counter.clone(),
        );

        let mut tasks = spawn_all(vec![beacon]);
        tokio::time::sleep(Duration::from_secs(60)).await;
        tasks.abort_all();

        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
    }
}
