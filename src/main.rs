use anyhow::{Context, Result};
use beacon_core::{AppConfig, BeaconController};
use beacon_mdns::MdnsAnnouncer;
use clap::Parser;
use scheduler::ScheduledBeacon;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

mod logging;
mod scheduler;

/// zeroconf-beacon - announce local services over mDNS/DNS-SD
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "BEACON_CONFIG", default_value = "config/config.yaml")]
    config: PathBuf,

    /// Override the configured log level
    #[arg(long, env = "BEACON_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config file: {:?}", args.config))?;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate().context("Invalid configuration")?;

    logging::init(&config.logging);
    info!("Configuration loaded from {:?}", args.config);

    let grains = Arc::new(config.grains.load().context("Failed to load grains")?);
    info!(count = grains.len(), "Grains loaded");

    // Without a responder there is nothing to announce through, so the
    // beacons are not scheduled at all.
    let announcer = match MdnsAnnouncer::connect() {
        Ok(announcer) => Arc::new(announcer),
        Err(e) => {
            warn!(error = %e, "Zeroconf support unavailable, no beacons scheduled");
            return Ok(());
        }
    };

    let beacons = config
        .beacons()
        .map(|(name, body)| {
            let controller = BeaconController::new(name, announcer.clone(), grains.clone());
            ScheduledBeacon::new(controller, body.clone())
        })
        .collect();

    let mut tasks = scheduler::spawn_all(beacons);

    signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Received shutdown signal, stopping beacons...");

    tasks.shutdown().await;
    announcer.shutdown()?;

    Ok(())
}
