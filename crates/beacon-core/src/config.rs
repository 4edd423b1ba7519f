//! Application configuration.
//!
//! The configuration file is YAML with three sections:
//!
//! ```yaml
//! logging:
//!   level: info
//!   format: text
//!
//! grains:
//!   file: /etc/zeroconf-beacon/grains.yaml
//!   static:
//!     serialnumber: SN-0042
//!
//! beacons:
//!   avahi_announce:
//!     interval: -1
//!     servicetype: _demo._tcp
//!     port: 1234
//!     txt:
//!       ProdName: grains.productname
//!       Comments: this is a test
//! ```
//!
//! Beacon bodies are kept as raw YAML values. They are only checked by the
//! beacon itself on its first tick.

use crate::error::ConfigError;
use crate::grains::Grains;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where static grains come from
    #[serde(default)]
    pub grains: GrainsConfig,

    /// Beacon name to raw beacon configuration, in file order
    #[serde(default)]
    pub beacons: Mapping,
}

impl AppConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml(&contents)
    }

    /// Loads configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::InvalidFormat {
            reason: e.to_string(),
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the log level is unknown, no beacon is configured
    /// or a beacon name is not a string.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging.parse_level()?;

        if self.beacons.is_empty() {
            return Err(ConfigError::invalid_value(
                "beacons",
                "at least one beacon must be configured",
            ));
        }

        if self.beacons.keys().any(|name| !name.is_string()) {
            return Err(ConfigError::invalid_value(
                "beacons",
                "beacon names must be strings",
            ));
        }

        Ok(())
    }

    /// Iterates over `(name, raw config)` pairs in file order.
    pub fn beacons(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.beacons
            .iter()
            .filter_map(|(name, config)| name.as_str().map(|name| (name, config)))
    }
}

/// Returns how often the scheduler should tick a beacon.
///
/// `None` means the beacon is ticked once and then left alone: the
/// `interval` key is absent, not an integer, or not positive.
pub fn beacon_interval(config: &Value) -> Option<Duration> {
    config
        .get("interval")
        .and_then(Value::as_i64)
        .filter(|secs| *secs > 0)
        .map(|secs| Duration::from_secs(secs as u64))
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Text
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Parses the log level string to a tracing Level.
    pub fn parse_level(&self) -> Result<Level, ConfigError> {
        self.level.parse().map_err(|_| {
            ConfigError::invalid_value("logging.level", format!("Invalid log level: {}", self.level))
        })
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON format for structured logging
    Json,
}

/// Static grains configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrainsConfig {
    /// YAML file of static grains
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Inline static grains, applied after the file
    #[serde(default, rename = "static")]
    pub static_grains: Mapping,
}

impl GrainsConfig {
    /// Collects host grains and applies the configured overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the grains file cannot be loaded.
    pub fn load(&self) -> Result<Grains, ConfigError> {
        let mut grains = Grains::collect();
        if let Some(path) = &self.file {
            grains.merge_file(path)?;
        }
        grains.merge_mapping(&self.static_grains);
        Ok(grains)
    }
}
