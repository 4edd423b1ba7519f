//! Error types for the beacon.
//!
//! Configuration problems inside a beacon body are recovered by the controller
//! (logged and swallowed). Everything else that goes wrong during the single
//! registration attempt surfaces as a [`BeaconError`].

use thiserror::Error;

/// Result type alias using BeaconError as the error type.
pub type Result<T> = std::result::Result<T, BeaconError>;

/// Top-level error type for a beacon tick.
#[derive(Debug, Error)]
pub enum BeaconError {
    /// Malformed or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A `grains.<name>` reference (or the `host` default) named a missing grain
    #[error("Grain not found: {key}")]
    MetadataLookup { key: String },

    /// The discovery daemon rejected or failed the registration
    #[error("Announcement failed: {0}")]
    Announce(#[from] AnnounceError),
}

impl BeaconError {
    /// Creates a metadata lookup error for the given grain key.
    pub fn missing_grain(key: impl Into<String>) -> Self {
        Self::MetadataLookup { key: key.into() }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {reason}")]
    InvalidFormat { reason: String },

    /// Invalid configuration value
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the discovery daemon binding.
#[derive(Debug, Error)]
pub enum AnnounceError {
    /// The daemon session could not be established
    #[error("Discovery daemon unavailable: {0}")]
    Unavailable(String),

    /// The service record could not be built from the given values
    #[error("Invalid service record '{service_name}': {reason}")]
    InvalidRecord {
        service_name: String,
        reason: String,
    },

    /// The daemon refused to register or commit the record
    #[error("Failed to register service '{service_name}': {reason}")]
    RegisterFailed {
        service_name: String,
        reason: String,
    },
}
