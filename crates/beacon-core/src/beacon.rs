//! Beacon configuration: shape validation and typed decoding.

use crate::error::ConfigError;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

/// Name the beacon logs under and is configured as.
pub const BEACON_NAME: &str = "avahi_announce";

/// Keys every beacon configuration must carry.
pub const REQUIRED_KEYS: [&str; 3] = ["servicetype", "port", "txt"];

/// Checks that a raw configuration has the required shape.
///
/// Only presence is checked here; value types are enforced when the
/// configuration is decoded into a [`BeaconConfig`].
pub fn validate(config: &Value) -> Result<(), String> {
    let Some(mapping) = config.as_mapping() else {
        return Err(format!(
            "Configuration for {} beacon must be a dictionary",
            BEACON_NAME
        ));
    };

    if !REQUIRED_KEYS.iter().all(|key| mapping.contains_key(*key)) {
        return Err(format!(
            "Configuration for {} beacon must contain servicetype, port and txt items",
            BEACON_NAME
        ));
    }

    Ok(())
}

/// Typed beacon configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BeaconConfig {
    /// DNS-SD service type, e.g. `_demo._tcp`
    pub servicetype: String,

    /// Port the advertised service listens on
    pub port: u16,

    /// Descriptive metadata, values are literals or `grains.<name>`
    pub txt: Mapping,

    /// Instance name; the `host` grain is used when absent
    #[serde(default)]
    pub servicename: Option<String>,
}

impl BeaconConfig {
    /// Decodes a raw configuration value.
    ///
    /// # Errors
    ///
    /// Returns an error if a field has the wrong type.
    pub fn from_value(config: &Value) -> Result<Self, ConfigError> {
        // An explicit null servicename is rejected, not defaulted to the host grain.
        if config.get("servicename").is_some_and(Value::is_null) {
            return Err(ConfigError::invalid_value(
                "servicename",
                "must be a string when present",
            ));
        }

        let decoded: Self =
            serde_yaml::from_value(config.clone()).map_err(|e| ConfigError::InvalidFormat {
                reason: e.to_string(),
            })?;
        // Surface non-string txt entries now rather than halfway through resolution.
        decoded.txt_entries()?;
        Ok(decoded)
    }

    /// Returns the `txt` entries in configured order.
    pub fn txt_entries(&self) -> Result<Vec<(&str, &str)>, ConfigError> {
        let mut entries = Vec::with_capacity(self.txt.len());
        for (key, value) in &self.txt {
            let Some(key) = key.as_str() else {
                return Err(ConfigError::invalid_value("txt", "keys must be strings"));
            };
            let Some(value) = value.as_str() else {
                return Err(ConfigError::invalid_value(
                    format!("txt.{}", key),
                    "value must be a string",
                ));
            };
            entries.push((key, value));
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_validate_accepts_required_keys() {
        let config = yaml("servicetype: _demo._tcp\nport: 1234\ntxt: {}\n");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_rejects_non_mapping() {
        for config in [
            yaml("- servicetype: _demo._tcp"),
            yaml("just a string"),
            Value::Null,
        ] {
            let err = validate(&config).unwrap_err();
            assert!(err.contains("must be a dictionary"), "{}", err);
        }
    }

    #[test]
    fn test_validate_rejects_missing_keys() {
        for config in [
            "port: 1234\ntxt: {}\n",
            "servicetype: _demo._tcp\ntxt: {}\n",
            "servicetype: _demo._tcp\nport: 1234\n",
            "{}",
        ] {
            let err = validate(&yaml(config)).unwrap_err();
            assert!(err.contains("servicetype, port and txt"), "{}", err);
        }
    }

    #[test]
    fn test_validate_ignores_value_types() {
        let config = yaml("servicetype: 7\nport: not-a-port\ntxt: nope\n");
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_decode_full_config() {
        let config = yaml(
            r#"
interval: -1
servicetype: _demo._tcp
servicename: printer
port: 1234
txt:
  ProdName: grains.productname
  Comments: this is a test
"#,
        );

        let decoded = BeaconConfig::from_value(&config).unwrap();
        assert_eq!(decoded.servicetype, "_demo._tcp");
        assert_eq!(decoded.servicename.as_deref(), Some("printer"));
        assert_eq!(decoded.port, 1234);
        assert_eq!(
            decoded.txt_entries().unwrap(),
            vec![
                ("ProdName", "grains.productname"),
                ("Comments", "this is a test")
            ]
        );
    }

    #[test]
    fn test_decode_rejects_bad_port() {
        let config = yaml("servicetype: _demo._tcp\nport: 70000\ntxt: {}\n");
        assert!(BeaconConfig::from_value(&config).is_err());
    }

    #[test]
    fn test_decode_rejects_null_servicename() {
        let config = yaml("servicetype: _demo._tcp\nservicename: ~\nport: 1234\ntxt: {}\n");
        let err = BeaconConfig::from_value(&config).unwrap_err();
        assert!(err.to_string().contains("servicename"));
    }

    #[test]
    fn test_decode_rejects_non_string_txt_value() {
        let config = yaml("servicetype: _demo._tcp\nport: 1234\ntxt:\n  Rack: [1, 2]\n");
        let err = BeaconConfig::from_value(&config).unwrap_err();
        assert!(err.to_string().contains("txt.Rack"));
    }
}
