//! Host facts ("grains") used to fill in beacon metadata.
//!
//! Grains are collected once at startup and are read-only afterwards. The
//! beacon only ever looks up `host` (the default service name) and whatever
//! `grains.<name>` references appear in its `txt` values.

use crate::error::ConfigError;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Read-only key/value lookup of host facts.
pub trait GrainSource: Send + Sync {
    /// Returns the value of the named grain, if present.
    fn grain(&self, key: &str) -> Option<String>;
}

/// In-memory grains store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grains {
    values: HashMap<String, String>,
}

/// DMI attributes exposed by the Linux kernel, keyed by grain name.
#[cfg(target_os = "linux")]
const DMI_GRAINS: &[(&str, &str)] = &[
    ("productname", "/sys/class/dmi/id/product_name"),
    ("serialnumber", "/sys/class/dmi/id/product_serial"),
    ("manufacturer", "/sys/class/dmi/id/sys_vendor"),
];

impl Grains {
    /// Creates an empty grains store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a grains store from key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Collects facts about the local host.
    ///
    /// Facts that cannot be read on this platform are simply absent.
    pub fn collect() -> Self {
        let mut grains = Self::new();

        match hostname::get() {
            Ok(name) => {
                let fqdn = name.to_string_lossy().into_owned();
                let host = fqdn.split('.').next().unwrap_or(&fqdn).to_string();
                grains.insert("host", host);
                grains.insert("nodename", fqdn.clone());
                grains.insert("fqdn", fqdn);
            }
            Err(e) => warn!(error = %e, "Unable to read hostname, 'host' grain unavailable"),
        }

        grains.insert("os", os_name());
        grains.insert("kernel", std::env::consts::OS);
        grains.insert("os_family", std::env::consts::FAMILY);
        grains.insert("cpuarch", std::env::consts::ARCH);
        if let Ok(n) = std::thread::available_parallelism() {
            grains.insert("num_cpus", n.get().to_string());
        }

        #[cfg(target_os = "linux")]
        {
            for (grain, path) in DMI_GRAINS {
                grains.insert_from_file(grain, Path::new(path));
            }
            grains.insert_from_file("machine_id", Path::new("/etc/machine-id"));
        }

        debug!(count = grains.len(), "Collected host grains");
        grains
    }

    /// Inserts or replaces a grain.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Overrides grains with entries from a YAML mapping.
    ///
    /// Scalar values are stringified; sequences and nested mappings are
    /// skipped since beacon metadata is flat text.
    pub fn merge_mapping(&mut self, mapping: &Mapping) {
        for (key, value) in mapping {
            let Some(key) = key.as_str() else {
                warn!(key = ?key, "Ignoring static grain with non-string key");
                continue;
            };
            match scalar_to_string(value) {
                Some(value) => self.insert(key, value),
                None => warn!(grain = key, "Ignoring static grain with non-scalar value"),
            }
        }
    }

    /// Overrides grains with the mapping stored in a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a YAML mapping.
    pub fn merge_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        // An empty grains file is valid and contributes nothing.
        if contents.trim().is_empty() {
            return Ok(());
        }

        let mapping: Mapping =
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::InvalidFormat {
                reason: format!("grains file {}: {}", path.display(), e),
            })?;
        self.merge_mapping(&mapping);
        Ok(())
    }

    /// Returns the number of grains.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no grains are known.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[cfg(target_os = "linux")]
    fn insert_from_file(&mut self, grain: &str, path: &Path) {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let value = contents.trim();
                if !value.is_empty() {
                    self.insert(grain, value);
                }
            }
            Err(e) => debug!(grain, path = %path.display(), error = %e, "Grain not readable"),
        }
    }
}

impl GrainSource for Grains {
    fn grain(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Operating system name, e.g. `Ubuntu` or `MacOS`.
///
/// Prefers the distribution name from `/etc/os-release`.
fn os_name() -> String {
    #[cfg(unix)]
    {
        if let Some(name) = std::fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|contents| os_release_name(&contents))
        {
            return name;
        }
    }

    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "MacOS",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        other => other,
    }
    .to_string()
}

#[cfg_attr(not(unix), allow(dead_code))]
fn os_release_name(contents: &str) -> Option<String> {
    contents
        .lines()
        .find_map(|line| line.strip_prefix("NAME="))
        .map(|name| name.trim().trim_matches('"').trim_matches('\'').to_string())
        .filter(|name| !name.is_empty())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
