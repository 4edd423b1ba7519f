//! Resolution of `txt` values that may reference grains.

use crate::error::{BeaconError, Result};
use crate::grains::GrainSource;

/// Prefix marking a value as a reference into the grains store.
pub const GRAIN_PREFIX: &str = "grains.";

/// Resolves a single raw metadata value.
///
/// `grains.<name>` is replaced by the value of grain `<name>`; anything else
/// is returned unchanged. A reference to a missing grain is an error, there
/// is no fallback.
pub fn resolve(raw: &str, grains: &dyn GrainSource) -> Result<String> {
    match raw.strip_prefix(GRAIN_PREFIX) {
        Some(key) => grains
            .grain(key)
            .ok_or_else(|| BeaconError::missing_grain(key)),
        None => Ok(raw.to_string()),
    }
}

/// Fully resolved `txt` metadata, in the order the keys were configured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMetadata {
    entries: Vec<(String, String)>,
}

impl ResolvedMetadata {
    /// Resolves every entry of a `txt` mapping.
    pub fn resolve_all<'a>(
        txt: impl IntoIterator<Item = (&'a str, &'a str)>,
        grains: &dyn GrainSource,
    ) -> Result<Self> {
        let mut entries = Vec::new();
        for (key, raw) in txt {
            entries.push((key.to_string(), resolve(raw, grains)?));
        }
        Ok(Self { entries })
    }

    /// Returns the resolved value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates over `(key, value)` pairs in configured order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grains::Grains;

    #[test]
    fn test_resolve_grain_reference() {
        let grains = Grains::from_pairs([("productname", "Widget")]);
        assert_eq!(resolve("grains.productname", &grains).unwrap(), "Widget");
    }

    #[test]
    fn test_resolve_literal_unchanged() {
        let grains = Grains::new();
        assert_eq!(resolve("literal text", &grains).unwrap(), "literal text");
        // Only the exact prefix counts as a reference.
        assert_eq!(resolve("Grains.host", &grains).unwrap(), "Grains.host");
        assert_eq!(resolve("my grains.host", &grains).unwrap(), "my grains.host");
    }

    #[test]
    fn test_resolve_missing_grain() {
        let grains = Grains::from_pairs([("host", "node1")]);
        let err = resolve("grains.serialnumber", &grains).unwrap_err();
        assert!(matches!(err, BeaconError::MetadataLookup { ref key } if key == "serialnumber"));
    }

    #[test]
    fn test_resolve_all_keeps_order() {
        let grains = Grains::from_pairs([("productname", "Widget"), ("serialnumber", "SN-1")]);
        let metadata = ResolvedMetadata::resolve_all(
            [
                ("SerialNo", "grains.serialnumber"),
                ("ProdName", "grains.productname"),
                ("Comments", "this is a test"),
            ],
            &grains,
        )
        .unwrap();

        let keys: Vec<_> = metadata.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["SerialNo", "ProdName", "Comments"]);
        assert_eq!(metadata.get("ProdName"), Some("Widget"));
        assert_eq!(metadata.get("Comments"), Some("this is a test"));
    }

    #[test]
    fn test_resolve_all_fails_on_first_missing() {
        let grains = Grains::new();
        let result =
            ResolvedMetadata::resolve_all([("Comments", "hi"), ("Rack", "grains.rack")], &grains);
        assert!(result.is_err());
    }
}
