//! Plugin manifest and generated runtime configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Manifest embedded in a plugin image.
///
/// Only `name` is required. Fields this crate does not know about are kept in
/// [`extra`](Self::extra) so a manifest survives a read/write unchanged.
///
/// # Examples
///
/// ```
/// use plugreg_store::Manifest;
///
/// let manifest: Manifest = serde_json::from_str(
///     r#"{"name": "vendor/tool", "version": "1.2.0", "license": "MIT"}"#,
/// ).unwrap();
///
/// assert_eq!(manifest.name, "vendor/tool");
/// assert_eq!(manifest.version.as_deref(), Some("1.2.0"));
/// assert_eq!(manifest.extra["license"], "MIT");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Declared plugin name, used when no name is given at install.
    pub name: String,

    /// Plugin author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,

    /// Plugin version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Short description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Additional manifest fields.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Manifest {
    /// Creates a manifest with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            author: None,
            version: None,
            description: None,
            extra: BTreeMap::new(),
        }
    }
}

/// Default runtime configuration written next to an installed binary.
///
/// The loader reads `settings` when activating the plugin; a fresh install
/// writes an empty table for the user to fill in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Registered plugin name.
    pub plugin: String,

    /// Plugin-specific settings.
    #[serde(default)]
    pub settings: toml::Table,
}

impl RuntimeConfig {
    /// Creates the default configuration for a plugin.
    #[must_use]
    pub fn for_plugin(name: &str) -> Self {
        Self {
            plugin: name.to_string(),
            settings: toml::Table::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_minimal() {
        let manifest: Manifest = serde_json::from_str(r#"{"name": "foo"}"#).unwrap();
        assert_eq!(manifest, Manifest::new("foo"));
    }

    #[test]
    fn test_manifest_requires_name() {
        let result = serde_json::from_str::<Manifest>(r#"{"version": "1.0"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_manifest_keeps_unknown_fields() {
        let json = r#"{"name":"foo","author":"Jo","homepage":"https://example.com"}"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();

        let reencoded = serde_json::to_value(&manifest).unwrap();
        assert_eq!(reencoded["homepage"], "https://example.com");
        assert_eq!(reencoded["author"], "Jo");
        assert!(reencoded.get("version").is_none());
    }

    #[test]
    fn test_runtime_config_toml() {
        let config = RuntimeConfig::for_plugin("vendor/tool");
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("plugin = \"vendor/tool\""));

        let parsed: RuntimeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
