//! CLI configuration file.
//!
//! Configuration is stored in TOML format at:
//! - Linux: `~/.config/plugreg/config.toml`
//! - macOS: `~/Library/Application Support/plugreg/config.toml`
//! - Windows: `%APPDATA%\plugreg\config.toml`
//!
//! ```toml
//! root = "/srv/plugins"
//! log_level = "warn"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "plugreg";

/// Log levels accepted in the config file.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Settings read from the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CliConfig {
    /// Registry root directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            root: None,
            log_level: default_log_level(),
        }
    }
}

impl CliConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `log_level` is not a known level or `root` is empty.
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            anyhow::bail!(
                "invalid log_level '{}', must be one of: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            );
        }

        if self.root.as_ref().is_some_and(|root| root.as_os_str().is_empty()) {
            anyhow::bail!("root must not be empty");
        }

        Ok(())
    }

    /// Loads the configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// tried and defaults are used when no file is there.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("Config file not found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;

        config.validate()?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Returns the registry root: `explicit` if given, then the configured
    /// root, then the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no root is configured and the platform has no
    /// data directory.
    pub fn resolve_root(&self, explicit: Option<PathBuf>) -> Result<PathBuf> {
        if let Some(root) = explicit.or_else(|| self.root.clone()) {
            return Ok(root);
        }

        default_root().context("failed to determine data directory, pass --root")
    }
}

/// Default configuration file path, if the platform has a config directory.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// Default registry root, if the platform has a data directory.
#[must_use]
pub fn default_root() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR).join("plugins"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = CliConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.log_level, "info");
        assert!(config.root.is_none());
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "root = \"/srv/plugins\"\nlog_level = \"warn\"\n").unwrap();

        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.root, Some(PathBuf::from("/srv/plugins")));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "root = \"/srv/plugins\"\n").unwrap();

        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let temp = TempDir::new().unwrap();
        let result = CliConfig::load(Some(&temp.path().join("absent.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_rejects_bad_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        fs::write(&path, "log_level = \"loud\"\n").unwrap();
        assert!(CliConfig::load(Some(&path)).is_err());

        fs::write(&path, "root = \"\"\n").unwrap();
        assert!(CliConfig::load(Some(&path)).is_err());

        fs::write(&path, "unknown = 1\n").unwrap();
        assert!(CliConfig::load(Some(&path)).is_err());
    }

    #[test]
    fn test_resolve_root_precedence() {
        let config = CliConfig {
            root: Some(PathBuf::from("/from/config")),
            ..CliConfig::default()
        };

        assert_eq!(
            config.resolve_root(Some(PathBuf::from("/from/flag"))).unwrap(),
            PathBuf::from("/from/flag")
        );
        assert_eq!(
            config.resolve_root(None).unwrap(),
            PathBuf::from("/from/config")
        );
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = CliConfig {
            root: Some(PathBuf::from("/srv/plugins")),
            log_level: "debug".to_string(),
        };

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: CliConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
