//! Registry configuration.
//!
//! # Examples
//!
//! ```
//! use plugreg_store::RegistryConfig;
//!
//! let config = RegistryConfig::builder()
//!     .root("/var/lib/plugreg")
//!     .create_root(false)
//!     .build();
//!
//! assert!(config.validate().is_ok());
//! assert!(!config.create_root);
//! ```

use crate::error::{RegistryError, Result};
use std::path::{Path, PathBuf};

/// Configuration of a single registry.
///
/// Every [`Registry`](crate::Registry) owns one, so independent registries
/// (e.g. one per test) can live in the same process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Directory under which all plugin state is stored.
    pub root: PathBuf,

    /// Create the root directory when the registry is constructed.
    ///
    /// Default: true
    pub create_root: bool,
}

impl RegistryConfig {
    /// Creates a configuration for the given root with default options.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            create_root: true,
        }
    }

    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Config`] if the root path is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use plugreg_store::RegistryConfig;
    ///
    /// assert!(RegistryConfig::new("plugins").validate().is_ok());
    /// assert!(RegistryConfig::new("").validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.root.as_os_str().is_empty() {
            return Err(RegistryError::Config {
                reason: "registry root cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Returns the registry root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Builder for [`RegistryConfig`].
#[derive(Debug, Clone, Default)]
pub struct RegistryConfigBuilder {
    root: Option<PathBuf>,
    create_root: Option<bool>,
}

impl RegistryConfigBuilder {
    /// Creates a builder with every option unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the registry root.
    #[must_use]
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Sets whether the root is created on construction.
    #[must_use]
    pub const fn create_root(mut self, create: bool) -> Self {
        self.create_root = Some(create);
        self
    }

    /// Builds the configuration.
    ///
    /// An unset root stays empty and is rejected by
    /// [`RegistryConfig::validate`].
    #[must_use]
    pub fn build(self) -> RegistryConfig {
        RegistryConfig {
            root: self.root.unwrap_or_default(),
            create_root: self.create_root.unwrap_or(true),
        }
    }
}
