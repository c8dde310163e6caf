//! Error types for registry operations.

use std::fmt;
use std::path::PathBuf;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Step of the install sequence that failed.
///
/// Carried by [`RegistryError::Install`] so callers can tell how far an
/// installation got before it was rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStep {
    /// Creating the plugin installation directory.
    CreateDirectories,
    /// Copying the source image into the registry.
    CopyImage,
    /// Extracting the binary object from the image.
    ExtractBinary,
    /// Writing the default runtime configuration.
    WriteConfig,
    /// Writing the metadata file.
    WriteMetadata,
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            Self::CreateDirectories => "create plugin directory",
            Self::CopyImage => "copy plugin image",
            Self::ExtractBinary => "extract binary object",
            Self::WriteConfig => "write runtime configuration",
            Self::WriteMetadata => "write metadata",
        };
        f.write_str(step)
    }
}

/// Errors that can occur during registry operations.
#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    /// No plugin is installed under the given name.
    ///
    /// # Examples
    ///
    /// ```
    /// use plugreg_store::{Registry, RegistryConfig, RegistryError};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let temp = tempfile::tempdir()?;
    /// let registry = Registry::new(RegistryConfig::new(temp.path()))?;
    ///
    /// let result = registry.uninstall("nonexistent");
    /// assert!(matches!(result, Err(RegistryError::NotFound { .. })));
    /// # Ok(())
    /// # }
    /// ```
    #[error("Plugin not found: {name}")]
    NotFound {
        /// Name that did not resolve to an installed plugin
        name: String,
    },

    /// The image does not carry a plugin descriptor.
    #[error("Not a valid plugin image: {}", path.display())]
    NotAPlugin {
        /// Path of the rejected image
        path: PathBuf,
    },

    /// The image could not be opened or parsed.
    #[error("Could not load plugin image {}: {source}", path.display())]
    Load {
        /// Path of the image
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// An I/O failure interrupted the install sequence.
    #[error("Could not install plugin {name}: failed to {step}: {source}")]
    Install {
        /// Effective plugin name
        name: String,
        /// Step that failed
        step: InstallStep,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// A plugin is already installed under the given name.
    ///
    /// Uninstall the existing plugin first to replace it.
    #[error("Plugin already installed: {name}")]
    AlreadyInstalled {
        /// Name of the installed plugin
        name: String,
    },

    /// Plugin name is empty, malformed, or escapes the registry root.
    ///
    /// Names may contain `/` to namespace plugins, but every segment must be a
    /// plain directory name.
    ///
    /// # Examples
    ///
    /// ```
    /// use plugreg_store::{Registry, RegistryConfig, RegistryError};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let temp = tempfile::tempdir()?;
    /// let registry = Registry::new(RegistryConfig::new(temp.path()))?;
    ///
    /// let result = registry.enable("../escape");
    /// assert!(matches!(result, Err(RegistryError::InvalidName { .. })));
    /// # Ok(())
    /// # }
    /// ```
    #[error("Invalid plugin name: {name} ({reason})")]
    InvalidName {
        /// The rejected name
        name: String,
        /// Why the name was rejected
        reason: String,
    },

    /// A metadata file exists but cannot be used.
    #[error("Invalid metadata in {}: {reason}", path.display())]
    InvalidMetadata {
        /// Path of the metadata file
        path: PathBuf,
        /// Description of the problem
        reason: String,
    },

    /// The manifest embedded in an image cannot be decoded.
    #[error("Invalid plugin manifest: {reason}")]
    InvalidManifest {
        /// Description of the problem
        reason: String,
    },

    /// A file belonging to an installed plugin is missing.
    ///
    /// Indicates a partially removed or corrupted installation.
    #[error("Missing file in plugin {name}: {}", path.display())]
    MissingFile {
        /// Name of the plugin
        name: String,
        /// Path of the missing file
        path: PathBuf,
    },

    /// An installed file no longer matches its recorded checksum.
    #[error("Checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        /// Path of the file
        path: PathBuf,
        /// Checksum recorded at install time
        expected: String,
        /// Checksum computed now
        actual: String,
    },

    /// Registry configuration is invalid.
    #[error("Invalid registry configuration: {reason}")]
    Config {
        /// Description of the problem
        reason: String,
    },

    /// I/O error occurred during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RegistryError {
    /// Returns true if this error is recoverable.
    ///
    /// Recoverable errors are caused by user input (unknown names, bad images,
    /// name clashes) rather than by the system or by on-disk corruption.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::NotAPlugin { .. }
                | Self::AlreadyInstalled { .. }
                | Self::InvalidName { .. }
                | Self::InvalidManifest { .. }
                | Self::Config { .. }
        )
    }

    pub(crate) fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
