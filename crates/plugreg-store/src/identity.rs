//! Plugin identifiers and name-derived paths.
//!
//! A plugin name is both the human-facing key and a relative path: the name
//! `vendor/tool` installs under `<root>/vendor/tool/`. Names are therefore
//! validated before they are ever joined onto the registry root.

use crate::error::{RegistryError, Result};
use crate::meta::META_EXTENSION;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Returns the identifier of a plugin: the lowercase hex SHA-256 of its name.
///
/// The identifier names the plugin's metadata file, which keeps metadata
/// files flat under the root even for namespaced plugins.
///
/// # Examples
///
/// ```
/// use plugreg_store::identity::plugin_id;
///
/// let id = plugin_id("vendor/tool");
/// assert_eq!(id.len(), 64);
/// assert_eq!(id, plugin_id("vendor/tool"));
/// ```
#[must_use]
pub fn plugin_id(name: &str) -> String {
    hex::encode(Sha256::digest(name.as_bytes()))
}

/// Returns the installation path of a plugin relative to the registry root.
///
/// `/`-separated segments of the name become nested directories using the
/// host separator. The name must already have passed [`validate_name`].
#[must_use]
pub fn path_fragment(name: &str) -> PathBuf {
    name.split('/').collect()
}

/// Validates that a plugin name is safe to use as a relative path.
///
/// Rejects names that:
/// - Are empty
/// - Start with `/` (absolute paths)
/// - Contain empty, `.` or `..` segments
/// - Contain backslashes, `:` or control characters
/// - Have a segment ending in `.meta` or `.meta.tmp`, which would shadow a
///   metadata file of another plugin
///
/// # Errors
///
/// Returns [`RegistryError::InvalidName`] if the name is rejected.
///
/// # Examples
///
/// ```
/// use plugreg_store::identity::validate_name;
///
/// assert!(validate_name("tool").is_ok());
/// assert!(validate_name("vendor/tool").is_ok());
/// assert!(validate_name("../tool").is_err());
/// assert!(validate_name("/etc/tool").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RegistryError::invalid_name(name, "name cannot be empty"));
    }

    if name.starts_with('/') {
        return Err(RegistryError::invalid_name(name, "name cannot be absolute"));
    }

    if name.contains('\\') {
        return Err(RegistryError::invalid_name(
            name,
            "name cannot contain backslashes",
        ));
    }

    // A segment like `C:` is a path prefix on Windows.
    if name.contains(':') {
        return Err(RegistryError::invalid_name(name, "name cannot contain ':'"));
    }

    if name.chars().any(char::is_control) {
        return Err(RegistryError::invalid_name(
            name,
            "name cannot contain control characters",
        ));
    }

    for segment in name.split('/') {
        match segment {
            "" => {
                return Err(RegistryError::invalid_name(
                    name,
                    "name cannot contain empty segments",
                ));
            }
            "." | ".." => {
                return Err(RegistryError::invalid_name(
                    name,
                    "name cannot contain '.' or '..' segments",
                ));
            }
            _ if is_metadata_file_name(segment) => {
                return Err(RegistryError::invalid_name(
                    name,
                    "name segments cannot end in a metadata file extension",
                ));
            }
            _ => {}
        }
    }

    Ok(())
}

fn is_metadata_file_name(segment: &str) -> bool {
    let segment = segment.strip_suffix(".tmp").unwrap_or(segment);
    Path::new(segment).extension().and_then(|e| e.to_str()) == Some(META_EXTENSION)
}
