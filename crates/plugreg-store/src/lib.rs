//! Installation registry for plugins packaged as single-file images.
//!
//! A plugin image bundles one binary object with a manifest. Installing an
//! image copies it into the registry root, extracts the binary object next to
//! it, writes a default runtime configuration and records the plugin in a
//! metadata file. Installed plugins can then be listed, enabled, disabled,
//! inspected, verified and uninstalled by name.
//!
//! # Architecture
//!
//! ```text
//! ./plugins/
//! ├── 2c26b4...e7ae.meta     # {"name": "foo", "enabled": true, ...}
//! ├── <sha256>.meta          # {"name": "vendor/tool", ...}
//! ├── foo/
//! │   ├── plugin.image       # copy of the installed image
//! │   ├── object.bin         # extracted binary object
//! │   └── config.toml        # runtime configuration
//! └── vendor/
//!     └── tool/
//!         └── ...
//! ```
//!
//! Metadata files are named by the SHA-256 of the plugin name and live
//! directly under the root; installed files live under the name itself, so
//! `vendor/tool` nests inside `vendor/`.
//!
//! # Examples
//!
//! ```no_run
//! use plugreg_store::{Registry, RegistryConfig, Transition};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Registry::new(RegistryConfig::new("./plugins"))?;
//!
//! registry.install("downloads/tool.image", Some("vendor/tool"))?;
//!
//! let manifest = registry.inspect("vendor/tool")?;
//! println!("{} {:?}", manifest.name, manifest.version);
//!
//! assert_eq!(registry.disable("vendor/tool")?, Transition::Applied);
//! assert_eq!(registry.disable("vendor/tool")?, Transition::Unchanged);
//!
//! let report = registry.list()?;
//! for skipped in &report.skipped {
//!     eprintln!("skipped {}: {}", skipped.path.display(), skipped.error);
//! }
//!
//! registry.uninstall("vendor/tool")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Security
//!
//! Plugin names come from untrusted manifests and users. They are validated
//! before use as paths: absolute names and `.`/`..` segments are rejected.
//! Blake3 checksums detect accidental corruption of installed files; they are
//! not signatures.

#![deny(unsafe_code)]
#![warn(missing_docs, missing_debug_implementations)]

pub mod checksum;
pub mod config;
pub mod error;
pub mod identity;
pub mod image;
pub mod manifest;
pub mod meta;
pub mod registry;

// Re-export main types
pub use config::{RegistryConfig, RegistryConfigBuilder};
pub use error::{InstallStep, RegistryError, Result};
pub use image::{ImageReader, PluginImage, TarImageReader};
pub use manifest::{Manifest, RuntimeConfig};
pub use meta::{Checksums, Meta};
pub use registry::{InspectTarget, ListReport, Registry, SkippedEntry, Transition};
