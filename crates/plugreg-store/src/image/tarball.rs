//! Tar-packaged plugin images.
//!
//! A plugin image is a tar archive holding a JSON manifest entry and a binary
//! object entry:
//!
//! ```text
//! tool.image
//! ├── plugin.manifest   # {"name": "vendor/tool", ...}
//! └── plugin.bin        # loadable object
//! ```
//!
//! Archives missing either entry open fine but are not plugins.

use super::{ImageReader, PluginImage};
use crate::error::{RegistryError, Result};
use crate::manifest::Manifest;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, Entry};

/// Archive entry holding the JSON manifest.
pub const MANIFEST_ENTRY: &str = "plugin.manifest";

/// Archive entry holding the binary object.
pub const BINARY_ENTRY: &str = "plugin.bin";

/// Reader for tar-packaged plugin images.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarImageReader;

impl ImageReader for TarImageReader {
    fn open(&self, path: &Path) -> io::Result<Box<dyn PluginImage>> {
        Ok(Box::new(TarImage::open(path)?))
    }
}

/// An opened tar image.
///
/// The manifest is read eagerly since it is small; the binary object is
/// streamed from the file on demand.
#[derive(Debug)]
struct TarImage {
    path: PathBuf,
    manifest: Option<Vec<u8>>,
    has_binary: bool,
}

impl TarImage {
    fn open(path: &Path) -> io::Result<Self> {
        let mut archive = Archive::new(File::open(path)?);
        let mut manifest = None;
        let mut has_binary = false;

        for entry in archive.entries()? {
            let mut entry = entry?;
            match entry_name(&entry)?.as_deref() {
                Some(MANIFEST_ENTRY) => {
                    let mut buf = Vec::new();
                    entry.read_to_end(&mut buf)?;
                    manifest = Some(buf);
                }
                Some(BINARY_ENTRY) => has_binary = true,
                _ => {}
            }
        }

        tracing::debug!(
            "Opened image {} (manifest: {}, binary: {})",
            path.display(),
            manifest.is_some(),
            has_binary
        );

        Ok(Self {
            path: path.to_path_buf(),
            manifest,
            has_binary,
        })
    }
}

impl PluginImage for TarImage {
    fn is_plugin(&self) -> bool {
        self.manifest.is_some() && self.has_binary
    }

    fn manifest(&self) -> Result<Manifest> {
        let bytes = match &self.manifest {
            Some(bytes) if self.has_binary => bytes,
            _ => {
                return Err(RegistryError::NotAPlugin {
                    path: self.path.clone(),
                });
            }
        };

        serde_json::from_slice(bytes).map_err(|e| RegistryError::InvalidManifest {
            reason: format!("{MANIFEST_ENTRY}: {e}"),
        })
    }

    fn extract_binary(&self, dst: &mut dyn Write) -> io::Result<u64> {
        let mut archive = Archive::new(File::open(&self.path)?);

        for entry in archive.entries()? {
            let mut entry = entry?;
            if entry_name(&entry)?.as_deref() == Some(BINARY_ENTRY) {
                return io::copy(&mut entry, dst);
            }
        }

        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{BINARY_ENTRY} not found in {}", self.path.display()),
        ))
    }
}

/// Returns the top-level name of an archive entry, ignoring a leading `./`.
///
/// Entries nested in directories return `None`.
fn entry_name<R: Read>(entry: &Entry<'_, R>) -> io::Result<Option<String>> {
    let path = entry.path()?;
    let mut components = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir));

    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => Ok(name.to_str().map(str::to_string)),
        _ => Ok(None),
    }
}
