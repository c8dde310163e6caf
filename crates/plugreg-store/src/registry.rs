//! Plugin registry implementation.
//!
//! Provides the main [`Registry`] type for installing, listing, toggling and
//! inspecting plugins under a single root directory.

use crate::checksum::verify_file;
use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::identity::validate_name;
use crate::image::{ImageReader, PluginImage, TarImageReader};
use crate::manifest::Manifest;
use crate::meta::{META_EXTENSION, Meta};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Plugin registry rooted at one directory.
///
/// # Concurrency
///
/// Operations run to completion on the calling thread. Mutations of the same
/// plugin from several callers are not serialized: the last metadata write
/// wins. Callers that share a registry must provide their own single-writer
/// discipline per plugin name.
///
/// # Examples
///
/// ```no_run
/// use plugreg_store::{Registry, RegistryConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = Registry::new(RegistryConfig::new("./plugins"))?;
///
/// // Install under the manifest name
/// let meta = registry.install("tool.image", None)?;
/// assert!(meta.enabled);
///
/// registry.disable(&meta.name)?;
///
/// for plugin in registry.list()?.plugins {
///     println!("{} enabled={}", plugin.name, plugin.enabled);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Registry<R = TarImageReader> {
    config: RegistryConfig,
    reader: R,
}

/// Outcome of [`Registry::enable`] and [`Registry::disable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The flag was changed and persisted.
    Applied,
    /// The plugin was already in the requested state.
    Unchanged,
}

/// Result of [`Registry::list`].
///
/// A corrupt metadata file does not fail the listing; it is reported in
/// `skipped` next to the records that loaded.
#[derive(Debug, Default)]
pub struct ListReport {
    /// Records that loaded successfully, in directory order.
    pub plugins: Vec<Meta>,
    /// Metadata files that could not be loaded.
    pub skipped: Vec<SkippedEntry>,
}

/// A metadata file skipped by [`Registry::list`].
#[derive(Debug)]
pub struct SkippedEntry {
    /// Path of the metadata file.
    pub path: PathBuf,
    /// Why it was skipped.
    pub error: RegistryError,
}

/// Image selected by [`Registry::inspect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectTarget {
    /// An image file on disk.
    ImagePath(PathBuf),
    /// The name of an installed plugin.
    RegisteredName(String),
}

impl InspectTarget {
    /// Decides whether `input` names an image file or an installed plugin.
    ///
    /// Anything that exists on disk is an image path; a path that does not
    /// exist is taken as a plugin name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Io`] if existence cannot be determined, e.g.
    /// because a parent directory is not readable.
    pub fn classify(input: &str) -> Result<Self> {
        match fs::metadata(input) {
            Ok(_) => Ok(Self::ImagePath(PathBuf::from(input))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Ok(Self::RegisteredName(input.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Registry {
    /// Creates a registry reading tar-packaged images.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the root cannot be
    /// created.
    pub fn new(config: RegistryConfig) -> Result<Self> {
        Self::with_reader(config, TarImageReader)
    }
}

impl<R: ImageReader> Registry<R> {
    /// Creates a registry that opens images with `reader`.
    ///
    /// Creates the root directory when [`RegistryConfig::create_root`] is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the root cannot be
    /// created.
    pub fn with_reader(config: RegistryConfig, reader: R) -> Result<Self> {
        config.validate()?;

        if config.create_root && !config.root.exists() {
            fs::create_dir_all(&config.root)?;
            tracing::debug!("Created registry root: {}", config.root.display());
        }

        Ok(Self { config, reader })
    }

    /// Returns the registry root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.config.root()
    }

    /// Installs the plugin image at `source`.
    ///
    /// The plugin is registered under `name` when given and non-empty,
    /// otherwise under the name declared in its manifest. It starts enabled.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::Load`] - Image cannot be opened
    /// * [`RegistryError::NotAPlugin`] - Image has no plugin descriptor
    /// * [`RegistryError::InvalidName`] - Effective name is unsafe
    /// * [`RegistryError::AlreadyInstalled`] - Name is taken
    /// * [`RegistryError::Install`] - A step of the installation failed
    pub fn install(&self, source: impl AsRef<Path>, name: Option<&str>) -> Result<Meta> {
        let source = source.as_ref();
        tracing::debug!(
            "Installing plugin from {} into {}",
            source.display(),
            self.root().display()
        );

        let image = self.open_plugin(source)?;
        let manifest = image.manifest()?;

        let name = match name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => manifest.name,
        };
        validate_name(&name)?;

        let mut meta = Meta::new(self.root(), &name);
        if meta.meta_path().exists() {
            return Err(RegistryError::AlreadyInstalled { name });
        }

        meta.install(image.as_ref(), source)?;

        tracing::info!("Installed plugin {} from {}", name, source.display());
        Ok(meta)
    }

    /// Removes the plugin named `name`.
    ///
    /// A record whose metadata is corrupt is still removed, since its files
    /// can be located from the name alone.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::NotFound`] - No plugin with that name
    /// * I/O errors if a file cannot be removed
    pub fn uninstall(&self, name: &str) -> Result<()> {
        tracing::debug!("Uninstalling plugin {} from {}", name, self.root().display());

        let meta = match Meta::load_by_name(self.root(), name) {
            Ok(meta) => meta,
            Err(RegistryError::InvalidMetadata { path, reason }) => {
                tracing::warn!(
                    "Removing plugin {} with unreadable metadata {}: {}",
                    name,
                    path.display(),
                    reason
                );
                Meta::new(self.root(), name)
            }
            Err(e) => return Err(e),
        };

        tracing::debug!("Found plugin {}, meta={:?}", name, meta);
        meta.uninstall()?;

        tracing::info!("Uninstalled plugin {}", name);
        Ok(())
    }

    /// Lists all installed plugins.
    ///
    /// Scans the metadata files directly under the root. Entries that are not
    /// regular files are ignored; metadata that fails to load is reported in
    /// [`ListReport::skipped`] and does not stop the scan.
    ///
    /// # Errors
    ///
    /// Returns an I/O error only if the root itself cannot be read.
    pub fn list(&self) -> Result<ListReport> {
        let mut report = ListReport::default();

        for entry in fs::read_dir(self.root())? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(
                        "Error reading entry in {}: {}. Skip",
                        self.root().display(),
                        e
                    );
                    continue;
                }
            };

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(META_EXTENSION) {
                continue;
            }

            match fs::metadata(&path) {
                Ok(stat) if stat.is_file() => {}
                Ok(_) => {
                    tracing::debug!("Skipping non-regular entry {}", path.display());
                    continue;
                }
                Err(e) => {
                    tracing::debug!("Error stating {}: {}. Skip", path.display(), e);
                    report.skipped.push(SkippedEntry {
                        path,
                        error: e.into(),
                    });
                    continue;
                }
            }

            match Meta::load_from_file(self.root(), &path) {
                Ok(meta) => report.plugins.push(meta),
                Err(error) => {
                    tracing::debug!("Error loading {}: {}. Skip", path.display(), error);
                    report.skipped.push(SkippedEntry { path, error });
                }
            }
        }

        Ok(report)
    }

    /// Returns the record of the plugin named `name`.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::NotFound`] - No plugin with that name
    /// * [`RegistryError::InvalidMetadata`] - Metadata file is corrupt
    pub fn get(&self, name: &str) -> Result<Meta> {
        Meta::load_by_name(self.root(), name)
    }

    /// Enables the plugin named `name`.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::NotFound`] - No plugin with that name
    /// * I/O errors if the metadata file cannot be rewritten
    pub fn enable(&self, name: &str) -> Result<Transition> {
        tracing::debug!("Enabling plugin {} in {}", name, self.root().display());
        self.set_enabled(name, true)
    }

    /// Disables the plugin named `name`.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::NotFound`] - No plugin with that name
    /// * I/O errors if the metadata file cannot be rewritten
    pub fn disable(&self, name: &str) -> Result<Transition> {
        tracing::debug!("Disabling plugin {} in {}", name, self.root().display());
        self.set_enabled(name, false)
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> Result<Transition> {
        let mut meta = Meta::load_by_name(self.root(), name)?;
        tracing::debug!("Found plugin {}, meta={:?}", name, meta);

        let state = if enabled { "enabled" } else { "disabled" };
        if meta.enabled == enabled {
            tracing::info!("Plugin {} is already {}", name, state);
            return Ok(Transition::Unchanged);
        }

        meta.set_enabled(enabled)?;
        tracing::info!("Plugin {} {}", name, state);
        Ok(Transition::Applied)
    }

    /// Returns the manifest of an image file or of an installed plugin.
    ///
    /// See [`InspectTarget::classify`] for how `name_or_path` is resolved.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::NotFound`] - Neither a file nor an installed plugin
    /// * [`RegistryError::Load`] - Image cannot be opened
    /// * [`RegistryError::NotAPlugin`] - Image has no plugin descriptor
    /// * I/O errors if the path exists but cannot be examined
    pub fn inspect(&self, name_or_path: &str) -> Result<Manifest> {
        let target = InspectTarget::classify(name_or_path)?;
        self.inspect_target(&target)
    }

    /// Returns the manifest of an already classified target.
    ///
    /// # Errors
    ///
    /// Same as [`inspect`](Self::inspect).
    pub fn inspect_target(&self, target: &InspectTarget) -> Result<Manifest> {
        let path = match target {
            InspectTarget::ImagePath(path) => path.clone(),
            InspectTarget::RegisteredName(name) => {
                Meta::load_by_name(self.root(), name)?.image_path()
            }
        };

        self.open_plugin(&path)?.manifest()
    }

    /// Checks that the installed files of a plugin are present and intact.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::NotFound`] - No plugin with that name
    /// * [`RegistryError::MissingFile`] - Image, binary or config is missing
    /// * [`RegistryError::ChecksumMismatch`] - A file changed since install
    pub fn verify(&self, name: &str) -> Result<()> {
        let meta = Meta::load_by_name(self.root(), name)?;

        for path in [meta.image_path(), meta.binary_path(), meta.config_path()] {
            if !path.is_file() {
                return Err(RegistryError::MissingFile {
                    name: meta.name.clone(),
                    path,
                });
            }
        }

        if let Some(checksums) = &meta.checksums {
            verify_file(&meta.image_path(), &checksums.image)?;
            verify_file(&meta.binary_path(), &checksums.binary)?;
        } else {
            tracing::debug!("Plugin {} has no recorded checksums", name);
        }

        tracing::debug!("Verified plugin {}", name);
        Ok(())
    }

    /// Opens an image and checks that it is a plugin.
    fn open_plugin(&self, path: &Path) -> Result<Box<dyn PluginImage>> {
        let image = self
            .reader
            .open(path)
            .map_err(|source| RegistryError::Load {
                path: path.to_path_buf(),
                source,
            })?;

        if !image.is_plugin() {
            return Err(RegistryError::NotAPlugin {
                path: path.to_path_buf(),
            });
        }

        Ok(image)
    }
}
