//! Installed plugin records.
//!
//! A [`Meta`] is the unit of installed state. Its file locations are derived
//! from the plugin name and never stored:
//!
//! ```text
//! root/
//! ├── <sha256(name)>.meta      # Meta as JSON
//! └── <name>/                  # nested when the name contains '/'
//!     ├── plugin.image         # verbatim copy of the source image
//!     ├── object.bin           # extracted binary object
//!     └── config.toml          # default runtime configuration
//! ```
//!
//! The metadata file is written last, by rename, so its presence means the
//! plugin is fully installed.

use crate::checksum::checksum_file;
use crate::error::{InstallStep, RegistryError, Result};
use crate::identity::{path_fragment, plugin_id, validate_name};
use crate::image::PluginImage;
use crate::manifest::RuntimeConfig;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Extension of metadata files.
pub const META_EXTENSION: &str = "meta";

/// File name of the installed image copy.
pub const IMAGE_FILE: &str = "plugin.image";

/// File name of the extracted binary object.
pub const BINARY_FILE: &str = "object.bin";

/// File name of the generated runtime configuration.
pub const CONFIG_FILE: &str = "config.toml";

/// Blake3 checksums recorded at install time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksums {
    /// Checksum of the image copy.
    pub image: String,
    /// Checksum of the extracted binary object.
    pub binary: String,
}

/// Metadata record of an installed plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// Registered plugin name.
    pub name: String,

    /// Whether the loader should activate the plugin.
    pub enabled: bool,

    /// Integrity checksums of the installed files.
    ///
    /// Absent in records written without checksums; such records load
    /// normally and only get existence checks on verify.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksums: Option<Checksums>,

    #[serde(skip)]
    root: PathBuf,
}

impl Meta {
    /// Creates an enabled, not yet persisted record.
    pub(crate) fn new(root: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled: true,
            checksums: None,
            root: root.to_path_buf(),
        }
    }

    /// Loads the record of the plugin named `name`.
    ///
    /// # Errors
    ///
    /// * [`RegistryError::InvalidName`] - Name fails validation
    /// * [`RegistryError::NotFound`] - No metadata file for the name
    /// * [`RegistryError::InvalidMetadata`] - Metadata file is corrupt
    pub(crate) fn load_by_name(root: &Path, name: &str) -> Result<Self> {
        validate_name(name)?;

        let path = metadata_path(root, name);
        match Self::load_from_file(root, &path) {
            Err(RegistryError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                Err(RegistryError::NotFound {
                    name: name.to_string(),
                })
            }
            result => result,
        }
    }

    /// Loads a record from a metadata file under `root`.
    ///
    /// The file must be named after the identifier of the name it contains.
    pub(crate) fn load_from_file(root: &Path, path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;

        let invalid = |reason: String| RegistryError::InvalidMetadata {
            path: path.to_path_buf(),
            reason,
        };

        let mut meta: Self = serde_json::from_str(&content)
            .map_err(|e| invalid(format!("Failed to parse JSON: {e}")))?;

        validate_name(&meta.name).map_err(|e| invalid(e.to_string()))?;

        let expected = plugin_id(&meta.name);
        if path.file_stem().and_then(|s| s.to_str()) != Some(expected.as_str()) {
            return Err(invalid(format!(
                "file name does not match plugin {}",
                meta.name
            )));
        }

        meta.root = root.to_path_buf();
        Ok(meta)
    }

    /// Returns the directory holding the plugin's installed files.
    #[must_use]
    pub fn install_dir(&self) -> PathBuf {
        self.root.join(path_fragment(&self.name))
    }

    /// Returns the path of the installed image copy.
    ///
    /// Used to resolve a registered name back to a loadable image.
    #[must_use]
    pub fn image_path(&self) -> PathBuf {
        self.install_dir().join(IMAGE_FILE)
    }

    /// Returns the path of the extracted binary object.
    #[must_use]
    pub fn binary_path(&self) -> PathBuf {
        self.install_dir().join(BINARY_FILE)
    }

    /// Returns the path of the runtime configuration.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.install_dir().join(CONFIG_FILE)
    }

    /// Returns the path of the metadata file.
    #[must_use]
    pub fn meta_path(&self) -> PathBuf {
        metadata_path(&self.root, &self.name)
    }

    /// Installs the plugin from an opened image.
    ///
    /// Creates the installation directory, copies `source`, extracts the
    /// binary object, writes the runtime configuration and finally the
    /// metadata file. Files written before a failing step are removed again.
    pub(crate) fn install(&mut self, image: &dyn PluginImage, source: &Path) -> Result<()> {
        let install_dir = self.install_dir();

        self.step(
            InstallStep::CreateDirectories,
            fs::create_dir_all(&install_dir),
        )?;
        let mut guard = InstallGuard::new(&self.root, install_dir);

        let image_path = guard.track(self.image_path());
        self.step(InstallStep::CopyImage, fs::copy(source, &image_path))?;
        tracing::debug!("Copied image to {}", image_path.display());

        let binary_path = guard.track(self.binary_path());
        let size = self.step(
            InstallStep::ExtractBinary,
            extract_to(image, &binary_path),
        )?;
        tracing::debug!("Extracted binary object: {} bytes", size);

        let config_path = guard.track(self.config_path());
        self.step(
            InstallStep::WriteConfig,
            write_runtime_config(&config_path, &self.name),
        )?;
        tracing::debug!("Wrote runtime configuration");

        let checksums = self.step(
            InstallStep::WriteMetadata,
            installed_checksums(&image_path, &binary_path),
        )?;
        self.checksums = Some(checksums);
        self.enabled = true;

        guard.track(temp_path(&self.meta_path()));
        self.step(InstallStep::WriteMetadata, self.write())?;
        tracing::debug!("Wrote metadata {}", self.meta_path().display());

        guard.commit();
        Ok(())
    }

    /// Removes every file belonging to the plugin.
    ///
    /// Files that are already gone are skipped. The installation directory
    /// and empty namespace directories above it are removed afterwards;
    /// directories still holding other plugins are kept.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if an existing file cannot be removed.
    pub(crate) fn uninstall(&self) -> Result<()> {
        let install_dir = self.install_dir();

        for path in [
            self.meta_path(),
            temp_path(&self.meta_path()),
            self.image_path(),
            self.binary_path(),
            self.config_path(),
        ] {
            remove_if_exists(&path)?;
        }

        prune_empty_dirs(&install_dir, &self.root);
        Ok(())
    }

    /// Sets the enabled flag and rewrites the metadata file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the metadata file cannot be written.
    pub(crate) fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.enabled = enabled;
        self.write()?;
        Ok(())
    }

    /// Writes the metadata file through a temporary sibling and a rename.
    ///
    /// The temporary file is removed if the rename fails.
    fn write(&self) -> io::Result<()> {
        let path = self.meta_path();
        let tmp = temp_path(&path);

        let json = serde_json::to_vec_pretty(self)?;
        fs::write(&tmp, json)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            if let Err(cleanup) = remove_if_exists(&tmp) {
                tracing::warn!("Failed to clean up {}: {}", tmp.display(), cleanup);
            }
            return Err(e);
        }
        Ok(())
    }

    fn step<T>(&self, step: InstallStep, result: io::Result<T>) -> Result<T> {
        result.map_err(|source| RegistryError::Install {
            name: self.name.clone(),
            step,
            source,
        })
    }
}

/// Removes the files of an install that did not complete.
///
/// Tracked files are deleted on drop unless [`commit`](Self::commit) was
/// called, and directories left empty are pruned up to the registry root.
struct InstallGuard {
    root: PathBuf,
    install_dir: PathBuf,
    files: Vec<PathBuf>,
    cleanup: bool,
}

impl InstallGuard {
    fn new(root: &Path, install_dir: PathBuf) -> Self {
        Self {
            root: root.to_path_buf(),
            install_dir,
            files: Vec::new(),
            cleanup: true,
        }
    }

    /// Registers a file for removal and returns its path.
    fn track(&mut self, path: PathBuf) -> PathBuf {
        self.files.push(path.clone());
        path
    }

    fn commit(mut self) {
        self.cleanup = false;
    }
}

impl Drop for InstallGuard {
    fn drop(&mut self) {
        if !self.cleanup {
            return;
        }

        for path in &self.files {
            if let Err(e) = remove_if_exists(path) {
                tracing::warn!("Failed to clean up {}: {}", path.display(), e);
            }
        }
        prune_empty_dirs(&self.install_dir, &self.root);
        tracing::debug!(
            "Cleaned up incomplete installation in {}",
            self.install_dir.display()
        );
    }
}

fn metadata_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{}.{META_EXTENSION}", plugin_id(name)))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

fn extract_to(image: &dyn PluginImage, path: &Path) -> io::Result<u64> {
    let mut writer = BufWriter::new(File::create(path)?);
    let size = image.extract_binary(&mut writer)?;
    writer.flush()?;
    Ok(size)
}

fn installed_checksums(image_path: &Path, binary_path: &Path) -> io::Result<Checksums> {
    Ok(Checksums {
        image: checksum_file(image_path)?,
        binary: checksum_file(binary_path)?,
    })
}

fn write_runtime_config(path: &Path, name: &str) -> io::Result<()> {
    let config =
        toml::to_string_pretty(&RuntimeConfig::for_plugin(name)).map_err(io::Error::other)?;
    fs::write(path, config)
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        result => result,
    }
}

/// Removes `dir` and its ancestors while they are empty, stopping at `root`.
fn prune_empty_dirs(dir: &Path, root: &Path) {
    let mut current = Some(dir);

    while let Some(path) = current {
        if path == root || !path.starts_with(root) {
            break;
        }

        match fs::remove_dir(path) {
            Ok(()) => tracing::debug!("Removed empty directory {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(_) => break,
        }
        current = path.parent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;
    use tempfile::TempDir;

    /// In-memory image for driving installs without an archive.
    struct FakeImage {
        binary: Option<Vec<u8>>,
    }

    impl PluginImage for FakeImage {
        fn is_plugin(&self) -> bool {
            true
        }

        fn manifest(&self) -> Result<Manifest> {
            Ok(Manifest::new("fake"))
        }

        fn extract_binary(&self, dst: &mut dyn Write) -> io::Result<u64> {
            let binary = self
                .binary
                .as_ref()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no binary"))?;
            dst.write_all(binary)?;
            Ok(binary.len() as u64)
        }
    }

    fn source_image(temp: &TempDir) -> PathBuf {
        let path = temp.path().join("source.image");
        fs::write(&path, b"image bytes").unwrap();
        path
    }

    fn registry_root(temp: &TempDir) -> PathBuf {
        let root = temp.path().join("plugins");
        fs::create_dir(&root).unwrap();
        root
    }

    #[test]
    fn test_paths_derived_from_name() {
        let meta = Meta::new(Path::new("/reg"), "vendor/tool");

        assert_eq!(meta.install_dir(), Path::new("/reg/vendor/tool"));
        assert!(meta.image_path().ends_with(IMAGE_FILE));
        assert!(meta.binary_path().ends_with(BINARY_FILE));
        assert!(meta.config_path().ends_with(CONFIG_FILE));
        assert_eq!(
            meta.meta_path(),
            Path::new("/reg").join(format!("{}.meta", plugin_id("vendor/tool")))
        );
    }

    #[test]
    fn test_install_writes_all_files() {
        let temp = TempDir::new().unwrap();
        let root = registry_root(&temp);
        let source = source_image(&temp);
        let image = FakeImage {
            binary: Some(b"object".to_vec()),
        };

        let mut meta = Meta::new(&root, "tool");
        meta.install(&image, &source).unwrap();

        assert_eq!(fs::read(meta.image_path()).unwrap(), b"image bytes");
        assert_eq!(fs::read(meta.binary_path()).unwrap(), b"object");
        assert!(meta.config_path().exists());
        assert!(meta.meta_path().exists());
        assert!(!temp_path(&meta.meta_path()).exists());

        let checksums = meta.checksums.as_ref().unwrap();
        assert_eq!(checksums.binary, crate::checksum::calculate_checksum(b"object"));
    }

    #[test]
    fn test_failed_extract_leaves_nothing() {
        let temp = TempDir::new().unwrap();
        let root = registry_root(&temp);
        let source = source_image(&temp);
        let image = FakeImage { binary: None };

        let mut meta = Meta::new(&root, "vendor/broken");
        let result = meta.install(&image, &source);

        assert!(matches!(
            result,
            Err(RegistryError::Install {
                step: InstallStep::ExtractBinary,
                ..
            })
        ));
        assert!(!meta.meta_path().exists());
        assert!(!root.join("vendor").exists());
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_copy_reports_step() {
        let temp = TempDir::new().unwrap();
        let root = registry_root(&temp);
        let image = FakeImage {
            binary: Some(vec![1]),
        };

        let mut meta = Meta::new(&root, "tool");
        let result = meta.install(&image, &temp.path().join("missing.image"));

        assert!(matches!(
            result,
            Err(RegistryError::Install {
                step: InstallStep::CopyImage,
                ..
            })
        ));
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn test_load_by_name_roundtrip() {
        let temp = TempDir::new().unwrap();
        let root = registry_root(&temp);
        let source = source_image(&temp);
        let image = FakeImage {
            binary: Some(vec![1, 2, 3]),
        };

        let mut meta = Meta::new(&root, "vendor/tool");
        meta.install(&image, &source).unwrap();

        let loaded = Meta::load_by_name(&root, "vendor/tool").unwrap();
        assert_eq!(loaded, meta);
    }

    #[test]
    fn test_load_by_name_missing() {
        let temp = TempDir::new().unwrap();
        let root = registry_root(&temp);

        assert!(matches!(
            Meta::load_by_name(&root, "absent"),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_load_rejects_mismatched_file_name() {
        let temp = TempDir::new().unwrap();
        let root = registry_root(&temp);
        let path = metadata_path(&root, "first");
        fs::write(&path, r#"{"name":"second","enabled":true}"#).unwrap();

        assert!(matches!(
            Meta::load_from_file(&root, &path),
            Err(RegistryError::InvalidMetadata { .. })
        ));
    }

    #[test]
    fn test_load_rejects_traversal_name() {
        let temp = TempDir::new().unwrap();
        let root = registry_root(&temp);
        let path = root.join(format!("{}.meta", plugin_id("../evil")));
        fs::write(&path, r#"{"name":"../evil","enabled":true}"#).unwrap();

        assert!(matches!(
            Meta::load_from_file(&root, &path),
            Err(RegistryError::InvalidMetadata { .. })
        ));
    }

    #[test]
    fn test_load_without_checksums() {
        let temp = TempDir::new().unwrap();
        let root = registry_root(&temp);
        fs::write(
            metadata_path(&root, "legacy"),
            r#"{"name":"legacy","enabled":false}"#,
        )
        .unwrap();

        let meta = Meta::load_by_name(&root, "legacy").unwrap();
        assert!(!meta.enabled);
        assert!(meta.checksums.is_none());
    }

    #[test]
    fn test_set_enabled_persists() {
        let temp = TempDir::new().unwrap();
        let root = registry_root(&temp);
        let source = source_image(&temp);
        let image = FakeImage {
            binary: Some(vec![0]),
        };

        let mut meta = Meta::new(&root, "tool");
        meta.install(&image, &source).unwrap();

        meta.set_enabled(false).unwrap();
        assert!(!Meta::load_by_name(&root, "tool").unwrap().enabled);

        meta.set_enabled(true).unwrap();
        assert!(Meta::load_by_name(&root, "tool").unwrap().enabled);
    }

    #[test]
    fn test_failed_write_removes_temp_file() {
        let temp = TempDir::new().unwrap();
        let root = registry_root(&temp);
        let mut meta = Meta::new(&root, "tool");

        // Renaming a file over a non-empty directory fails.
        fs::create_dir(meta.meta_path()).unwrap();
        fs::write(meta.meta_path().join("occupied"), b"").unwrap();

        assert!(meta.set_enabled(false).is_err());
        assert!(!temp_path(&meta.meta_path()).exists());
        assert!(meta.meta_path().join("occupied").exists());
    }

    #[test]
    fn test_uninstall_tolerates_missing_files() {
        let temp = TempDir::new().unwrap();
        let root = registry_root(&temp);
        let source = source_image(&temp);
        let image = FakeImage {
            binary: Some(vec![0]),
        };

        let mut meta = Meta::new(&root, "vendor/tool");
        meta.install(&image, &source).unwrap();
        fs::remove_file(meta.binary_path()).unwrap();

        meta.uninstall().unwrap();
        assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
    }

    #[test]
    fn test_uninstall_keeps_nested_plugins() {
        let temp = TempDir::new().unwrap();
        let root = registry_root(&temp);
        let source = source_image(&temp);
        let image = FakeImage {
            binary: Some(vec![0]),
        };

        let mut outer = Meta::new(&root, "vendor");
        outer.install(&image, &source).unwrap();
        let mut inner = Meta::new(&root, "vendor/tool");
        inner.install(&image, &source).unwrap();

        outer.uninstall().unwrap();

        assert!(!outer.meta_path().exists());
        assert!(!outer.image_path().exists());
        assert!(inner.binary_path().exists());
        assert!(Meta::load_by_name(&root, "vendor/tool").is_ok());
    }

    #[test]
    fn test_guard_commit_keeps_files() {
        let temp = TempDir::new().unwrap();
        let root = registry_root(&temp);
        let dir = root.join("kept");
        fs::create_dir(&dir).unwrap();

        let mut guard = InstallGuard::new(&root, dir.clone());
        let file = guard.track(dir.join("file"));
        fs::write(&file, b"x").unwrap();
        guard.commit();

        assert!(file.exists());
    }

    #[test]
    fn test_guard_drop_cleans_up() {
        let temp = TempDir::new().unwrap();
        let root = registry_root(&temp);
        let dir = root.join("a").join("b");
        fs::create_dir_all(&dir).unwrap();

        {
            let mut guard = InstallGuard::new(&root, dir.clone());
            fs::write(guard.track(dir.join("file")), b"x").unwrap();
        }

        assert!(!root.join("a").exists());
        assert!(root.exists());
    }
}
