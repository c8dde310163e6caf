//! Access to plugin images.
//!
//! The registry never parses images itself. It opens them through an
//! [`ImageReader`] and asks the resulting [`PluginImage`] handle whether it is
//! a plugin, what its manifest says, and for the embedded binary object.
//! [`TarImageReader`] is the reader used by default.

mod tarball;

pub use tarball::{BINARY_ENTRY, MANIFEST_ENTRY, TarImageReader};

use crate::error::Result;
use crate::manifest::Manifest;
use std::io::{self, Write};
use std::path::Path;

/// Opens plugin images.
#[cfg_attr(test, mockall::automock)]
pub trait ImageReader {
    /// Opens the image at `path`.
    ///
    /// The returned handle is closed when dropped.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read or is not an image at
    /// all. A readable image without a plugin descriptor is not an error.
    fn open(&self, path: &Path) -> io::Result<Box<dyn PluginImage>>;
}

/// An opened image.
pub trait PluginImage {
    /// Returns whether the image carries a plugin descriptor.
    fn is_plugin(&self) -> bool;

    /// Returns the manifest embedded in the image.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotAPlugin`](crate::RegistryError::NotAPlugin)
    /// if [`is_plugin`](Self::is_plugin) is false, or
    /// [`RegistryError::InvalidManifest`](crate::RegistryError::InvalidManifest)
    /// if the manifest cannot be decoded.
    fn manifest(&self) -> Result<Manifest>;

    /// Streams the embedded binary object into `dst`, returning its size.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the image has no binary object or reading or
    /// writing fails.
    fn extract_binary(&self, dst: &mut dyn Write) -> io::Result<u64>;
}
