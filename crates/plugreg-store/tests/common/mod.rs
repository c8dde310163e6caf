//! Helpers for building plugin images in tests.

#![allow(dead_code)]

use plugreg_store::image::{BINARY_ENTRY, MANIFEST_ENTRY};
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Writes a tar archive with the given entries to `path`.
pub fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
    let mut builder = tar::Builder::new(File::create(path).expect("failed to create archive"));
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, *data)
            .expect("failed to append entry");
    }
    builder.finish().expect("failed to finish archive");
}

/// Writes a plugin image declaring `name` into `dir` and returns its path.
pub fn plugin_image(dir: &Path, file_name: &str, name: &str) -> PathBuf {
    let path = dir.join(file_name);
    let manifest = format!(
        r#"{{"name":"{name}","version":"1.0.0","author":"Test Author","description":"Test plugin"}}"#
    );
    let binary = format!("\x7fELF binary object of {name}");
    write_archive(
        &path,
        &[
            (MANIFEST_ENTRY, manifest.as_bytes()),
            (BINARY_ENTRY, binary.as_bytes()),
        ],
    );
    path
}

/// Writes a well-formed archive that is not a plugin.
pub fn plain_archive(dir: &Path, file_name: &str) -> PathBuf {
    let path = dir.join(file_name);
    write_archive(&path, &[("README.md", b"# not a plugin".as_slice())]);
    path
}

/// Returns every path below `dir`, relative to it, sorted.
pub fn tree(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .map(|entry| {
            entry
                .path()
                .strip_prefix(dir)
                .expect("path under base")
                .to_path_buf()
        })
        .collect();
    paths.sort();
    paths
}
