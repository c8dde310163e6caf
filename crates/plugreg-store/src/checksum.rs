//! Blake3 checksums for installed plugin files.
//!
//! Checksums are recorded in the metadata file at install time and checked by
//! [`Registry::verify`](crate::Registry::verify). They are stored as
//! `"blake3:<hex>"` so the algorithm can change without breaking old records.

use crate::error::{RegistryError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const PREFIX: &str = "blake3:";

/// Calculates the checksum of an in-memory buffer.
///
/// # Examples
///
/// ```
/// use plugreg_store::checksum::calculate_checksum;
///
/// let checksum = calculate_checksum(b"plugin bytes");
/// assert!(checksum.starts_with("blake3:"));
/// assert_eq!(checksum.len(), 71);
/// ```
#[must_use]
pub fn calculate_checksum(data: &[u8]) -> String {
    format!("{PREFIX}{}", blake3::hash(data).to_hex())
}

/// Calculates the checksum of a file without loading it into memory.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read.
pub fn checksum_file(path: &Path) -> std::io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    hasher.update_reader(BufReader::new(File::open(path)?))?;
    Ok(format!("{PREFIX}{}", hasher.finalize().to_hex()))
}

/// Verifies that a file matches the expected checksum.
///
/// # Errors
///
/// Returns [`RegistryError::ChecksumMismatch`] if the content changed, or an
/// I/O error if the file cannot be read.
pub fn verify_file(path: &Path, expected: &str) -> Result<()> {
    let actual = checksum_file(path)?;

    if !constant_time_compare(&actual, expected) {
        return Err(RegistryError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

/// Compares two strings without exiting early on the first differing byte.
///
/// # Examples
///
/// ```
/// # use plugreg_store::checksum::constant_time_compare;
/// assert!(constant_time_compare("blake3:abc123", "blake3:abc123"));
/// assert!(!constant_time_compare("blake3:abc123", "blake3:def456"));
/// assert!(!constant_time_compare("blake3:abc", "blake3:abcdef"));
/// ```
#[must_use]
#[allow(clippy::similar_names)]
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    let (bytes_a, bytes_b) = (a.as_bytes(), b.as_bytes());
    let max_len = bytes_a.len().max(bytes_b.len());

    let mut diff = 0u8;
    for i in 0..max_len {
        let byte_a = bytes_a.get(i).copied().unwrap_or(0);
        let byte_b = bytes_b.get(i).copied().unwrap_or(0);
        diff |= byte_a ^ byte_b;
    }

    bytes_a.len() == bytes_b.len() && diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_calculate_checksum_deterministic() {
        let checksum = calculate_checksum(b"Hello, world!");

        assert!(checksum.starts_with("blake3:"));
        assert_eq!(checksum.len(), 71);
        assert_eq!(checksum, calculate_checksum(b"Hello, world!"));
        assert_ne!(checksum, calculate_checksum(b"Different data"));
    }

    #[test]
    fn test_checksum_file_matches_buffer() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("object.bin");
        let data = vec![0x7f, b'E', b'L', b'F', 0x02, 0x01];
        fs::write(&path, &data).unwrap();

        assert_eq!(checksum_file(&path).unwrap(), calculate_checksum(&data));
    }

    #[test]
    fn test_verify_file_detects_change() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("object.bin");
        fs::write(&path, b"original").unwrap();
        let expected = checksum_file(&path).unwrap();

        assert!(verify_file(&path, &expected).is_ok());

        fs::write(&path, b"tampered").unwrap();
        match verify_file(&path, &expected) {
            Err(RegistryError::ChecksumMismatch {
                expected: recorded,
                actual,
                ..
            }) => {
                assert_eq!(recorded, expected);
                assert_ne!(actual, expected);
            }
            other => panic!("Expected ChecksumMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_verify_file_missing() {
        let temp = TempDir::new().unwrap();
        let result = verify_file(&temp.path().join("absent"), "blake3:00");
        assert!(matches!(result, Err(RegistryError::Io(_))));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("", ""));
        assert!(constant_time_compare("test", "test"));
        assert!(!constant_time_compare("test", "best"));
        assert!(!constant_time_compare("long", "sh"));
        assert!(!constant_time_compare("", "nonempty"));
    }
}
