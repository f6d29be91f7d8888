//! Content comparison for destination collisions
//!
//! Two strategies: a shallow size+mtime heuristic that never reads file
//! content, and a full streaming SHA-256 digest comparison.

use crate::config::CmpMode;
use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Check whether two files hold the same content under the given mode
pub fn files_match(a: &Path, b: &Path, mode: CmpMode) -> Result<bool> {
    let same = match mode {
        CmpMode::Shallow => shallow_match(a, b)?,
        CmpMode::Hash => file_digest(a)? == file_digest(b)?,
    };
    debug!(
        a = %a.display(),
        b = %b.display(),
        ?mode,
        same,
        "compared files"
    );
    Ok(same)
}

/// Size and mtime heuristic. A file whose mtime cannot be read never
/// matches, which pushes the collision loop to the next ordinal.
fn shallow_match(a: &Path, b: &Path) -> Result<bool> {
    let meta_a = fs::metadata(a)?;
    let meta_b = fs::metadata(b)?;
    if meta_a.len() != meta_b.len() {
        return Ok(false);
    }
    match (meta_a.modified(), meta_b.modified()) {
        (Ok(mtime_a), Ok(mtime_b)) => Ok(mtime_a == mtime_b),
        _ => Ok(false),
    }
}

/// Streaming SHA-256 of a file, hex encoded
pub fn file_digest(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_with(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_digest_matches_same_content() {
        let a = temp_with(b"identical bytes");
        let b = temp_with(b"identical bytes");
        assert!(files_match(a.path(), b.path(), CmpMode::Hash).unwrap());
    }

    #[test]
    fn test_digest_differs_on_different_content() {
        let a = temp_with(b"content one");
        let b = temp_with(b"content two");
        assert!(!files_match(a.path(), b.path(), CmpMode::Hash).unwrap());
    }

    #[test]
    fn test_shallow_rejects_different_sizes() {
        let a = temp_with(b"short");
        let b = temp_with(b"much longer content");
        assert!(!files_match(a.path(), b.path(), CmpMode::Shallow).unwrap());
    }

    #[test]
    fn test_shallow_same_size_and_mtime() {
        let a = temp_with(b"same length");
        let b = temp_with(b"same length");
        let stamp = filetime::FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(a.path(), stamp).unwrap();
        filetime::set_file_mtime(b.path(), stamp).unwrap();
        assert!(files_match(a.path(), b.path(), CmpMode::Shallow).unwrap());
    }

    #[test]
    fn test_file_digest_is_stable() {
        let a = temp_with(b"digest me");
        assert_eq!(
            file_digest(a.path()).unwrap(),
            file_digest(a.path()).unwrap()
        );
    }
}
