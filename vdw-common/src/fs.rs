//! Atomic file operations
//!
//! Writes go to a temporary file in the target's directory which is then
//! renamed over the target, so readers only ever see the old or the new
//! content.

use crate::{Error, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically replace `target` with `contents`
///
/// Creates the parent directory if missing. The temporary file is removed
/// if any step before the rename fails.
pub fn write_atomic(target: &Path, contents: &[u8]) -> Result<()> {
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;

    temp.persist(target)
        .map_err(|e| Error::Io(e.error))?;

    tracing::debug!(path = %target.display(), bytes = contents.len(), "Atomic write complete");
    Ok(())
}

/// Remove a file, treating "already absent" as success
///
/// Returns `true` if a file was removed.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_file_and_parent() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested").join("out.json");

        write_atomic(&target, b"{\"a\":1}").unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"{\"a\":1}");
    }

    #[test]
    fn test_write_atomic_replaces_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.json");

        write_atomic(&target, b"old content that is longer").unwrap();
        write_atomic(&target, b"new").unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"new");
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "temp file left behind");
    }

    #[test]
    fn test_remove_if_exists() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("gone.txt");

        assert!(!remove_if_exists(&target).unwrap());
        std::fs::write(&target, "x").unwrap();
        assert!(remove_if_exists(&target).unwrap());
        assert!(!target.exists());
    }
}
