//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait allows socket discovery to walk both the real
//! `/var/run/ceph` tree and an in-memory mock in tests.

use std::io;
use std::path::{Path, PathBuf};

/// Abstraction for the filesystem operations discovery needs.
pub trait FileSystem: Send + Sync {
    /// Lists entries in a directory.
    ///
    /// Returns the full paths of the entries, or an I/O error if the
    /// directory cannot be read.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Returns `true` if the path is a directory that traversal should
    /// descend into. Symlinks are not followed, so a link cycle under
    /// the socket directory cannot recurse without bound.
    fn is_dir(&self, path: &Path) -> bool;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.symlink_metadata().is_ok_and(|m| m.is_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_real_fs_read_dir() {
        let fs = RealFs::new();
        let src_dir = env::current_dir().unwrap().join("src");
        let entries = fs.read_dir(&src_dir).unwrap();
        assert!(!entries.is_empty());
    }

    #[test]
    fn test_real_fs_read_dir_missing() {
        let fs = RealFs::new();
        assert!(fs.read_dir(Path::new("/nonexistent/path/12345")).is_err());
    }

    #[test]
    fn test_real_fs_is_dir() {
        let fs = RealFs::new();
        assert!(fs.is_dir(&env::current_dir().unwrap()));
        assert!(!fs.is_dir(Path::new("/nonexistent/path/12345")));
    }

    #[test]
    fn test_real_fs_is_dir_ignores_symlinked_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let fs = RealFs::new();
        assert!(fs.is_dir(&target));
        assert!(!fs.is_dir(&link));
    }
}
