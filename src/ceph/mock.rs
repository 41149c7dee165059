//! In-memory mock filesystem for testing discovery without real sockets.
//!
//! `MockFs` simulates a directory tree in memory, allowing tests to build
//! arbitrary `/var/run/ceph` layouts without touching the disk.

use crate::ceph::traits::FileSystem;
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
///
/// Stores file and directory paths in memory. File contents are not
/// modeled; discovery only inspects names.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: HashSet<PathBuf>,
    directories: HashSet<PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file. Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path);
    }

    /// Adds an empty directory, along with its parents.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

impl FileSystem for MockFs {
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let entries: Vec<PathBuf> = self
            .files
            .iter()
            .chain(self.directories.iter())
            .filter(|entry| entry.parent().is_some_and(|parent| parent == path))
            .cloned()
            .collect();

        Ok(entries)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.directories.contains(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_add_file_creates_parents() {
        let mut fs = MockFs::new();
        fs.add_file("/var/run/ceph/ceph-osd.1.asok");

        assert!(fs.is_dir(Path::new("/var/run/ceph")));
        assert!(!fs.is_dir(Path::new("/var/run/ceph/ceph-osd.1.asok")));
    }

    #[test]
    fn test_mock_fs_read_dir() {
        let mut fs = MockFs::new();
        fs.add_file("/var/run/ceph/ceph-osd.1.asok");
        fs.add_file("/var/run/ceph/ceph-osd.2.asok");
        fs.add_dir("/var/run/ceph/fsid");

        let entries = fs.read_dir(Path::new("/var/run/ceph")).unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_mock_fs_read_dir_missing() {
        let fs = MockFs::new();
        let result = fs.read_dir(Path::new("/nonexistent"));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
