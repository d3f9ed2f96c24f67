#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Temporary directory trees for tests.
//!
//! [`TempTree::with`] builds a tree from a list of relative paths: entries
//! ending in `/` become directories, everything else becomes a file whose
//! contents are its own path. Parent directories are created as needed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A directory tree removed when dropped.
#[derive(Debug)]
pub struct TempTree {
    dir: TempDir,
}

impl TempTree {
    /// Creates an empty tree.
    pub fn new() -> io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Creates a tree holding `entries`.
    ///
    /// ```
    /// let tree = test_support::TempTree::with(&["a.txt", "b/", "b/c.txt"]).unwrap();
    /// assert!(tree.path().join("b/c.txt").is_file());
    /// ```
    pub fn with(entries: &[&str]) -> io::Result<Self> {
        let tree = Self::new()?;
        for entry in entries {
            match entry.strip_suffix('/') {
                Some(dir) => {
                    tree.dir(dir)?;
                }
                None => {
                    tree.file(entry, entry.as_bytes())?;
                }
            }
        }
        Ok(tree)
    }

    /// Root of the tree.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `relative` inside the tree.
    #[must_use]
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Creates a directory and its parents.
    pub fn dir(&self, relative: impl AsRef<Path>) -> io::Result<PathBuf> {
        let path = self.join(relative);
        fs::create_dir_all(&path)?;
        Ok(path)
    }

    /// Writes a file, creating its parents.
    pub fn file(&self, relative: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> io::Result<PathBuf> {
        let path = self.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Creates a symlink at `link` pointing to `target`, both relative to
    /// the tree root.
    #[cfg(unix)]
    pub fn symlink(&self, target: impl AsRef<Path>, link: impl AsRef<Path>) -> io::Result<PathBuf> {
        let path = self.join(link);
        std::os::unix::fs::symlink(self.join(target), &path)?;
        Ok(path)
    }
}
