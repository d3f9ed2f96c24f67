use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// A regular file found while listing a directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub(crate) full_path: PathBuf,
    pub(crate) relative_path: PathBuf,
    pub(crate) depth: usize,
    pub(crate) len: u64,
}

impl Entry {
    /// Returns the absolute path to the file.
    #[must_use]
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Returns the path relative to the directory containing the listing
    /// root, so the root's own name is its first component.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Returns the final component of the path.
    ///
    /// # Examples
    ///
    /// ```
    /// use preiter::Interner;
    /// use std::sync::Arc;
    /// use walk::WalkBuilder;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let temp = tempfile::tempdir()?;
    /// let file = temp.path().join("notes.txt");
    /// std::fs::write(&file, b"data")?;
    ///
    /// let interner = Arc::new(Interner::new());
    /// let root = WalkBuilder::new(&file).build(&interner).await?;
    /// let entry = root.into_leaf().expect("a file root is a leaf");
    /// assert_eq!(entry.file_name().and_then(|name| name.to_str()), Some("notes.txt"));
    /// assert_eq!(entry.len(), 4);
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn file_name(&self) -> Option<&OsStr> {
        self.full_path.file_name()
    }

    /// Depth below the listing root. A file given as a root has depth `0`;
    /// the children of a directory root have depth `1`.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// File size in bytes when the listing was read.
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` for a zero-byte file.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}
