use std::io;
use std::path::{Path, PathBuf};

/// Error returned when a listing fails.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct WalkError {
    kind: WalkErrorKind,
}

impl WalkError {
    pub(crate) const fn new(kind: WalkErrorKind) -> Self {
        Self { kind }
    }

    pub(crate) const fn root_metadata(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::RootMetadata { path, source })
    }

    pub(crate) const fn read_dir(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::ReadDir { path, source })
    }

    pub(crate) const fn read_dir_entry(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::ReadDirEntry { path, source })
    }

    pub(crate) const fn metadata(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::Metadata { path, source })
    }

    pub(crate) const fn canonicalize(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::Canonicalize { path, source })
    }

    pub(crate) const fn unsupported_root(path: PathBuf) -> Self {
        Self::new(WalkErrorKind::UnsupportedRoot { path })
    }

    /// Returns the specific failure.
    #[must_use]
    pub const fn kind(&self) -> &WalkErrorKind {
        &self.kind
    }

    /// Returns the filesystem path associated with the error.
    ///
    /// Every failure names the path it happened on, so callers can forward it
    /// into their own diagnostics without matching on [`WalkErrorKind`].
    ///
    /// # Examples
    ///
    /// ```
    /// use preiter::Interner;
    /// use std::sync::Arc;
    /// use walk::WalkBuilder;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let interner = Arc::new(Interner::new());
    /// let result = WalkBuilder::new("./definitely_missing_root").build(&interner).await;
    /// let error = match result {
    ///     Ok(_) => panic!("missing root yields error"),
    ///     Err(error) => error,
    /// };
    /// assert!(error.path().ends_with("definitely_missing_root"));
    /// # }
    /// ```
    #[must_use]
    pub fn path(&self) -> &Path {
        self.kind.path()
    }

    /// Returns `true` when the failure means the path does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind
            .io_error()
            .is_some_and(|error| error.kind() == io::ErrorKind::NotFound)
    }
}

/// Classification of listing failures.
#[derive(Debug, thiserror::Error)]
pub enum WalkErrorKind {
    /// Failed to query metadata for a listing root.
    #[error("failed to inspect traversal root '{}': {source}", path.display())]
    RootMetadata {
        /// Path that failed to provide metadata.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// Failed to open a directory.
    #[error("failed to read directory '{}': {source}", path.display())]
    ReadDir {
        /// Directory whose contents could not be read.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// Failed to obtain a directory entry.
    #[error("failed to read entry in '{}': {source}", path.display())]
    ReadDirEntry {
        /// Directory containing the problematic entry.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// Failed to retrieve metadata for an entry.
    #[error("failed to inspect metadata for '{}': {source}", path.display())]
    Metadata {
        /// Path whose metadata could not be retrieved.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// Failed to canonicalize a directory path.
    #[error("failed to canonicalize '{}': {source}", path.display())]
    Canonicalize {
        /// Directory path that failed to canonicalize.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// The root is neither a regular file nor a directory.
    #[error("'{}' is neither a regular file nor a directory", path.display())]
    UnsupportedRoot {
        /// Offending root.
        path: PathBuf,
    },
}

impl WalkErrorKind {
    /// Returns the filesystem path tied to the failure.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::RootMetadata { path, .. }
            | Self::ReadDir { path, .. }
            | Self::ReadDirEntry { path, .. }
            | Self::Metadata { path, .. }
            | Self::Canonicalize { path, .. }
            | Self::UnsupportedRoot { path } => path,
        }
    }

    const fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::RootMetadata { source, .. }
            | Self::ReadDir { source, .. }
            | Self::ReadDirEntry { source, .. }
            | Self::Metadata { source, .. }
            | Self::Canonicalize { source, .. } => Some(source),
            Self::UnsupportedRoot { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    fn io_error(message: &'static str) -> io::Error {
        io::Error::other(message)
    }

    #[test]
    fn walk_error_path_matches_variant_path() {
        let root = WalkError::root_metadata(PathBuf::from("root"), io_error("root"));
        assert_eq!(Path::new("root"), root.path());

        let read_dir = WalkError::read_dir(PathBuf::from("dir"), io_error("dir"));
        assert_eq!(Path::new("dir"), read_dir.path());

        let read_dir_entry = WalkError::read_dir_entry(PathBuf::from("entry"), io_error("entry"));
        assert_eq!(Path::new("entry"), read_dir_entry.path());

        let canonicalize = WalkError::canonicalize(PathBuf::from("canon"), io_error("canon"));
        assert_eq!(Path::new("canon"), canonicalize.path());

        let unsupported = WalkError::unsupported_root(PathBuf::from("fifo"));
        assert_eq!(Path::new("fifo"), unsupported.path());
    }

    #[test]
    fn walk_error_display_is_specific_per_variant() {
        let read_dir = WalkError::read_dir(PathBuf::from("dir"), io_error("boom"));
        assert_eq!("failed to read directory 'dir': boom", read_dir.to_string());

        let metadata = WalkError::metadata(PathBuf::from("meta"), io_error("boom"));
        assert_eq!(
            "failed to inspect metadata for 'meta': boom",
            metadata.to_string()
        );

        let unsupported = WalkError::unsupported_root(PathBuf::from("fifo"));
        assert_eq!(
            "'fifo' is neither a regular file nor a directory",
            unsupported.to_string()
        );
    }

    #[test]
    fn walk_error_source_refers_to_underlying_io_error() {
        let error = WalkError::read_dir(PathBuf::from("dir"), io_error("source"));
        let source = error
            .source()
            .and_then(|err| err.downcast_ref::<io::Error>())
            .expect("walk error should expose the underlying io::Error");
        assert_eq!(source.to_string(), "source");
    }

    #[test]
    fn not_found_is_detected() {
        let missing = WalkError::root_metadata(
            PathBuf::from("gone"),
            io::Error::from(io::ErrorKind::NotFound),
        );
        assert!(missing.is_not_found());
        assert!(!WalkError::unsupported_root(PathBuf::from("fifo")).is_not_found());
    }

    #[test]
    fn converts_into_pull_error() {
        let sequence = preiter::Identity::fresh();
        let error = preiter::Error::pull(
            sequence,
            WalkError::read_dir(PathBuf::from("dir"), io_error("boom")),
        );
        assert_eq!(error.sequence(), Some(sequence));
        let walk = error
            .source()
            .and_then(|err| err.downcast_ref::<WalkError>())
            .expect("pull error should carry the walk error");
        assert_eq!(walk.path(), Path::new("dir"));
    }
}
