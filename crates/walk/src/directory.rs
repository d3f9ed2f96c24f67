use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use logging::trace_fs;
use preiter::nonblocking::{BoxCursor, Lazy, Mixed, Recursable, Sequence, Source};
use preiter::{BoxError, Identity, Interner, Node};
use tokio::fs;

use crate::entry::Entry;
use crate::error::WalkError;

/// State shared by every directory of one listing.
#[derive(Debug)]
pub(crate) struct Listing {
    pub(crate) interner: Arc<Interner<PathBuf>>,
    pub(crate) follow_symlinks: bool,
}

/// A directory whose contents are read each time a cursor is opened.
///
/// Regular files come out as leaves and subdirectories as nested
/// sequences, in lexicographic name order. Everything else is skipped.
#[derive(Clone)]
pub struct Directory {
    identity: Identity,
    listing: Arc<Listing>,
    path: PathBuf,
    relative_path: PathBuf,
    depth: usize,
    ancestors: Arc<[PathBuf]>,
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory")
            .field("identity", &self.identity)
            .field("path", &self.path)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl Directory {
    /// Listing root reached through `path`, which resolves to `canonical`.
    pub(crate) fn root(
        listing: Arc<Listing>,
        path: PathBuf,
        canonical: PathBuf,
        relative_path: PathBuf,
    ) -> Self {
        Self {
            identity: listing.interner.intern(path.clone()),
            listing,
            path,
            relative_path,
            depth: 0,
            ancestors: Arc::from([canonical]),
        }
    }

    /// Absolute path the directory was reached through.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path relative to the directory containing the listing root.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Depth below the listing root, which has depth `0`.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    fn descend(&self, path: PathBuf, relative_path: PathBuf, canonical: PathBuf) -> Recursable<Entry> {
        let mut ancestors = self.ancestors.to_vec();
        ancestors.push(canonical);
        Recursable::new(Self {
            identity: self.listing.interner.intern(path.clone()),
            listing: Arc::clone(&self.listing),
            path,
            relative_path,
            depth: self.depth + 1,
            ancestors: ancestors.into(),
        })
    }

    fn canonical(&self) -> &Path {
        self.ancestors.last().map_or(self.path.as_path(), PathBuf::as_path)
    }

    async fn read_names(&self) -> Result<Vec<OsString>, WalkError> {
        let mut reader = fs::read_dir(&self.path)
            .await
            .map_err(|error| WalkError::read_dir(self.path.clone(), error))?;
        let mut names = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|error| WalkError::read_dir_entry(self.path.clone(), error))?
        {
            names.push(entry.file_name());
        }
        names.sort();
        trace_fs!(path = %self.path.display(), entries = names.len(), "listed directory");
        Ok(names)
    }

    async fn child(&self, name: &OsStr) -> Result<Option<Mixed<Entry>>, WalkError> {
        let full_path = self.path.join(name);
        let relative_path = self.relative_path.join(name);

        let metadata = match fs::symlink_metadata(&full_path).await {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                trace_fs!(path = %full_path.display(), "entry vanished before inspection");
                return Ok(None);
            }
            Err(error) => return Err(WalkError::metadata(full_path, error)),
        };

        let file_type = metadata.file_type();
        if file_type.is_file() {
            return Ok(Some(self.leaf(full_path, relative_path, metadata.len())));
        }
        if file_type.is_dir() {
            let canonical = self.canonical().join(name);
            return Ok(Some(Node::Nested(self.descend(full_path, relative_path, canonical))));
        }
        if file_type.is_symlink() && self.listing.follow_symlinks {
            let target = match fs::metadata(&full_path).await {
                Ok(target) => target,
                Err(error) if error.kind() == io::ErrorKind::NotFound => {
                    trace_fs!(path = %full_path.display(), "skipping dangling symlink");
                    return Ok(None);
                }
                Err(error) => return Err(WalkError::metadata(full_path, error)),
            };
            if target.is_file() {
                return Ok(Some(self.leaf(full_path, relative_path, target.len())));
            }
            if target.is_dir() {
                let canonical = fs::canonicalize(&full_path)
                    .await
                    .map_err(|error| WalkError::canonicalize(full_path.clone(), error))?;
                if self.ancestors.contains(&canonical) {
                    trace_fs!(path = %full_path.display(), "skipping symlink back into an ancestor");
                    return Ok(None);
                }
                return Ok(Some(Node::Nested(self.descend(full_path, relative_path, canonical))));
            }
        }

        trace_fs!(path = %full_path.display(), "skipping entry that is neither file nor directory");
        Ok(None)
    }

    fn leaf(&self, full_path: PathBuf, relative_path: PathBuf, len: u64) -> Mixed<Entry> {
        Node::Leaf(Entry {
            full_path,
            relative_path,
            depth: self.depth + 1,
            len,
        })
    }
}

impl Sequence for Directory {
    type Item = Mixed<Entry>;

    fn identity(&self) -> Identity {
        self.identity
    }

    fn cursor(&self) -> BoxCursor<Mixed<Entry>> {
        let source = DirectorySource {
            directory: self.clone(),
            names: None,
            index: 0,
        };
        Lazy::identified(self.identity, source).cursor()
    }
}

/// Yields one directory's children, listing it on the first pull.
struct DirectorySource {
    directory: Directory,
    names: Option<Vec<OsString>>,
    index: usize,
}

#[async_trait]
impl Source<Mixed<Entry>> for DirectorySource {
    async fn pull(&mut self) -> Result<Option<Mixed<Entry>>, BoxError> {
        if self.names.is_none() {
            self.names = Some(self.directory.read_names().await?);
        }
        let names = self.names.as_deref().unwrap_or_default();
        while let Some(name) = names.get(self.index) {
            let child = self.directory.child(name).await?;
            self.index += 1;
            if child.is_some() {
                return Ok(child);
            }
        }
        Ok(None)
    }
}
