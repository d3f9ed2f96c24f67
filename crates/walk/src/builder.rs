use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use preiter::Interner;
use preiter::nonblocking::{Array, Mixed, Recursable};
use preiter::Node;
use tokio::fs;
use tracing::warn;

use crate::directory::{Directory, Listing};
use crate::entry::Entry;
use crate::error::WalkError;

/// A listing root: a single file, or a directory to be flattened.
pub type Root = Mixed<Entry>;

/// Options shared by every root of a listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkOptions {
    /// Descend into symlinked directories and list symlinked files.
    pub follow_symlinks: bool,
}

/// Configures a listing rooted at a specific path.
#[derive(Clone, Debug)]
pub struct WalkBuilder {
    root: PathBuf,
    options: WalkOptions,
}

impl WalkBuilder {
    /// Creates a new builder that will list the provided root path.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self::with_options(root, WalkOptions::default())
    }

    /// Creates a builder with preset options.
    #[must_use]
    pub fn with_options<P: Into<PathBuf>>(root: P, options: WalkOptions) -> Self {
        Self {
            root: root.into(),
            options,
        }
    }

    /// Configures whether symlinks are followed.
    ///
    /// When enabled, a symlink to a directory is listed like a directory
    /// while keeping the symlink's own path in emitted [`Entry`] values.
    /// Symlinks leading back into one of their own ancestors are skipped.
    #[must_use]
    pub const fn follow_symlinks(mut self, follow: bool) -> Self {
        self.options.follow_symlinks = follow;
        self
    }

    /// Inspects the root and returns it as a leaf or a nested directory.
    ///
    /// Nothing below the root is read until a cursor steps into it.
    /// Directory identities come from `interner`, keyed by path, so building
    /// the same root twice yields sequences with equal identities.
    pub async fn build(self, interner: &Arc<Interner<PathBuf>>) -> Result<Root, WalkError> {
        let root = absolutize(self.root)?;
        let mut metadata = fs::symlink_metadata(&root)
            .await
            .map_err(|error| WalkError::root_metadata(root.clone(), error))?;
        if metadata.file_type().is_symlink() && self.options.follow_symlinks {
            metadata = fs::metadata(&root)
                .await
                .map_err(|error| WalkError::metadata(root.clone(), error))?;
        }

        let name = root.file_name().map(PathBuf::from).unwrap_or_default();
        if metadata.is_file() {
            return Ok(Node::Leaf(Entry {
                full_path: root,
                relative_path: name,
                depth: 0,
                len: metadata.len(),
            }));
        }
        if !metadata.is_dir() {
            return Err(WalkError::unsupported_root(root));
        }

        let canonical = fs::canonicalize(&root)
            .await
            .map_err(|error| WalkError::canonicalize(root.clone(), error))?;
        let listing = Arc::new(Listing {
            interner: Arc::clone(interner),
            follow_symlinks: self.options.follow_symlinks,
        });
        Ok(Node::Nested(Recursable::new(Directory::root(listing, root, canonical, name))))
    }
}

/// Gathers several roots into one nested sequence, in argument order.
///
/// Roots that do not exist are reported and skipped; any other failure
/// aborts.
pub async fn collection<I, P>(
    paths: I,
    options: WalkOptions,
    interner: &Arc<Interner<PathBuf>>,
) -> Result<Recursable<Entry>, WalkError>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut roots = Vec::new();
    for path in paths {
        let path = path.as_ref();
        match WalkBuilder::with_options(path, options).build(interner).await {
            Ok(root) => roots.push(root),
            Err(error) if error.is_not_found() => {
                warn!(target: "walk::fs", path = %path.display(), "skipping missing path");
            }
            Err(error) => return Err(error),
        }
    }
    Ok(Recursable::new(Array::new(roots)))
}

fn absolutize(path: PathBuf) -> Result<PathBuf, WalkError> {
    if path.is_absolute() {
        Ok(path)
    } else {
        let cwd = env::current_dir()
            .map_err(|error| WalkError::canonicalize(PathBuf::from("."), error))?;
        Ok(cwd.join(path))
    }
}
