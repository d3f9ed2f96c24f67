#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `walk` lists filesystem trees for the riffle browser. It does not walk
//! anything by itself: it turns each root into a nested sequence that
//! `preiter` flattens on demand, so a directory is only read when a cursor
//! actually steps into it.
//!
//! # Design
//!
//! - [`WalkBuilder`] inspects a root path and returns a [`Root`]: a leaf for a
//!   regular file, or a nested [`Directory`] for a directory.
//! - [`Directory`] implements [`preiter::nonblocking::Sequence`]. Every cursor
//!   opened on it lists the directory afresh with `tokio::fs`, sorts the names
//!   lexicographically and pulls one child per step.
//! - [`collection`] gathers several roots, skipping the ones that do not
//!   exist.
//! - [`WalkError`] describes I/O failures. Inside a cursor they surface as
//!   [`preiter::Error::Pull`] with the [`WalkError`] as source.
//!
//! # Invariants
//!
//! - Children come out in byte-wise lexicographic order of their names,
//!   regardless of the order the operating system reports them in.
//! - A directory reached through the same path always carries the same
//!   [`preiter::Identity`], so recursor caches recognise it across listings.
//! - When following symlinks, a link that leads back into one of its own
//!   ancestors is skipped, so traversal always terminates.
//! - Traversal never panics; failures are reported via [`WalkError`].
//!
//! # Examples
//!
//! ```
//! use preiter::Interner;
//! use preiter::nonblocking::{Cursor, HeteroStack, Recursable, Sequence};
//! use preiter::{Node, Step};
//! use std::sync::Arc;
//! use walk::WalkBuilder;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let temp = tempfile::tempdir()?;
//! let root = temp.path().join("src");
//! std::fs::create_dir_all(root.join("nested"))?;
//! std::fs::write(root.join("file.txt"), b"data")?;
//! std::fs::write(root.join("nested/more.txt"), b"data")?;
//!
//! let interner = Arc::new(Interner::new());
//! let Node::Nested(tree) = WalkBuilder::new(&root).build(&interner).await? else {
//!     unreachable!("a directory root is nested");
//! };
//! let stack = HeteroStack::flatten(tree);
//! let mut cursor = stack.cursor();
//! let mut seen = Vec::new();
//! while let Step::Value(entry) = cursor.next().await? {
//!     seen.push(entry.relative_path().to_path_buf());
//! }
//! assert_eq!(seen, [
//!     std::path::Path::new("src/file.txt"),
//!     std::path::Path::new("src/nested/more.txt"),
//! ]);
//! # Ok(())
//! # }
//! ```

mod builder;
mod directory;
mod entry;
mod error;

pub use crate::builder::{Root, WalkBuilder, WalkOptions, collection};
pub use crate::directory::Directory;
pub use crate::entry::Entry;
pub use crate::error::{WalkError, WalkErrorKind};

#[cfg(test)]
mod tests;
