#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `preiter` provides lazy, bidirectional cursors over sequences whose
//! elements may themselves be sequences. A stack cursor flattens such a tree
//! depth-first, expanding nested sequences only when a step lands on them and
//! pulling from lazy sources only as far as the cursor has travelled.
//! Cursors can turn around at any point, jump to either end, and retry any
//! failed step without losing their place.
//!
//! # Design
//!
//! - [`Direction`], [`Term`] and [`Step`] are the traversal vocabulary. A
//!   cursor starts at [`Term::StartOfData`]; every step either returns a value
//!   or reports the terminal it reached.
//! - [`blocking`] and [`nonblocking`] expose the same family of sequences:
//!   arrays, lazily buffered sources, filters, transforms, and the two stack
//!   flavours. `Hetero` stacks mix leaves and nested sequences freely;
//!   `Homo` stacks hold either only leaves or only nested sequences per level.
//! - [`Node`] is the single predicate deciding whether an element is
//!   entered or yielded.
//! - [`Loader`] builds the cursor used to walk a nested sequence. The
//!   [`CachedLoader`] keeps released cursors in a [`SizeableCache`] bounded
//!   by the number of elements they buffer.
//! - [`registry`] addresses sequences by [`Token`] so another component can
//!   drive cursors through a [`registry::Transport`].
//!
//! # Invariants
//!
//! - Walking forward to [`Term::EndOfData`] and then backward yields exactly
//!   the reverse of the forward sequence.
//! - Stepping past a terminal is idempotent: the terminal is reported again
//!   and the position does not change.
//! - Lazy sources are pulled at most once per element, and only under one
//!   lock, so concurrent cursors over one buffer never duplicate or skip
//!   elements.
//! - Re-entering a nested sequence always starts at the edge matching the
//!   travel direction, whether or not its cursor came from the cache.
//!
//! # Errors
//!
//! Every fallible operation returns [`Error`]. A failed step leaves the
//! cursor where it was, with every open nested level still open, so the
//! caller may retry once the cause is fixed.
//!
//! # Features
//!
//! - `serde` (default): `Serialize`/`Deserialize` for the registry wire
//!   types ([`registry::Request`], [`registry::Response`], [`Token`] and the
//!   traversal vocabulary).
//!
//! # Examples
//!
//! ```
//! use preiter::blocking::{Array, Cursor, HeteroStack, Lazy, Recursable, Sequence};
//! use preiter::{Node, Step, Term};
//!
//! let inner = Recursable::new(Lazy::from_values(vec![Node::Leaf(2), Node::Leaf(3)]));
//! let root = Recursable::new(Array::new(vec![Node::Leaf(1), Node::Nested(inner), Node::Leaf(4)]));
//! let stack = HeteroStack::flatten(root);
//!
//! let mut cursor = stack.cursor();
//! let mut forward = Vec::new();
//! while let Step::Value(value) = cursor.next()? {
//!     forward.push(value);
//! }
//! assert_eq!(forward, [1, 2, 3, 4]);
//! assert_eq!(cursor.next()?, Step::Exhausted(Term::EndOfData));
//! assert_eq!(cursor.previous()?, Step::Value(4));
//! # Ok::<(), preiter::Error>(())
//! ```
//!
//! # See also
//!
//! - [`blocking::HeteroStack`] and [`nonblocking::HomoStack`] for the
//!   flattening entry points.
//! - [`SizeableCache`] for the eviction policy.

mod array;
pub mod blocking;
mod direction;
mod error;
mod identity;
pub mod loader;
mod node;
pub mod nonblocking;
mod position;
pub mod registry;
mod sizeable;
mod step;

pub use array::ArrayCursor;
pub use direction::{Direction, Term};
pub use error::{BoxError, Error};
pub use identity::{Identity, Interner, Token, TokenFactory};
pub use loader::{BoxLoader, CachedLoader, DirectLoader, Expand, Loader, LoaderFactory};
pub use node::Node;
pub use sizeable::{Sizeable, SizeableCache};
pub use step::Step;
