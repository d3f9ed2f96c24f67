//! Asynchronous cursors.
//!
//! Mirrors [`crate::blocking`] with every step awaitable. A cursor suspends
//! only where a lazy source is pulled, so stepping through buffered elements
//! completes without yielding to the runtime.

use std::sync::Arc;

use async_trait::async_trait;

use crate::direction::{Direction, Term};
use crate::error::{BoxError, Error};
use crate::identity::Identity;
use crate::sizeable::Sizeable;
use crate::step::Step;

mod array;
mod filter;
mod hetero;
mod homo;
mod lazy;
mod source;
mod transform;
mod wrap;

#[cfg(test)]
mod tests;

pub use array::Array;
pub use filter::Filtered;
pub use hetero::{HeteroCursor, HeteroStack, Mixed, Recursable};
pub use homo::{Homo, HomoCursor, HomoMixed, HomoRecursor, HomoStack};
pub use lazy::Lazy;
pub use source::{BoxSource, IterSource, Source, StreamSource};
pub use transform::Transformed;
pub use wrap::Wrapped;

/// A bidirectional position over a sequence, stepped asynchronously.
#[async_trait]
pub trait Cursor: Sizeable + Send {
    /// Element type.
    type Item: Send;

    /// Moves to a terminal. Jumping to [`Term::EndOfData`] drains lazy
    /// sources.
    async fn jump(&mut self, term: Term) -> Result<(), Error>;

    /// Steps once in `direction`.
    async fn get(&mut self, direction: Direction) -> Result<Step<Self::Item>, Error>;

    /// Steps forward.
    async fn next(&mut self) -> Result<Step<Self::Item>, Error> {
        self.get(Direction::Forward).await
    }

    /// Steps backward.
    async fn previous(&mut self) -> Result<Step<Self::Item>, Error> {
        self.get(Direction::Backward).await
    }
}

/// Owned, type-erased cursor.
pub type BoxCursor<T> = Box<dyn Cursor<Item = T>>;

/// Something that can hand out independent asynchronous cursors.
pub trait Sequence: Send + Sync {
    /// Element type.
    type Item: Send;

    /// Identity used to cache this sequence's recursors.
    fn identity(&self) -> Identity;

    /// A new cursor parked at [`Term::StartOfData`]. Creating a cursor never
    /// suspends; any I/O happens on the first step.
    fn cursor(&self) -> BoxCursor<Self::Item>;
}

/// Shared, type-erased sequence.
pub type SharedSequence<T> = Arc<dyn Sequence<Item = T>>;

impl<S: Sequence + ?Sized> Sequence for Arc<S> {
    type Item = S::Item;

    fn identity(&self) -> Identity {
        (**self).identity()
    }

    fn cursor(&self) -> BoxCursor<Self::Item> {
        (**self).cursor()
    }
}

/// Adapters available on every asynchronous sequence.
pub trait SequenceExt: Sequence + Sized + 'static
where
    Self::Item: 'static,
{
    /// Keeps the elements `predicate` accepts.
    fn filtered<F>(self, predicate: F) -> Filtered<Self>
    where
        F: Fn(&Self::Item) -> bool + Send + Sync + 'static,
    {
        Filtered::new(self, predicate)
    }

    /// Maps every element synchronously.
    fn transformed<U, F>(self, mapping: F) -> Transformed<Self, U>
    where
        U: Send + 'static,
        F: Fn(Self::Item) -> U + Send + Sync + 'static,
    {
        Transformed::new(self, mapping)
    }

    /// Maps every element through a future that may fail.
    fn then<U, E, F, Fut>(self, mapping: F) -> Transformed<Self, U>
    where
        U: Send + 'static,
        E: Into<BoxError>,
        F: Fn(Self::Item) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U, E>> + Send + 'static,
    {
        Transformed::then(self, mapping)
    }

    /// Erases the concrete type.
    fn shared(self) -> SharedSequence<Self::Item> {
        Arc::new(self)
    }
}

impl<S> SequenceExt for S
where
    S: Sequence + 'static,
    S::Item: 'static,
{
}
