//! Synchronous cursors.
//!
//! Every cursor here advances on the calling thread. Sources are plain
//! [`Iterator`]s yielding `Result`s, and nested sequences are expanded the
//! moment a stack steps onto them.

use std::sync::Arc;

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
mod transform;


pub use array::Array;
pub use filter::Filtered;
pub use hetero::{HeteroCursor, HeteroStack, Mixed, Recursable};
pub use homo::{Homo, HomoCursor, HomoMixed, HomoRecursor, HomoStack};
pub use lazy::{BoxSource, Lazy};
pub use transform::Transformed;

/// A bidirectional position over a sequence.
pub trait Cursor: Sizeable + Send {
    /// Element type.
    type Item;

    /// Moves to a terminal. Jumping to [`Term::EndOfData`] drains lazy
    /// sources so the position is known to be past the last element.
    fn jump(&mut self, term: Term) -> Result<(), Error>;

    /// Steps once in `direction`.
    fn get(&mut self, direction: Direction) -> Result<Step<Self::Item>, Error>;

    /// Steps forward.
    fn next(&mut self) -> Result<Step<Self::Item>, Error> {
        self.get(Direction::Forward)
    }

    /// Steps backward.
    fn previous(&mut self) -> Result<Step<Self::Item>, Error> {
        self.get(Direction::Backward)
    }
}

/// Owned, type-erased cursor.
pub type BoxCursor<T> = Box<dyn Cursor<Item = T>>;

/// Something that can hand out independent cursors.
pub trait Sequence: Send + Sync {
    /// Element type.
    type Item;

    /// Identity used to cache this sequence's recursors.
    fn identity(&self) -> Identity;

    /// A new cursor parked at [`Term::StartOfData`].
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

/// Adapters available on every sequence.
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

    /// Maps every element.
    fn transformed<U, F>(self, mapping: F) -> Transformed<Self, U>
    where
        F: Fn(Self::Item) -> U + Send + Sync + 'static,
    {
        Transformed::new(self, mapping)
    }

    /// Maps every element with a function that may fail.
    fn try_transformed<U, E, F>(self, mapping: F) -> Transformed<Self, U>
    where
        F: Fn(Self::Item) -> Result<U, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Transformed::fallible(self, mapping)
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
