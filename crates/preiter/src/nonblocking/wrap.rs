use async_trait::async_trait;

use super::{BoxCursor, Cursor, Sequence};
use crate::blocking;
use crate::direction::{Direction, Term};
use crate::error::Error;
use crate::identity::Identity;
use crate::sizeable::Sizeable;
use crate::step::Step;

/// Presents a blocking sequence through the asynchronous interface.
///
/// Steps complete without suspending. Only suitable for sequences whose
/// sources never block for long, such as in-memory data.
#[derive(Debug, Clone)]
pub struct Wrapped<S>(S);

impl<S> Wrapped<S> {
    /// Wraps `sequence`.
    pub const fn new(sequence: S) -> Self {
        Self(sequence)
    }

    /// Returns the wrapped sequence.
    pub fn into_inner(self) -> S {
        self.0
    }
}

impl<S> Sequence for Wrapped<S>
where
    S: blocking::Sequence,
    S::Item: Send + 'static,
{
    type Item = S::Item;

    fn identity(&self) -> Identity {
        blocking::Sequence::identity(&self.0)
    }

    fn cursor(&self) -> BoxCursor<S::Item> {
        Box::new(WrappedCursor(blocking::Sequence::cursor(&self.0)))
    }
}

struct WrappedCursor<T>(blocking::BoxCursor<T>);

impl<T> Sizeable for WrappedCursor<T> {
    fn size(&self) -> usize {
        self.0.size()
    }
}

#[async_trait]
impl<T: Send> Cursor for WrappedCursor<T> {
    type Item = T;

    async fn jump(&mut self, term: Term) -> Result<(), Error> {
        blocking::Cursor::jump(&mut *self.0, term)
    }

    async fn get(&mut self, direction: Direction) -> Result<Step<T>, Error> {
        blocking::Cursor::get(&mut *self.0, direction)
    }
}
