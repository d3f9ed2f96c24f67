use std::sync::Arc;

use super::{BoxCursor, Cursor, Sequence};
use crate::direction::{Direction, Term};
use crate::error::Error;
use crate::identity::Identity;
use crate::sizeable::Sizeable;
use crate::step::Step;

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Sequence yielding only the elements of `base` a predicate accepts.
///
/// Size is passed through from the base cursor, so it counts rejected
/// elements too.
pub struct Filtered<S: Sequence> {
    identity: Identity,
    base: S,
    predicate: Predicate<S::Item>,
}

impl<S: Sequence> Filtered<S> {
    /// Filters `base` under a fresh identity.
    pub fn new<F>(base: S, predicate: F) -> Self
    where
        F: Fn(&S::Item) -> bool + Send + Sync + 'static,
    {
        Self {
            identity: Identity::fresh(),
            base,
            predicate: Arc::new(predicate),
        }
    }

    /// Replaces the identity, for example to share it with another wrapper
    /// around the same base.
    #[must_use]
    pub const fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }
}

impl<S> Sequence for Filtered<S>
where
    S: Sequence,
    S::Item: 'static,
{
    type Item = S::Item;

    fn identity(&self) -> Identity {
        self.identity
    }

    fn cursor(&self) -> BoxCursor<S::Item> {
        Box::new(FilteredCursor {
            base: self.base.cursor(),
            predicate: Arc::clone(&self.predicate),
        })
    }
}

struct FilteredCursor<T> {
    base: BoxCursor<T>,
    predicate: Predicate<T>,
}

impl<T> Sizeable for FilteredCursor<T> {
    fn size(&self) -> usize {
        self.base.size()
    }
}

impl<T> Cursor for FilteredCursor<T> {
    type Item = T;

    fn jump(&mut self, term: Term) -> Result<(), Error> {
        self.base.jump(term)
    }

    fn get(&mut self, direction: Direction) -> Result<Step<T>, Error> {
        loop {
            match self.base.get(direction)? {
                Step::Value(value) if !(self.predicate)(&value) => {}
                step => return Ok(step),
            }
        }
    }
}
