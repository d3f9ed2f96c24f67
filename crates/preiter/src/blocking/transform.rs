use std::sync::Arc;

use tracing::warn;

use super::{BoxCursor, Cursor, Sequence};
use crate::direction::{Direction, Term};
use crate::error::{BoxError, Error};
use crate::identity::Identity;
use crate::sizeable::Sizeable;
use crate::step::Step;

type Mapping<T, U> = Arc<dyn Fn(T) -> Result<U, BoxError> + Send + Sync>;

/// Sequence applying a mapping to every element of `base`.
///
/// A failed mapping steps the base cursor back, so the same element is
/// mapped again on retry.
pub struct Transformed<S: Sequence, U> {
    identity: Identity,
    base: S,
    mapping: Mapping<S::Item, U>,
}

impl<S: Sequence, U> Transformed<S, U> {
    /// Maps with an infallible function.
    pub fn new<F>(base: S, mapping: F) -> Self
    where
        F: Fn(S::Item) -> U + Send + Sync + 'static,
    {
        Self::from_mapping(base, Arc::new(move |item| Ok::<U, BoxError>(mapping(item))))
    }

    /// Maps with a function that may fail.
    pub fn fallible<F, E>(base: S, mapping: F) -> Self
    where
        F: Fn(S::Item) -> Result<U, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self::from_mapping(
            base,
            Arc::new(move |item| mapping(item).map_err(|error| -> BoxError { error.into() })),
        )
    }

    fn from_mapping(base: S, mapping: Mapping<S::Item, U>) -> Self {
        Self {
            identity: Identity::fresh(),
            base,
            mapping,
        }
    }

    /// Replaces the identity.
    #[must_use]
    pub const fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }
}

impl<S, U> Sequence for Transformed<S, U>
where
    S: Sequence,
    S::Item: 'static,
    U: 'static,
{
    type Item = U;

    fn identity(&self) -> Identity {
        self.identity
    }

    fn cursor(&self) -> BoxCursor<U> {
        Box::new(TransformedCursor {
            base: self.base.cursor(),
            mapping: Arc::clone(&self.mapping),
        })
    }
}

struct TransformedCursor<T, U> {
    base: BoxCursor<T>,
    mapping: Mapping<T, U>,
}

impl<T, U> Sizeable for TransformedCursor<T, U> {
    fn size(&self) -> usize {
        self.base.size()
    }
}

impl<T, U> Cursor for TransformedCursor<T, U> {
    type Item = U;

    fn jump(&mut self, term: Term) -> Result<(), Error> {
        self.base.jump(term)
    }

    fn get(&mut self, direction: Direction) -> Result<Step<U>, Error> {
        let Step::Value(item) = self.base.get(direction)? else {
            return Ok(Step::done(direction));
        };
        match (self.mapping)(item) {
            Ok(mapped) => Ok(Step::Value(mapped)),
            Err(source) => {
                if let Err(undo) = self.base.get(direction.reverse()) {
                    warn!(target: "preiter::cursor", error = %undo, "failed to step back after mapping error");
                }
                Err(Error::map(source))
            }
        }
    }
}
