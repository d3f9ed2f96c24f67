use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::warn;

use super::{BoxCursor, Cursor, Sequence};
use crate::direction::{Direction, Term};
use crate::error::{BoxError, Error};
use crate::identity::Identity;
use crate::sizeable::Sizeable;
use crate::step::Step;

type Mapping<T, U> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<U, BoxError>> + Send + Sync>;

/// Sequence applying a possibly asynchronous mapping to every element.
///
/// A failed mapping steps the base cursor back, so the same element is
/// mapped again on retry.
pub struct Transformed<S: Sequence, U> {
    identity: Identity,
    base: S,
    mapping: Mapping<S::Item, U>,
}

impl<S: Sequence, U: Send + 'static> Transformed<S, U> {
    /// Maps with a synchronous, infallible function.
    pub fn new<F>(base: S, mapping: F) -> Self
    where
        F: Fn(S::Item) -> U + Send + Sync + 'static,
    {
        Self::from_mapping(
            base,
            Arc::new(move |item| -> BoxFuture<'static, Result<U, BoxError>> {
                futures::future::ready(Ok(mapping(item))).boxed()
            }),
        )
    }

    /// Maps through a future that may fail.
    pub fn then<F, Fut, E>(base: S, mapping: F) -> Self
    where
        F: Fn(S::Item) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self::from_mapping(
            base,
            Arc::new(move |item| -> BoxFuture<'static, Result<U, BoxError>> {
                mapping(item)
                    .map(|result| result.map_err(|error| -> BoxError { error.into() }))
                    .boxed()
            }),
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
    U: Send + 'static,
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

#[async_trait]
impl<T: Send, U: Send> Cursor for TransformedCursor<T, U> {
    type Item = U;

    async fn jump(&mut self, term: Term) -> Result<(), Error> {
        self.base.jump(term).await
    }

    async fn get(&mut self, direction: Direction) -> Result<Step<U>, Error> {
        let Step::Value(item) = self.base.get(direction).await? else {
            return Ok(Step::done(direction));
        };
        let mapped = (self.mapping)(item).await;
        match mapped {
            Ok(value) => Ok(Step::Value(value)),
            Err(source) => {
                if let Err(undo) = self.base.get(direction.reverse()).await {
                    warn!(target: "preiter::cursor", error = %undo, "failed to step back after mapping error");
                }
                Err(Error::map(source))
            }
        }
    }
}
