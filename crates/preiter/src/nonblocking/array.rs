use std::sync::Arc;

use async_trait::async_trait;

use super::{BoxCursor, Cursor, Sequence};
use crate::array::ArrayCursor;
use crate::direction::{Direction, Term};
use crate::error::Error;
use crate::identity::Identity;
use crate::step::Step;

/// Sequence over a fixed list of elements.
#[derive(Clone, Debug)]
pub struct Array<T> {
    identity: Identity,
    items: Arc<[T]>,
}

impl<T> Array<T> {
    /// Wraps `items` under a fresh identity.
    pub fn new(items: impl Into<Arc<[T]>>) -> Self {
        Self::identified(Identity::fresh(), items)
    }

    /// Wraps `items` under a caller-chosen identity.
    pub fn identified(identity: Identity, items: impl Into<Arc<[T]>>) -> Self {
        Self {
            identity,
            items: items.into(),
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Sequence for Array<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;

    fn identity(&self) -> Identity {
        self.identity
    }

    fn cursor(&self) -> BoxCursor<T> {
        Box::new(ArrayCursor::new(Arc::clone(&self.items)))
    }
}

#[async_trait]
impl<T> Cursor for ArrayCursor<T>
where
    T: Clone + Send + Sync,
{
    type Item = T;

    async fn jump(&mut self, term: Term) -> Result<(), Error> {
        self.seek(term);
        Ok(())
    }

    async fn get(&mut self, direction: Direction) -> Result<Step<T>, Error> {
        Ok(self.step(direction))
    }
}
