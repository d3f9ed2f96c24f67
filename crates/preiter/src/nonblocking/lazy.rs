//! Buffer filled one element at a time from an asynchronous source.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use async_trait::async_trait;
use futures::Stream;
use logging::trace_lazy;

use super::source::{BoxSource, IterSource, Source, StreamSource};
use super::{BoxCursor, Cursor, Sequence};
use crate::array::ArrayCursor;
use crate::direction::{Direction, Term};
use crate::error::{BoxError, Error};
use crate::identity::Identity;
use crate::position::Position;
use crate::sizeable::Sizeable;
use crate::step::Step;

/// Sequence that pulls from its source only as far as any cursor has read.
///
/// Clones and cursors share one buffer. Pulls are serialized by an
/// asynchronous lock, so cursors driven from different tasks never pull
/// the same element twice. Once the source ends the buffer is frozen and
/// later cursors are plain array cursors.
pub struct Lazy<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("identity", &self.shared.identity)
            .field("buffered", &self.shared.len())
            .field("complete", &self.shared.frozen.get().is_some())
            .finish()
    }
}

struct Shared<T> {
    identity: Identity,
    items: Mutex<Vec<T>>,
    /// `None` once the source has reported its end.
    source: tokio::sync::Mutex<Option<BoxSource<T>>>,
    frozen: OnceLock<Arc<[T]>>,
}

fn lock<T>(items: &Mutex<Vec<T>>) -> MutexGuard<'_, Vec<T>> {
    items.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> Shared<T> {
    fn len(&self) -> usize {
        lock(&self.items).len()
    }
}

impl<T: Clone + Send + Sync> Shared<T> {
    fn item(&self, index: usize) -> Option<T> {
        lock(&self.items).get(index).cloned()
    }

    /// Pulls until element `index` is buffered; `Ok(None)` if the source
    /// ends first. The buffer is re-checked after the source lock is taken
    /// because another cursor may have pulled while this one waited.
    async fn fetch(&self, index: usize) -> Result<Option<T>, Error> {
        if let Some(item) = self.item(index) {
            return Ok(Some(item));
        }
        let mut source = self.source.lock().await;
        loop {
            if let Some(item) = self.item(index) {
                return Ok(Some(item));
            }
            let Some(pending) = source.as_mut() else {
                return Ok(None);
            };
            match pending.pull().await {
                Ok(Some(item)) => {
                    lock(&self.items).push(item);
                }
                Err(error) => return Err(Error::pull(self.identity, error)),
                Ok(None) => {
                    *source = None;
                    let frozen: Arc<[T]> = Arc::from(lock(&self.items).as_slice());
                    trace_lazy!(sequence = %self.identity, buffered = frozen.len(), "source exhausted");
                    let _ = self.frozen.set(frozen);
                    return Ok(None);
                }
            }
        }
    }

    async fn drain(&self) -> Result<(), Error> {
        while self.frozen.get().is_none() {
            let len = self.len();
            self.fetch(len).await?;
        }
        Ok(())
    }
}

impl<T> Lazy<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Buffers `source` under a fresh identity.
    pub fn new(source: impl Source<T> + 'static) -> Self {
        Self::identified(Identity::fresh(), source)
    }

    /// Buffers `source` under a caller-chosen identity.
    pub fn identified(identity: Identity, source: impl Source<T> + 'static) -> Self {
        Self {
            shared: Arc::new(Shared {
                identity,
                items: Mutex::new(Vec::new()),
                source: tokio::sync::Mutex::new(Some(Box::new(source))),
                frozen: OnceLock::new(),
            }),
        }
    }

    /// Buffers a stream of results.
    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<T, E>> + Unpin + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self::new(StreamSource(stream))
    }

    /// Buffers a blocking iterator of results.
    pub fn from_results<I, E>(source: I) -> Self
    where
        I: IntoIterator<Item = Result<T, E>>,
        I::IntoIter: Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self::new(IterSource(source.into_iter()))
    }

    /// Buffers an infallible iterator.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_results(values.into_iter().map(Ok::<T, BoxError>))
    }

    /// Returns `true` once the source has ended.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.shared.frozen.get().is_some()
    }

    /// Number of elements pulled so far.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.shared.len()
    }

    /// Drains the source into the buffer.
    pub async fn preload(&self) -> Result<(), Error> {
        self.shared.drain().await
    }
}

impl<T> Sequence for Lazy<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;

    fn identity(&self) -> Identity {
        self.shared.identity
    }

    fn cursor(&self) -> BoxCursor<T> {
        match self.shared.frozen.get() {
            Some(items) => Box::new(ArrayCursor::new(Arc::clone(items))),
            None => Box::new(LazyCursor {
                shared: Arc::clone(&self.shared),
                position: Position::start(),
            }),
        }
    }
}

struct LazyCursor<T> {
    shared: Arc<Shared<T>>,
    position: Position,
}

impl<T> Sizeable for LazyCursor<T> {
    fn size(&self) -> usize {
        self.shared.len()
    }
}

#[async_trait]
impl<T> Cursor for LazyCursor<T>
where
    T: Clone + Send + Sync,
{
    type Item = T;

    async fn jump(&mut self, term: Term) -> Result<(), Error> {
        if term == Term::EndOfData {
            self.shared.drain().await?;
        }
        self.position.jump(term, self.shared.len());
        Ok(())
    }

    async fn get(&mut self, direction: Direction) -> Result<Step<T>, Error> {
        if direction == Direction::Backward {
            let items = lock(&self.shared.items);
            return Ok(match self.position.step(direction, items.len()) {
                Some(index) => Step::Value(items[index].clone()),
                None => Step::done(direction),
            });
        }
        let wanted = self.position.ahead();
        if let Some(item) = self.shared.fetch(wanted).await? {
            self.position.settle(wanted);
            return Ok(Step::Value(item));
        }
        self.position.jump(Term::EndOfData, self.shared.len());
        Ok(Step::done(direction))
    }
}
