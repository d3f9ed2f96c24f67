//! Buffer filled one element at a time from an iterator.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use logging::trace_lazy;

use super::{BoxCursor, Cursor, Sequence};
use crate::array::ArrayCursor;
use crate::direction::{Direction, Term};
use crate::error::{BoxError, Error};
use crate::identity::Identity;
use crate::position::Position;
use crate::sizeable::Sizeable;
use crate::step::Step;

/// Type-erased element source for [`Lazy`].
pub type BoxSource<T> = Box<dyn Iterator<Item = Result<T, BoxError>> + Send>;

/// Sequence that pulls from its source only as far as any cursor has read.
///
/// Clones share the same buffer. Once the source ends the buffer is frozen,
/// and cursors created afterwards are plain array cursors.
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
    source: Mutex<Option<BoxSource<T>>>,
    frozen: OnceLock<Arc<[T]>>,
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> Shared<T> {
    fn len(&self) -> usize {
        lock(&self.items).len()
    }
}

impl<T: Clone> Shared<T> {
    fn item(&self, index: usize) -> Option<T> {
        lock(&self.items).get(index).cloned()
    }

    /// Pulls until element `index` is buffered. `Ok(None)` means the source
    /// ended first. Growth happens under the source lock, so concurrent
    /// cursors never pull the same element twice.
    fn fetch(&self, index: usize) -> Result<Option<T>, Error> {
        if let Some(item) = self.item(index) {
            return Ok(Some(item));
        }
        let mut source = lock(&self.source);
        loop {
            if let Some(item) = self.item(index) {
                return Ok(Some(item));
            }
            let Some(pending) = source.as_mut() else {
                return Ok(None);
            };
            match pending.next() {
                Some(Ok(item)) => lock(&self.items).push(item),
                Some(Err(error)) => return Err(Error::pull(self.identity, error)),
                None => {
                    *source = None;
                    let items = lock(&self.items);
                    trace_lazy!(sequence = %self.identity, buffered = items.len(), "source exhausted");
                    let _ = self.frozen.set(Arc::from(items.as_slice()));
                    return Ok(None);
                }
            }
        }
    }

    fn drain(&self) -> Result<(), Error> {
        while self.frozen.get().is_none() {
            let len = self.len();
            self.fetch(len)?;
        }
        Ok(())
    }
}

impl<T> Lazy<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Buffers `source` under a fresh identity.
    pub fn new<I, E>(source: I) -> Self
    where
        I: IntoIterator<Item = Result<T, E>>,
        I::IntoIter: Send + 'static,
        E: Into<BoxError>,
    {
        Self::identified(Identity::fresh(), source)
    }

    /// Buffers `source` under a caller-chosen identity.
    pub fn identified<I, E>(identity: Identity, source: I) -> Self
    where
        I: IntoIterator<Item = Result<T, E>>,
        I::IntoIter: Send + 'static,
        E: Into<BoxError>,
    {
        let source: BoxSource<T> = Box::new(
            source
                .into_iter()
                .map(|item| item.map_err(|error| -> BoxError { error.into() })),
        );
        Self {
            shared: Arc::new(Shared {
                identity,
                items: Mutex::new(Vec::new()),
                source: Mutex::new(Some(source)),
                frozen: OnceLock::new(),
            }),
        }
    }

    /// Buffers an infallible source.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::new(values.into_iter().map(Ok::<T, BoxError>))
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
    pub fn preload(&self) -> Result<(), Error> {
        self.shared.drain()
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

impl<T> Cursor for LazyCursor<T>
where
    T: Clone + Send + Sync,
{
    type Item = T;

    fn jump(&mut self, term: Term) -> Result<(), Error> {
        if term == Term::EndOfData {
            self.shared.drain()?;
        }
        self.position.jump(term, self.shared.len());
        Ok(())
    }

    fn get(&mut self, direction: Direction) -> Result<Step<T>, Error> {
        match direction {
            Direction::Backward => {
                let items = lock(&self.shared.items);
                Ok(match self.position.step(direction, items.len()) {
                    Some(index) => Step::Value(items[index].clone()),
                    None => Step::done(direction),
                })
            }
            Direction::Forward => {
                let wanted = self.position.ahead();
                if let Some(item) = self.shared.fetch(wanted)? {
                    self.position.settle(wanted);
                    return Ok(Step::Value(item));
                }
                self.position.jump(Term::EndOfData, self.shared.len());
                Ok(Step::done(direction))
            }
        }
    }
}
