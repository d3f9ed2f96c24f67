//! crates/preiter/src/registry.rs
//! Token-addressed sequences shared with other components.
//!
//! A [`Registry`] owns sequences under [`Token`]s and serves
//! [`Request`]s against them. Cursors are created on first use per
//! `(viewer, cursor)` pair, so independent viewers never disturb each
//! other's position. [`RemoteSequence`] is the other side: a sequence whose
//! cursors forward every step through a [`Transport`] and close their far
//! end when dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use logging::trace_registry;
use rustc_hash::FxHashMap;
use tokio::sync::broadcast;

use crate::direction::{Direction, Term};
use crate::error::Error;
use crate::identity::{Identity, Token, TokenFactory};
use crate::nonblocking::{BoxCursor, Cursor, Sequence, SharedSequence};
use crate::sizeable::Sizeable;
use crate::step::Step;

/// Operation carried by a [`Request`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "op", rename_all = "lowercase"))]
pub enum Op {
    /// Step once.
    Get {
        /// Direction of the step.
        direction: Direction,
    },
    /// Move to a terminal.
    Jump {
        /// Target terminal.
        term: Term,
    },
    /// Drop the cursor.
    Close,
}

/// A cursor operation addressed by tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Request {
    /// Registered sequence.
    pub sequence: Token,
    /// Viewer owning the cursor.
    pub viewer: Token,
    /// Cursor within that viewer.
    pub cursor: Token,
    /// What to do.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub op: Op,
}

/// Answer to a [`Request`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Response<T> {
    /// Result of [`Op::Get`].
    Step(Step<T>),
    /// Acknowledges [`Op::Jump`].
    Jumped,
    /// Acknowledges [`Op::Close`].
    Closed,
}

impl<T> Response<T> {
    const fn describe(&self) -> &'static str {
        match self {
            Self::Step(_) => "a step",
            Self::Jumped => "a jump acknowledgement",
            Self::Closed => "a close acknowledgement",
        }
    }
}

/// Change notification published by a [`Registry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Change {
    /// A sequence was registered or replaced.
    Set(Token),
    /// A sequence was removed.
    Delete(Token),
    /// Every sequence was removed.
    Clear,
}

/// Delivers requests to wherever the sequences live.
#[async_trait]
pub trait Transport<T>: Send + Sync {
    /// Performs `request` and returns its answer.
    async fn request(&self, request: Request) -> Result<Response<T>, Error>;

    /// Sends an [`Op::Close`] request without waiting for the answer.
    /// Called while a cursor is dropped, so it must not block.
    fn close(&self, request: Request);
}

type SharedCursor<T> = Arc<tokio::sync::Mutex<BoxCursor<T>>>;

struct Entry<T> {
    sequence: SharedSequence<T>,
    cursors: FxHashMap<(Token, Token), SharedCursor<T>>,
}

const CHANGE_CAPACITY: usize = 64;

/// Sequences registered under tokens, with lazily created per-viewer
/// cursors.
pub struct Registry<T> {
    entries: Mutex<FxHashMap<Token, Entry<T>>>,
    changes: broadcast::Sender<Change>,
}

impl<T: Send + 'static> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Registry<T> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            entries: Mutex::new(FxHashMap::default()),
            changes,
        }
    }

    fn entries(&self) -> MutexGuard<'_, FxHashMap<Token, Entry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, change: Change) {
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }

    /// Receives every later change.
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.changes.subscribe()
    }

    /// Registers `sequence` under `token`, dropping any cursors over a
    /// previous sequence with that token.
    pub fn set(&self, token: Token, sequence: SharedSequence<T>) {
        self.entries().insert(
            token,
            Entry {
                sequence,
                cursors: FxHashMap::default(),
            },
        );
        trace_registry!(sequence = %token, "registered");
        self.publish(Change::Set(token));
    }

    /// Removes the sequence under `token`. Returns whether it existed.
    pub fn delete(&self, token: Token) -> bool {
        let removed = self.entries().remove(&token).is_some();
        if removed {
            trace_registry!(sequence = %token, "deleted");
            self.publish(Change::Delete(token));
        }
        removed
    }

    /// Removes every sequence.
    pub fn clear(&self) {
        self.entries().clear();
        trace_registry!("cleared");
        self.publish(Change::Clear);
    }

    /// Registered tokens in ascending order.
    pub fn list(&self) -> Vec<Token> {
        let mut tokens: Vec<Token> = self.entries().keys().copied().collect();
        tokens.sort_unstable();
        tokens
    }

    /// Identity of the sequence under `token`.
    pub fn identity(&self, token: Token) -> Option<Identity> {
        self.entries().get(&token).map(|entry| entry.sequence.identity())
    }

    /// Drops the cursor `(viewer, cursor)` over the sequence under
    /// `sequence`. Returns whether it existed.
    pub fn close_cursor(&self, sequence: Token, viewer: Token, cursor: Token) -> bool {
        let closed = self
            .entries()
            .get_mut(&sequence)
            .is_some_and(|entry| entry.cursors.remove(&(viewer, cursor)).is_some());
        if closed {
            trace_registry!(sequence = %sequence, viewer = %viewer, cursor = %cursor, "cursor closed");
        }
        closed
    }

    /// Number of cursors currently open over the sequence under `token`.
    pub fn open_cursors(&self, token: Token) -> usize {
        self.entries().get(&token).map_or(0, |entry| entry.cursors.len())
    }

    /// Drops every cursor belonging to `viewer`.
    pub fn forget_viewer(&self, viewer: Token) {
        for entry in self.entries().values_mut() {
            entry.cursors.retain(|(owner, _), _| *owner != viewer);
        }
        trace_registry!(viewer = %viewer, "viewer forgotten");
    }

    fn cursor(&self, request: &Request) -> Result<SharedCursor<T>, Error> {
        let mut entries = self.entries();
        let entry = entries
            .get_mut(&request.sequence)
            .ok_or(Error::UnknownSequence(request.sequence))?;
        let sequence = Arc::clone(&entry.sequence);
        let cursor = entry
            .cursors
            .entry((request.viewer, request.cursor))
            .or_insert_with(|| {
                trace_registry!(
                    sequence = %request.sequence,
                    viewer = %request.viewer,
                    cursor = %request.cursor,
                    "cursor created"
                );
                Arc::new(tokio::sync::Mutex::new(sequence.cursor()))
            });
        Ok(Arc::clone(cursor))
    }

    /// Serves one request. Requests against one cursor run one at a time;
    /// requests against different cursors may interleave.
    pub async fn handle(&self, request: Request) -> Result<Response<T>, Error> {
        if request.op == Op::Close {
            self.close_cursor(request.sequence, request.viewer, request.cursor);
            return Ok(Response::Closed);
        }
        let cursor = self.cursor(&request)?;
        let mut cursor = cursor.lock().await;
        match request.op {
            Op::Get { direction } => Ok(Response::Step(cursor.get(direction).await?)),
            Op::Jump { term } => {
                cursor.jump(term).await?;
                Ok(Response::Jumped)
            }
            Op::Close => Ok(Response::Closed),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Transport<T> for Registry<T> {
    async fn request(&self, request: Request) -> Result<Response<T>, Error> {
        self.handle(request).await
    }

    fn close(&self, request: Request) {
        self.close_cursor(request.sequence, request.viewer, request.cursor);
    }
}

/// A viewer token together with the cursor tokens issued under it.
///
/// Every [`RemoteSequence`] built from clones of one `Viewer` draws cursor
/// tokens from the same counter, so their cursors never share a registry
/// slot. Create one `Viewer` per viewer token.
#[derive(Clone, Debug)]
pub struct Viewer {
    token: Token,
    cursors: Arc<TokenFactory>,
}

impl Viewer {
    /// Starts issuing cursor tokens for `token`.
    #[must_use]
    pub fn new(token: Token) -> Self {
        Self {
            token,
            cursors: Arc::new(TokenFactory::new()),
        }
    }

    /// The viewer token.
    #[must_use]
    pub const fn token(&self) -> Token {
        self.token
    }

    fn issue(&self) -> Token {
        self.cursors.issue()
    }
}

/// Sequence living behind a [`Transport`].
///
/// Every [`cursor`](Sequence::cursor) call mints a new cursor token from the
/// [`Viewer`], so two local cursors map to two independent remote cursors.
/// Dropping a local cursor closes its remote one. Remote cursors do not know
/// how much the far side has buffered and report size 0.
pub struct RemoteSequence<T> {
    identity: Identity,
    sequence: Token,
    viewer: Viewer,
    transport: Arc<dyn Transport<T>>,
}

impl<T> RemoteSequence<T> {
    /// Addresses `sequence` on `transport` on behalf of `viewer`.
    pub fn new(transport: Arc<dyn Transport<T>>, sequence: Token, viewer: &Viewer) -> Self {
        Self {
            identity: Identity::fresh(),
            sequence,
            viewer: viewer.clone(),
            transport,
        }
    }

    /// Token of the remote sequence.
    #[must_use]
    pub const fn token(&self) -> Token {
        self.sequence
    }
}

impl<T: Send + 'static> Sequence for RemoteSequence<T> {
    type Item = T;

    fn identity(&self) -> Identity {
        self.identity
    }

    fn cursor(&self) -> BoxCursor<T> {
        Box::new(RemoteCursor {
            transport: Arc::clone(&self.transport),
            sequence: self.sequence,
            viewer: self.viewer.token(),
            cursor: self.viewer.issue(),
        })
    }
}

struct RemoteCursor<T> {
    transport: Arc<dyn Transport<T>>,
    sequence: Token,
    viewer: Token,
    cursor: Token,
}

impl<T> RemoteCursor<T> {
    const fn request(&self, op: Op) -> Request {
        Request {
            sequence: self.sequence,
            viewer: self.viewer,
            cursor: self.cursor,
            op,
        }
    }
}

impl<T> Drop for RemoteCursor<T> {
    fn drop(&mut self) {
        self.transport.close(self.request(Op::Close));
    }
}

impl<T> Sizeable for RemoteCursor<T> {
    fn size(&self) -> usize {
        0
    }
}

#[async_trait]
impl<T: Send + 'static> Cursor for RemoteCursor<T> {
    type Item = T;

    async fn jump(&mut self, term: Term) -> Result<(), Error> {
        match self.transport.request(self.request(Op::Jump { term })).await? {
            Response::Jumped => Ok(()),
            other => Err(Error::transport(format!(
                "expected a jump acknowledgement, got {}",
                other.describe()
            ))),
        }
    }

    async fn get(&mut self, direction: Direction) -> Result<Step<T>, Error> {
        match self.transport.request(self.request(Op::Get { direction })).await? {
            Response::Step(step) => Ok(step),
            other => Err(Error::transport(format!("expected a step, got {}", other.describe()))),
        }
    }
}
