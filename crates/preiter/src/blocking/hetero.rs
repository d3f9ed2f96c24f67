//! Flattening over streams that mix leaves with nested sequences.

use std::fmt;
use std::sync::Arc;

use logging::trace_stack;
use tracing::warn;

use super::{BoxCursor, Cursor, Lazy, Sequence, SharedSequence};
use crate::direction::{Direction, Term};
use crate::error::{BoxError, Error};
use crate::identity::Identity;
use crate::loader::{self, BoxLoader, Expand, LoaderFactory};
use crate::node::Node;
use crate::sizeable::Sizeable;
use crate::step::Step;

/// Element of a heterogeneous stream.
pub type Mixed<T> = Node<T, Recursable<T>>;

/// A nested sequence whose elements may themselves be nested.
pub struct Recursable<T>(SharedSequence<Mixed<T>>);

impl<T> Clone for Recursable<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Recursable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Recursable").field(&self.0.identity()).finish()
    }
}

impl<T: 'static> Recursable<T> {
    /// Wraps a sequence of mixed elements.
    pub fn new<S>(sequence: S) -> Self
    where
        S: Sequence<Item = Mixed<T>> + 'static,
    {
        Self(Arc::new(sequence))
    }

    /// Wraps an already shared sequence.
    #[must_use]
    pub const fn from_shared(sequence: SharedSequence<Mixed<T>>) -> Self {
        Self(sequence)
    }
}

impl<T: 'static> Sequence for Recursable<T> {
    type Item = Mixed<T>;

    fn identity(&self) -> Identity {
        self.0.identity()
    }

    fn cursor(&self) -> BoxCursor<Mixed<T>> {
        self.0.cursor()
    }
}

impl<T: 'static> Expand for Recursable<T> {
    type Recursor = BoxCursor<Mixed<T>>;

    fn key(&self) -> Identity {
        self.0.identity()
    }

    fn recursor(&self) -> BoxCursor<Mixed<T>> {
        self.0.cursor()
    }
}

/// Depth-first flattening of a [`Recursable`].
///
/// Leaves come out in document order going forward and in exact reverse
/// going backward. Nested sequences are entered from the start terminal of
/// the travel direction and never yielded themselves.
pub struct HeteroStack<T> {
    identity: Identity,
    root: Recursable<T>,
    loader: LoaderFactory<Recursable<T>>,
}

impl<T: 'static> HeteroStack<T> {
    /// Flattens `root`, building a fresh recursor on every entry.
    #[must_use]
    pub fn flatten(root: Recursable<T>) -> Self {
        Self::flatten_with(root, loader::direct())
    }

    /// Flattens `root`, caching released recursors up to `size_limit`
    /// buffered elements per cursor.
    #[must_use]
    pub fn flatten_cached(root: Recursable<T>, size_limit: usize) -> Self {
        Self::flatten_with(root, loader::cached(size_limit))
    }

    /// Flattens `root` with a caller-supplied loader strategy.
    #[must_use]
    pub fn flatten_with(root: Recursable<T>, loader: LoaderFactory<Recursable<T>>) -> Self {
        Self {
            identity: Identity::fresh(),
            root,
            loader,
        }
    }

    /// The sequence being flattened.
    #[must_use]
    pub const fn root(&self) -> &Recursable<T> {
        &self.root
    }
}

impl<T> HeteroStack<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Buffers a raw mixed stream lazily so it can be flattened.
    pub fn collate<I, E>(source: I) -> Recursable<T>
    where
        I: IntoIterator<Item = Result<Mixed<T>, E>>,
        I::IntoIter: Send + 'static,
        E: Into<BoxError>,
    {
        Recursable::new(Lazy::new(source))
    }
}

impl<T: 'static> Sequence for HeteroStack<T> {
    type Item = T;

    fn identity(&self) -> Identity {
        self.identity
    }

    fn cursor(&self) -> BoxCursor<T> {
        Box::new(HeteroCursor {
            root: self.root.cursor(),
            levels: Vec::new(),
            loader: (self.loader)(),
        })
    }
}

type Level<T> = (Identity, BoxCursor<Mixed<T>>);

/// Cursor produced by [`HeteroStack`].
///
/// The root cursor is never popped. Every deeper level was obtained from the
/// loader and goes back to it when the stack leaves that level.
pub struct HeteroCursor<T> {
    root: BoxCursor<Mixed<T>>,
    levels: Vec<Level<T>>,
    loader: BoxLoader<Recursable<T>>,
}

impl<T: 'static> HeteroCursor<T> {
    /// Number of nested levels currently entered.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    fn top(&mut self) -> &mut BoxCursor<Mixed<T>> {
        match self.levels.last_mut() {
            Some((_, cursor)) => cursor,
            None => &mut self.root,
        }
    }

    fn pop(&mut self) -> Option<Level<T>> {
        let level = self.levels.pop()?;
        trace_stack!(sequence = %level.0, depth = self.levels.len(), "left nested sequence");
        Some(level)
    }

    fn release(&mut self, left: Vec<Level<T>>) {
        for (identity, cursor) in left {
            self.loader.release(identity, cursor);
        }
    }

    /// Puts back levels left during a step that failed, outermost first,
    /// stepping each back over the end it ran into.
    fn restore(&mut self, left: Vec<Level<T>>, direction: Direction) {
        for (identity, mut cursor) in left.into_iter().rev() {
            if let Err(error) = cursor.get(direction.reverse()) {
                warn!(target: "preiter::stack", sequence = %identity, error = %error, "failed to step back into a level");
            }
            self.levels.push((identity, cursor));
        }
    }

    fn enter(&mut self, nested: &Recursable<T>, direction: Direction) -> Result<(), Error> {
        let identity = nested.key();
        let mut recursor = self.loader.load(nested)?;
        if let Err(error) = recursor.jump(direction.start()) {
            self.loader.release(identity, recursor);
            return Err(error);
        }
        self.levels.push((identity, recursor));
        trace_stack!(sequence = %identity, depth = self.levels.len(), "entered nested sequence");
        Ok(())
    }
}

impl<T: 'static> Sizeable for HeteroCursor<T> {
    fn size(&self) -> usize {
        self.root.size() + self.levels.iter().map(|(_, cursor)| cursor.size()).sum::<usize>()
    }
}

impl<T: 'static> Cursor for HeteroCursor<T> {
    type Item = T;

    fn jump(&mut self, term: Term) -> Result<(), Error> {
        let left: Vec<_> = std::iter::from_fn(|| self.pop()).collect();
        self.release(left);
        self.root.jump(term)
    }

    fn get(&mut self, direction: Direction) -> Result<Step<T>, Error> {
        // Levels left on the way stay with the cursor until the step commits.
        let mut left = Vec::new();
        loop {
            let step = match self.top().get(direction) {
                Ok(step) => step,
                Err(error) => {
                    self.restore(left, direction);
                    return Err(error);
                }
            };
            match step {
                Step::Value(Node::Leaf(value)) => {
                    self.release(left);
                    return Ok(Step::Value(value));
                }
                Step::Value(Node::Nested(nested)) => match self.enter(&nested, direction) {
                    Ok(()) => self.release(std::mem::take(&mut left)),
                    Err(error) => {
                        // Step the parent back so a retry reaches the same nested element.
                        match self.top().get(direction.reverse()) {
                            Ok(_) => self.restore(left, direction),
                            Err(undo) => {
                                warn!(target: "preiter::stack", error = %undo, "failed to step back after expansion error");
                                self.release(left);
                            }
                        }
                        return Err(error);
                    }
                },
                Step::Exhausted(term) => match self.pop() {
                    Some(level) => left.push(level),
                    None => {
                        self.release(left);
                        return Ok(Step::Exhausted(term));
                    }
                },
            }
        }
    }
}
