//! Flattening over trees whose every level is uniform: a sequence either
//! holds only leaves or only further levels.

use std::fmt;
use std::iter::Fuse;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

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

/// Element of a raw stream fed to [`HomoStack::collate`].
pub type HomoMixed<T> = Node<T, Homo<T>>;

/// One level of a homogeneous tree.
pub enum Homo<T> {
    /// A level made only of leaves.
    Leaves(SharedSequence<T>),
    /// A level made only of nested levels.
    Branches(SharedSequence<Homo<T>>),
}

impl<T> Clone for Homo<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Leaves(sequence) => Self::Leaves(Arc::clone(sequence)),
            Self::Branches(sequence) => Self::Branches(Arc::clone(sequence)),
        }
    }
}

impl<T> fmt::Debug for Homo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaves(sequence) => f.debug_tuple("Leaves").field(&sequence.identity()).finish(),
            Self::Branches(sequence) => f.debug_tuple("Branches").field(&sequence.identity()).finish(),
        }
    }
}

impl<T: 'static> Homo<T> {
    /// Wraps a leaf-level sequence.
    pub fn leaves<S: Sequence<Item = T> + 'static>(sequence: S) -> Self {
        Self::Leaves(Arc::new(sequence))
    }

    /// Wraps a branch-level sequence.
    pub fn branches<S: Sequence<Item = Self> + 'static>(sequence: S) -> Self {
        Self::Branches(Arc::new(sequence))
    }

    /// Identity of the wrapped sequence.
    #[must_use]
    pub fn identity(&self) -> Identity {
        match self {
            Self::Leaves(sequence) => sequence.identity(),
            Self::Branches(sequence) => sequence.identity(),
        }
    }
}

impl<T: 'static> Expand for Homo<T> {
    type Recursor = HomoRecursor<T>;

    fn key(&self) -> Identity {
        self.identity()
    }

    fn recursor(&self) -> HomoRecursor<T> {
        match self {
            Self::Leaves(sequence) => HomoRecursor::Leaves(sequence.cursor()),
            Self::Branches(sequence) => HomoRecursor::Branches(sequence.cursor()),
        }
    }
}

/// Cursor over one level of a homogeneous tree.
pub enum HomoRecursor<T> {
    /// Cursor over a leaf level.
    Leaves(BoxCursor<T>),
    /// Cursor over a branch level.
    Branches(BoxCursor<Homo<T>>),
}

impl<T> HomoRecursor<T> {
    fn jump(&mut self, term: Term) -> Result<(), Error> {
        match self {
            Self::Leaves(cursor) => cursor.jump(term),
            Self::Branches(cursor) => cursor.jump(term),
        }
    }
}

impl<T> Sizeable for HomoRecursor<T> {
    fn size(&self) -> usize {
        match self {
            Self::Leaves(cursor) => cursor.size(),
            Self::Branches(cursor) => cursor.size(),
        }
    }
}

/// Depth-first flattening of a [`Homo`] tree.
pub struct HomoStack<T> {
    identity: Identity,
    root: Homo<T>,
    loader: LoaderFactory<Homo<T>>,
}

impl<T: 'static> HomoStack<T> {
    /// Flattens `root`, building a fresh recursor on every entry.
    #[must_use]
    pub fn flatten(root: Homo<T>) -> Self {
        Self::flatten_with(root, loader::direct())
    }

    /// Flattens `root`, caching released recursors per cursor.
    #[must_use]
    pub fn flatten_cached(root: Homo<T>, size_limit: usize) -> Self {
        Self::flatten_with(root, loader::cached(size_limit))
    }

    /// Flattens `root` with a caller-supplied loader strategy.
    #[must_use]
    pub fn flatten_with(root: Homo<T>, loader: LoaderFactory<Homo<T>>) -> Self {
        Self {
            identity: Identity::fresh(),
            root,
            loader,
        }
    }
}

impl<T> HomoStack<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Groups a raw mixed stream into a branch level.
    ///
    /// Each maximal run of consecutive leaves becomes one lazily pulled leaf
    /// level; each nested element passes through unchanged. Runs are pulled
    /// only as far as they are read, and a run is drained before the raw
    /// stream moves past it.
    pub fn collate<I, E>(source: I) -> Homo<T>
    where
        I: IntoIterator<Item = Result<HomoMixed<T>, E>>,
        I::IntoIter: Send + 'static,
        E: Into<BoxError>,
    {
        let raw: Box<dyn Iterator<Item = Result<HomoMixed<T>, BoxError>> + Send> = Box::new(
            source
                .into_iter()
                .map(|item| item.map_err(|error| -> BoxError { error.into() })),
        );
        let state = Arc::new(Mutex::new(CollateState {
            raw: raw.fuse(),
            boundary: Boundary::Open,
        }));
        Homo::branches(Lazy::new(Collator { state, run: None }))
    }
}

impl<T: 'static> Sequence for HomoStack<T> {
    type Item = T;

    fn identity(&self) -> Identity {
        self.identity
    }

    fn cursor(&self) -> BoxCursor<T> {
        Box::new(HomoCursor {
            root: self.root.recursor(),
            branches: Vec::new(),
            leaves: None,
            loader: (self.loader)(),
        })
    }
}

type Level<T> = (Identity, HomoRecursor<T>);

/// Cursor produced by [`HomoStack`].
pub struct HomoCursor<T> {
    root: HomoRecursor<T>,
    branches: Vec<(Identity, BoxCursor<Homo<T>>)>,
    leaves: Option<(Identity, BoxCursor<T>)>,
    loader: BoxLoader<Homo<T>>,
}

impl<T: 'static> HomoCursor<T> {
    /// Number of nested levels currently entered, including a leaf level.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.branches.len() + usize::from(self.leaves.is_some())
    }

    fn close_leaves(&mut self) -> Option<Level<T>> {
        let (identity, cursor) = self.leaves.take()?;
        trace_stack!(sequence = %identity, "left leaf level");
        Some((identity, HomoRecursor::Leaves(cursor)))
    }

    fn pop_branch(&mut self) -> Option<Level<T>> {
        let (identity, cursor) = self.branches.pop()?;
        trace_stack!(sequence = %identity, depth = self.branches.len(), "left branch level");
        Some((identity, HomoRecursor::Branches(cursor)))
    }

    fn release(&mut self, left: Vec<Level<T>>) {
        for (identity, recursor) in left {
            self.loader.release(identity, recursor);
        }
    }

    /// Puts back levels left during a step that failed, outermost first,
    /// stepping each back over the end it ran into.
    fn restore(&mut self, left: Vec<Level<T>>, direction: Direction) {
        for (identity, recursor) in left.into_iter().rev() {
            let stepped = match recursor {
                HomoRecursor::Leaves(mut cursor) => {
                    let stepped = cursor.get(direction.reverse()).map(drop);
                    self.leaves = Some((identity, cursor));
                    stepped
                }
                HomoRecursor::Branches(mut cursor) => {
                    let stepped = cursor.get(direction.reverse()).map(drop);
                    self.branches.push((identity, cursor));
                    stepped
                }
            };
            if let Err(error) = stepped {
                warn!(target: "preiter::stack", sequence = %identity, error = %error, "failed to step back into a level");
            }
        }
    }

    fn top_branch(&mut self) -> Option<&mut BoxCursor<Homo<T>>> {
        match (self.branches.last_mut(), &mut self.root) {
            (Some((_, cursor)), _) | (None, HomoRecursor::Branches(cursor)) => Some(cursor),
            (None, HomoRecursor::Leaves(_)) => None,
        }
    }

    fn enter(&mut self, nested: &Homo<T>, direction: Direction) -> Result<(), Error> {
        let identity = nested.key();
        let mut recursor = self.loader.load(nested)?;
        if let Err(error) = recursor.jump(direction.start()) {
            self.loader.release(identity, recursor);
            return Err(error);
        }
        match recursor {
            HomoRecursor::Leaves(cursor) => self.leaves = Some((identity, cursor)),
            HomoRecursor::Branches(cursor) => self.branches.push((identity, cursor)),
        }
        trace_stack!(sequence = %identity, depth = self.depth(), "entered nested level");
        Ok(())
    }

    /// Steps the innermost branch back over a nested level that failed to open.
    fn undo(&mut self, direction: Direction) -> bool {
        let Some(branch) = self.top_branch() else {
            return false;
        };
        match branch.get(direction.reverse()) {
            Ok(_) => true,
            Err(error) => {
                warn!(target: "preiter::stack", error = %error, "failed to step back after expansion error");
                false
            }
        }
    }
}

impl<T: 'static> Sizeable for HomoCursor<T> {
    fn size(&self) -> usize {
        let branches: usize = self.branches.iter().map(|(_, cursor)| cursor.size()).sum();
        let leaves = self.leaves.as_ref().map_or(0, |(_, cursor)| cursor.size());
        self.root.size() + branches + leaves
    }
}

impl<T: 'static> Cursor for HomoCursor<T> {
    type Item = T;

    fn jump(&mut self, term: Term) -> Result<(), Error> {
        let mut left: Vec<_> = self.close_leaves().into_iter().collect();
        left.extend(std::iter::from_fn(|| self.pop_branch()));
        self.release(left);
        self.root.jump(term)
    }

    fn get(&mut self, direction: Direction) -> Result<Step<T>, Error> {
        // Levels left on the way stay with the cursor until the step commits.
        let mut left = Vec::new();
        loop {
            if let Some((_, leaves)) = self.leaves.as_mut() {
                match leaves.get(direction) {
                    Ok(Step::Value(value)) => {
                        self.release(left);
                        return Ok(Step::Value(value));
                    }
                    Ok(Step::Exhausted(_)) => left.extend(self.close_leaves()),
                    Err(error) => {
                        self.restore(left, direction);
                        return Err(error);
                    }
                }
            }
            let step = match (self.branches.last_mut(), &mut self.root) {
                (Some((_, cursor)), _) | (None, HomoRecursor::Branches(cursor)) => cursor.get(direction),
                (None, HomoRecursor::Leaves(root)) => return root.get(direction),
            };
            match step {
                Ok(Step::Value(nested)) => match self.enter(&nested, direction) {
                    Ok(()) => self.release(std::mem::take(&mut left)),
                    Err(error) => {
                        if self.undo(direction) {
                            self.restore(left, direction);
                        } else {
                            self.release(left);
                        }
                        return Err(error);
                    }
                },
                Ok(Step::Exhausted(term)) => match self.pop_branch() {
                    Some(level) => left.push(level),
                    None => {
                        self.release(left);
                        return Ok(Step::Exhausted(term));
                    }
                },
                Err(error) => {
                    self.restore(left, direction);
                    return Err(error);
                }
            }
        }
    }
}

type RawSource<T> = Fuse<Box<dyn Iterator<Item = Result<HomoMixed<T>, BoxError>> + Send>>;

/// Where the raw stream stopped after the current run of leaves.
enum Boundary<T> {
    /// The run has not ended yet.
    Open,
    /// The run ended at a nested element, held until the collator asks.
    Nested(Homo<T>),
    /// The raw stream ended.
    End,
}

struct CollateState<T> {
    raw: RawSource<T>,
    boundary: Boundary<T>,
}

fn lock<T>(state: &Mutex<CollateState<T>>) -> MutexGuard<'_, CollateState<T>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Source of the branch level built by [`HomoStack::collate`].
struct Collator<T> {
    state: Arc<Mutex<CollateState<T>>>,
    run: Option<Lazy<T>>,
}

impl<T> Iterator for Collator<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = Result<Homo<T>, BoxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(run) = self.run.take() {
            if let Err(error) = run.preload() {
                self.run = Some(run);
                return Some(Err(error.into()));
            }
            let boundary = std::mem::replace(&mut lock(&self.state).boundary, Boundary::Open);
            match boundary {
                Boundary::Nested(nested) => return Some(Ok(nested)),
                Boundary::End => return None,
                Boundary::Open => {}
            }
        }
        let pulled = lock(&self.state).raw.next()?;
        match pulled {
            Err(error) => Some(Err(error)),
            Ok(Node::Nested(nested)) => Some(Ok(nested)),
            Ok(Node::Leaf(first)) => {
                let run = Lazy::new(RunSource {
                    first: Some(first),
                    state: Arc::clone(&self.state),
                    done: false,
                });
                self.run = Some(run.clone());
                Some(Ok(Homo::leaves(run)))
            }
        }
    }
}

/// Source of one run of consecutive leaves.
struct RunSource<T> {
    first: Option<T>,
    state: Arc<Mutex<CollateState<T>>>,
    done: bool,
}

impl<T> Iterator for RunSource<T> {
    type Item = Result<T, BoxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(first) = self.first.take() {
            return Some(Ok(first));
        }
        if self.done {
            return None;
        }
        let mut state = lock(&self.state);
        match state.raw.next() {
            Some(Ok(Node::Leaf(value))) => Some(Ok(value)),
            Some(Err(error)) => Some(Err(error)),
            Some(Ok(Node::Nested(nested))) => {
                state.boundary = Boundary::Nested(nested);
                self.done = true;
                None
            }
            None => {
                state.boundary = Boundary::End;
                self.done = true;
                None
            }
        }
    }
}
