//! Asynchronous flattening over homogeneous trees, plus the collator that
//! builds them from raw mixed sources.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use logging::trace_stack;
use tracing::warn;

use super::{BoxCursor, BoxSource, Cursor, Lazy, Mixed, Recursable, Sequence, SharedSequence, Source};
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

impl<T: Send> fmt::Debug for Homo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaves(sequence) => f.debug_tuple("Leaves").field(&sequence.identity()).finish(),
            Self::Branches(sequence) => f.debug_tuple("Branches").field(&sequence.identity()).finish(),
        }
    }
}

impl<T: Send + 'static> Homo<T> {
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

impl<T: Send + 'static> Expand for Homo<T> {
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

impl<T: Send> HomoRecursor<T> {
    async fn jump(&mut self, term: Term) -> Result<(), Error> {
        match self {
            Self::Leaves(cursor) => cursor.jump(term).await,
            Self::Branches(cursor) => cursor.jump(term).await,
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

/// Depth-first flattening of a [`Homo`] tree, stepped asynchronously.
pub struct HomoStack<T> {
    identity: Identity,
    root: Homo<T>,
    loader: LoaderFactory<Homo<T>>,
}

impl<T: Send + 'static> HomoStack<T> {
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
    /// Groups a raw mixed source into a branch level.
    ///
    /// Each maximal run of consecutive leaves becomes one lazily pulled leaf
    /// level; nested elements pass through. A run is drained before the raw
    /// source moves past it.
    pub fn collate(source: impl Source<HomoMixed<T>> + 'static) -> Homo<T> {
        Self::collate_identified(Identity::fresh(), source)
    }

    /// Like [`collate`](Self::collate), keeping a caller-chosen identity for
    /// the branch level.
    pub fn collate_identified(identity: Identity, source: impl Source<HomoMixed<T>> + 'static) -> Homo<T> {
        let state = Arc::new(tokio::sync::Mutex::new(CollateState {
            raw: Box::new(source),
            boundary: Boundary::Open,
            ended: false,
        }));
        Homo::branches(Lazy::identified(identity, Collator { state, run: None }))
    }

    /// Rebuilds a heterogeneous tree as a homogeneous one, level by level and
    /// only as far as it is read. Each level keeps the identity of the
    /// nested sequence it came from.
    #[must_use]
    pub fn homogenize(root: &Recursable<T>) -> Homo<T> {
        Self::collate_identified(root.key(), Homogenized { cursor: root.cursor() })
    }
}

impl<T: Send + 'static> Sequence for HomoStack<T> {
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

impl<T: Send + 'static> HomoCursor<T> {
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
    async fn restore(&mut self, left: Vec<Level<T>>, direction: Direction) {
        for (identity, recursor) in left.into_iter().rev() {
            let stepped = match recursor {
                HomoRecursor::Leaves(mut cursor) => {
                    let stepped = cursor.get(direction.reverse()).await.map(drop);
                    self.leaves = Some((identity, cursor));
                    stepped
                }
                HomoRecursor::Branches(mut cursor) => {
                    let stepped = cursor.get(direction.reverse()).await.map(drop);
                    self.branches.push((identity, cursor));
                    stepped
                }
            };
            if let Err(error) = stepped {
                warn!(target: "preiter::stack", sequence = %identity, error = %error, "failed to step back into a level");
            }
        }
    }

    async fn enter(&mut self, nested: &Homo<T>, direction: Direction) -> Result<(), Error> {
        let identity = nested.key();
        let mut recursor = self.loader.load(nested)?;
        if let Err(error) = recursor.jump(direction.start()).await {
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

    async fn undo(&mut self, direction: Direction) -> bool {
        let branch = match (self.branches.last_mut(), &mut self.root) {
            (Some((_, cursor)), _) | (None, HomoRecursor::Branches(cursor)) => cursor,
            (None, HomoRecursor::Leaves(_)) => return false,
        };
        match branch.get(direction.reverse()).await {
            Ok(_) => true,
            Err(error) => {
                warn!(target: "preiter::stack", error = %error, "failed to step back after expansion error");
                false
            }
        }
    }
}

impl<T: Send + 'static> Sizeable for HomoCursor<T> {
    fn size(&self) -> usize {
        let branches: usize = self.branches.iter().map(|(_, cursor)| cursor.size()).sum();
        let leaves = self.leaves.as_ref().map_or(0, |(_, cursor)| cursor.size());
        self.root.size() + branches + leaves
    }
}

#[async_trait]
impl<T: Send + 'static> Cursor for HomoCursor<T> {
    type Item = T;

    async fn jump(&mut self, term: Term) -> Result<(), Error> {
        let mut left: Vec<_> = self.close_leaves().into_iter().collect();
        left.extend(std::iter::from_fn(|| self.pop_branch()));
        self.release(left);
        self.root.jump(term).await
    }

    async fn get(&mut self, direction: Direction) -> Result<Step<T>, Error> {
        // Levels left on the way stay with the cursor until the step commits.
        let mut left = Vec::new();
        loop {
            if let Some((_, leaves)) = self.leaves.as_mut() {
                match leaves.get(direction).await {
                    Ok(Step::Value(value)) => {
                        self.release(left);
                        return Ok(Step::Value(value));
                    }
                    Ok(Step::Exhausted(_)) => left.extend(self.close_leaves()),
                    Err(error) => {
                        self.restore(left, direction).await;
                        return Err(error);
                    }
                }
            }
            let step = match (self.branches.last_mut(), &mut self.root) {
                (Some((_, cursor)), _) | (None, HomoRecursor::Branches(cursor)) => cursor.get(direction).await,
                (None, HomoRecursor::Leaves(root)) => return root.get(direction).await,
            };
            match step {
                Ok(Step::Value(nested)) => match self.enter(&nested, direction).await {
                    Ok(()) => self.release(std::mem::take(&mut left)),
                    Err(error) => {
                        if self.undo(direction).await {
                            self.restore(left, direction).await;
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
                    self.restore(left, direction).await;
                    return Err(error);
                }
            }
        }
    }
}

/// Where the raw source stopped after the current run of leaves.
enum Boundary<T> {
    /// The run has not ended yet.
    Open,
    /// The run ended at a nested element, held until the collator asks.
    Nested(Homo<T>),
    /// The raw source ended.
    End,
}

struct CollateState<T> {
    raw: BoxSource<HomoMixed<T>>,
    boundary: Boundary<T>,
    ended: bool,
}

impl<T: Send> CollateState<T> {
    async fn pull(&mut self) -> Result<Option<HomoMixed<T>>, BoxError> {
        if self.ended {
            return Ok(None);
        }
        let pulled = self.raw.pull().await?;
        self.ended = pulled.is_none();
        Ok(pulled)
    }
}

type SharedState<T> = Arc<tokio::sync::Mutex<CollateState<T>>>;

/// Source of the branch level built by [`HomoStack::collate`].
struct Collator<T> {
    state: SharedState<T>,
    run: Option<Lazy<T>>,
}

#[async_trait]
impl<T> Source<Homo<T>> for Collator<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn pull(&mut self) -> Result<Option<Homo<T>>, BoxError> {
        if let Some(run) = self.run.take() {
            if let Err(error) = run.preload().await {
                self.run = Some(run);
                return Err(error.into());
            }
            let boundary = std::mem::replace(&mut self.state.lock().await.boundary, Boundary::Open);
            match boundary {
                Boundary::Nested(nested) => return Ok(Some(nested)),
                Boundary::End => return Ok(None),
                Boundary::Open => {}
            }
        }
        let pulled = self.state.lock().await.pull().await?;
        Ok(match pulled {
            None => None,
            Some(Node::Nested(nested)) => Some(nested),
            Some(Node::Leaf(first)) => {
                let run = Lazy::new(RunSource {
                    first: Some(first),
                    state: Arc::clone(&self.state),
                    done: false,
                });
                self.run = Some(run.clone());
                Some(Homo::leaves(run))
            }
        })
    }
}

/// Source of one run of consecutive leaves.
struct RunSource<T> {
    first: Option<T>,
    state: SharedState<T>,
    done: bool,
}

#[async_trait]
impl<T: Send> Source<T> for RunSource<T> {
    async fn pull(&mut self) -> Result<Option<T>, BoxError> {
        if let Some(first) = self.first.take() {
            return Ok(Some(first));
        }
        if self.done {
            return Ok(None);
        }
        let mut state = self.state.lock().await;
        match state.pull().await? {
            Some(Node::Leaf(value)) => Ok(Some(value)),
            Some(Node::Nested(nested)) => {
                state.boundary = Boundary::Nested(nested);
                self.done = true;
                Ok(None)
            }
            None => {
                state.boundary = Boundary::End;
                self.done = true;
                Ok(None)
            }
        }
    }
}

/// Raw source reading one level of a heterogeneous tree.
struct Homogenized<T> {
    cursor: BoxCursor<Mixed<T>>,
}

#[async_trait]
impl<T> Source<HomoMixed<T>> for Homogenized<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn pull(&mut self) -> Result<Option<HomoMixed<T>>, BoxError> {
        Ok(match self.cursor.next().await? {
            Step::Value(Node::Leaf(value)) => Some(Node::Leaf(value)),
            Step::Value(Node::Nested(nested)) => Some(Node::Nested(HomoStack::homogenize(&nested))),
            Step::Exhausted(_) => None,
        })
    }
}
