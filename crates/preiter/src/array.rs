//! crates/preiter/src/array.rs
//! Cursor over a fixed, shared buffer.

use std::sync::Arc;

use logging::trace_cursor;

use crate::direction::{Direction, Term};
use crate::position::Position;
use crate::sizeable::Sizeable;
use crate::step::Step;

/// Cursor over an immutable buffer shared with every other cursor of the
/// same sequence. Stepping never fails, so both variants wrap it directly.
#[derive(Debug)]
pub struct ArrayCursor<T> {
    items: Arc<[T]>,
    position: Position,
}

impl<T: Clone> ArrayCursor<T> {
    /// Creates a cursor parked at [`Term::StartOfData`].
    #[must_use]
    pub fn new(items: Arc<[T]>) -> Self {
        Self {
            items,
            position: Position::start(),
        }
    }

    pub(crate) fn seek(&mut self, term: Term) {
        self.position.jump(term, self.items.len());
    }

    pub(crate) fn step(&mut self, direction: Direction) -> Step<T> {
        match self.position.step(direction, self.items.len()) {
            Some(index) => Step::Value(self.items[index].clone()),
            None => {
                trace_cursor!(?direction, len = self.items.len(), "array exhausted");
                Step::done(direction)
            }
        }
    }
}

impl<T> Sizeable for ArrayCursor<T> {
    fn size(&self) -> usize {
        self.items.len()
    }
}
