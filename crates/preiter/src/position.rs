//! crates/preiter/src/position.rs
//! Index bookkeeping for cursors over a buffer.

use crate::direction::{Direction, Term};

/// Position of a cursor over a buffer of `len` elements.
///
/// Stored as a slot: slot 0 is [`Term::StartOfData`], slot `k` in `1..=len`
/// means element `k - 1` was the last one returned, and slot `len + 1` is
/// [`Term::EndOfData`]. Keeping slots unsigned lets the two terminals sit
/// one step outside the buffer on either side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Position {
    slot: usize,
}

impl Position {
    pub(crate) const fn start() -> Self {
        Self { slot: 0 }
    }

    pub(crate) const fn jump(&mut self, term: Term, len: usize) {
        self.slot = match term {
            Term::StartOfData => 0,
            Term::EndOfData => len + 1,
        };
    }

    /// Moves one element and returns its index, or parks on the terminal in
    /// that direction and returns `None`.
    pub(crate) const fn step(&mut self, direction: Direction, len: usize) -> Option<usize> {
        match direction {
            Direction::Forward => {
                if self.slot < len {
                    self.slot += 1;
                    Some(self.slot - 1)
                } else {
                    self.slot = len + 1;
                    None
                }
            }
            Direction::Backward => {
                if self.slot > 1 {
                    self.slot -= 1;
                    Some(self.slot - 1)
                } else {
                    self.slot = 0;
                    None
                }
            }
        }
    }

    /// Index of the element a forward step would return.
    pub(crate) const fn ahead(self) -> usize {
        self.slot
    }

    /// Records that element `index` was just returned.
    pub(crate) const fn settle(&mut self, index: usize) {
        self.slot = index + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(position: &mut Position, direction: Direction, len: usize, steps: usize) -> Vec<Option<usize>> {
        (0..steps).map(|_| position.step(direction, len)).collect()
    }

    #[test]
    fn forward_then_backward_over_three() {
        let mut position = Position::start();
        assert_eq!(
            walk(&mut position, Direction::Forward, 3, 5),
            vec![Some(0), Some(1), Some(2), None, None]
        );
        assert_eq!(
            walk(&mut position, Direction::Backward, 3, 5),
            vec![Some(2), Some(1), Some(0), None, None]
        );
    }

    #[test]
    fn empty_buffer_only_has_terminals() {
        let mut position = Position::start();
        assert_eq!(position.step(Direction::Forward, 0), None);
        assert_eq!(position.step(Direction::Backward, 0), None);
        position.jump(Term::EndOfData, 0);
        assert_eq!(position.step(Direction::Backward, 0), None);
    }

    #[test]
    fn jump_to_end_then_backward_yields_last() {
        let mut position = Position::start();
        position.jump(Term::EndOfData, 4);
        assert_eq!(position.step(Direction::Backward, 4), Some(3));
        position.jump(Term::StartOfData, 4);
        assert_eq!(position.step(Direction::Forward, 4), Some(0));
    }

    #[test]
    fn settle_and_ahead_agree_with_step() {
        let mut position = Position::start();
        assert_eq!(position.ahead(), 0);
        position.settle(0);
        assert_eq!(position.ahead(), 1);
        assert_eq!(position.step(Direction::Backward, 1), None);
    }
}
