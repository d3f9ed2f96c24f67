//! crates/preiter/src/step.rs
//! Outcome of a single cursor step.

use crate::direction::{Direction, Term};

/// Either the element stepped onto, or the terminal reached instead.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Step<T> {
    /// An element.
    Value(T),
    /// No element remains in the requested direction.
    Exhausted(Term),
}

impl<T> Step<T> {
    /// The terminal reported when `direction` has nothing left.
    pub const fn done(direction: Direction) -> Self {
        Self::Exhausted(direction.done())
    }

    /// Returns `true` for [`Step::Exhausted`].
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted(_))
    }

    /// The terminal, if this step reached one.
    #[must_use]
    pub const fn term(&self) -> Option<Term> {
        match self {
            Self::Value(_) => None,
            Self::Exhausted(term) => Some(*term),
        }
    }

    /// The element, if any.
    #[must_use]
    pub fn value(self) -> Option<T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Exhausted(_) => None,
        }
    }

    /// Borrows the element.
    pub const fn as_ref(&self) -> Step<&T> {
        match self {
            Self::Value(value) => Step::Value(value),
            Self::Exhausted(term) => Step::Exhausted(*term),
        }
    }

    /// Maps the element, keeping terminals untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Step<U> {
        match self {
            Self::Value(value) => Step::Value(f(value)),
            Self::Exhausted(term) => Step::Exhausted(term),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_reports_the_direction_terminal() {
        assert_eq!(Step::<u8>::done(Direction::Forward), Step::Exhausted(Term::EndOfData));
        assert_eq!(
            Step::<u8>::done(Direction::Backward).term(),
            Some(Term::StartOfData)
        );
    }

    #[test]
    fn map_leaves_terminals_alone() {
        assert_eq!(Step::Value(2).map(|v| v * 10), Step::Value(20));
        let end: Step<i32> = Step::Exhausted(Term::EndOfData);
        assert!(end.map(|v| v * 10).is_exhausted());
    }
}
