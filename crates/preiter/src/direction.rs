//! crates/preiter/src/direction.rs
//! Traversal vocabulary: the two terminals and the two directions.

/// A sentinel position at either edge of a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Term {
    /// Before the first element.
    StartOfData,
    /// After the last element.
    EndOfData,
}

impl Term {
    /// The terminal at the other edge.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::StartOfData => Self::EndOfData,
            Self::EndOfData => Self::StartOfData,
        }
    }
}

/// Direction of a single step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Towards [`Term::EndOfData`].
    Forward,
    /// Towards [`Term::StartOfData`].
    Backward,
}

impl Direction {
    /// The terminal a traversal in this direction begins from.
    #[must_use]
    pub const fn start(self) -> Term {
        match self {
            Self::Forward => Term::StartOfData,
            Self::Backward => Term::EndOfData,
        }
    }

    /// The terminal reported once this direction runs out of elements.
    #[must_use]
    pub const fn done(self) -> Term {
        self.start().opposite()
    }

    /// The other direction.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}
