//! crates/preiter/src/node.rs
//! Elements of a raw nested stream.

/// An element of a nested sequence: either a leaf value or something that
/// flattens into more elements.
///
/// Every stack and collator decides recursability through this type, so a
/// value is nested exactly when it was produced as [`Node::Nested`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node<T, R> {
    /// A value yielded as-is.
    Leaf(T),
    /// A nested sequence entered in place.
    Nested(R),
}

impl<T, R> Node<T, R> {
    /// Returns `true` for [`Node::Nested`].
    #[must_use]
    pub const fn is_nested(&self) -> bool {
        matches!(self, Self::Nested(_))
    }

    /// The leaf value, if any.
    #[must_use]
    pub fn into_leaf(self) -> Option<T> {
        match self {
            Self::Leaf(value) => Some(value),
            Self::Nested(_) => None,
        }
    }

    /// Borrows the nested sequence, if any.
    #[must_use]
    pub const fn as_nested(&self) -> Option<&R> {
        match self {
            Self::Leaf(_) => None,
            Self::Nested(nested) => Some(nested),
        }
    }

    /// Maps the nested half, keeping leaves untouched.
    pub fn map_nested<S>(self, f: impl FnOnce(R) -> S) -> Node<T, S> {
        match self {
            Self::Leaf(value) => Node::Leaf(value),
            Self::Nested(nested) => Node::Nested(f(nested)),
        }
    }
}
