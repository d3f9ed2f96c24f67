//! crates/preiter/src/identity.rs
//! Sequence identities and transport tokens.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use rustc_hash::FxHashMap;

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(0);

/// Opaque identity of a sequence, used as the recursor cache key.
///
/// Two identities compare equal only when they were produced by the same
/// call to [`Identity::fresh`], or when one was copied from the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(NonZeroU64);

impl Identity {
    /// Allocates an identity distinct from every other one in the process.
    #[must_use]
    pub fn fresh() -> Self {
        Self(NonZeroU64::MIN.saturating_add(NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Maps external keys to identities so that equal keys share one.
///
/// Used when two independently built sequences describe the same resource,
/// such as two listings of one directory.
#[derive(Debug)]
pub struct Interner<K> {
    known: Mutex<FxHashMap<K, Identity>>,
}

impl<K> Default for Interner<K> {
    fn default() -> Self {
        Self {
            known: Mutex::new(FxHashMap::default()),
        }
    }
}

impl<K: Eq + Hash> Interner<K> {
    /// Creates an empty interner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the identity for `key`, allocating one on first sight.
    pub fn intern(&self, key: K) -> Identity {
        let mut known = self.known.lock().unwrap_or_else(PoisonError::into_inner);
        *known.entry(key).or_insert_with(Identity::fresh)
    }

    /// Returns the identity for `key` without allocating.
    pub fn get<Q>(&self, key: &Q) -> Option<Identity>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let known = self.known.lock().unwrap_or_else(PoisonError::into_inner);
        known.get(key).copied()
    }

    /// Number of interned keys.
    pub fn len(&self) -> usize {
        self.known.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` when nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serializable handle naming a sequence, viewer or cursor across a
/// transport boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Token(u64);

impl Token {
    /// Wraps a raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Issues increasing tokens, starting at zero.
#[derive(Debug, Default)]
pub struct TokenFactory {
    next: AtomicU64,
}

impl TokenFactory {
    /// Creates a factory whose first token is zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }

    /// Issues the next token.
    pub fn issue(&self) -> Token {
        Token(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_identities_differ() {
        let a = Identity::fresh();
        let b = Identity::fresh();
        assert_ne!(a, b);
        assert_eq!(a, a);
    }

    #[test]
    fn interner_shares_identity_per_key() {
        let interner = Interner::new();
        let first = interner.intern("photos/2019".to_owned());
        let again = interner.intern("photos/2019".to_owned());
        let other = interner.intern("photos/2020".to_owned());
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(interner.get("photos/2019"), Some(first));
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn token_factory_counts_up() {
        let factory = TokenFactory::new();
        assert_eq!(factory.issue(), Token::new(0));
        assert_eq!(factory.issue().get(), 1);
    }
}
