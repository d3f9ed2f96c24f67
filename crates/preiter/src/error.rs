//! crates/preiter/src/error.rs
//! Error type shared by every cursor.

use crate::identity::{Identity, Token};

/// Boxed error carried from sources, loaders and mapping functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures surfaced by cursor operations.
///
/// Errors never move a cursor: retrying the same operation after the cause
/// is fixed resumes where the failed call started.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A lazy buffer's source failed to produce its next element.
    #[error("failed to pull the next element of sequence {sequence}: {source}")]
    Pull {
        /// Sequence whose source failed.
        sequence: Identity,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
    /// A loader could not build the recursor for a nested sequence.
    #[error("failed to load nested sequence {sequence}: {source}")]
    Load {
        /// Sequence that could not be expanded.
        sequence: Identity,
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
    /// A transform's mapping function failed.
    #[error("failed to transform element: {source}")]
    Map {
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
    /// A request named a sequence the registry does not hold.
    #[error("no sequence registered under token {0}")]
    UnknownSequence(Token),
    /// A remote request could not be delivered or answered.
    #[error("transport failure: {source}")]
    Transport {
        /// Underlying failure.
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Builds [`Error::Pull`].
    pub fn pull(sequence: Identity, source: impl Into<BoxError>) -> Self {
        Self::Pull {
            sequence,
            source: source.into(),
        }
    }

    /// Builds [`Error::Load`].
    pub fn load(sequence: Identity, source: impl Into<BoxError>) -> Self {
        Self::Load {
            sequence,
            source: source.into(),
        }
    }

    /// Builds [`Error::Map`].
    pub fn map(source: impl Into<BoxError>) -> Self {
        Self::Map {
            source: source.into(),
        }
    }

    /// Builds [`Error::Transport`].
    pub fn transport(source: impl Into<BoxError>) -> Self {
        Self::Transport {
            source: source.into(),
        }
    }

    /// The sequence the failure is attributed to, when known.
    #[must_use]
    pub const fn sequence(&self) -> Option<Identity> {
        match self {
            Self::Pull { sequence, .. } | Self::Load { sequence, .. } => Some(*sequence),
            Self::Map { .. } | Self::UnknownSequence(_) | Self::Transport { .. } => None,
        }
    }
}
