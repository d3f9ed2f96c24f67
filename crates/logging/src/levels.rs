//! crates/logging/src/levels.rs
//! Per-target verbosity levels.

use crate::targets;

/// Diagnostic categories, one per tracing target.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Target {
    /// Cursor positioning and stepping.
    Cursor,
    /// Flattening stacks.
    Stack,
    /// Recursor caches and loaders.
    Cache,
    /// Lazy buffers.
    Lazy,
    /// Sequence registry.
    Registry,
    /// Filesystem producer.
    Fs,
}

impl Target {
    /// Every target, in directive order.
    pub const ALL: [Self; 6] = [
        Self::Cursor,
        Self::Stack,
        Self::Cache,
        Self::Lazy,
        Self::Registry,
        Self::Fs,
    ];

    /// The tracing target string events are emitted under.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cursor => targets::CURSOR,
            Self::Stack => targets::STACK,
            Self::Cache => targets::CACHE,
            Self::Lazy => targets::LAZY,
            Self::Registry => targets::REGISTRY,
            Self::Fs => targets::FS,
        }
    }

    /// Parses a short category name such as `stack` or `fs`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let short = name.rsplit("::").next().unwrap_or(name);
        Self::ALL
            .into_iter()
            .find(|target| target.name().rsplit("::").next() == Some(short))
    }
}

/// Level per target: 0 silences the target beyond warnings, 1 is info, 2 is
/// debug and 3 or more is trace.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TraceLevels {
    /// Cursor level.
    pub cursor: u8,
    /// Stack level.
    pub stack: u8,
    /// Cache level.
    pub cache: u8,
    /// Lazy buffer level.
    pub lazy: u8,
    /// Registry level.
    pub registry: u8,
    /// Filesystem level.
    pub fs: u8,
}

impl TraceLevels {
    /// Level configured for `target`.
    #[must_use]
    pub const fn get(&self, target: Target) -> u8 {
        match target {
            Target::Cursor => self.cursor,
            Target::Stack => self.stack,
            Target::Cache => self.cache,
            Target::Lazy => self.lazy,
            Target::Registry => self.registry,
            Target::Fs => self.fs,
        }
    }

    /// Sets the level for `target`.
    pub const fn set(&mut self, target: Target, level: u8) {
        match target {
            Target::Cursor => self.cursor = level,
            Target::Stack => self.stack = level,
            Target::Cache => self.cache = level,
            Target::Lazy => self.lazy = level,
            Target::Registry => self.registry = level,
            Target::Fs => self.fs = level,
        }
    }

    /// Raises the level for `target` to at least `level`.
    pub fn raise(&mut self, target: Target, level: u8) {
        let current = self.get(target);
        self.set(target, current.max(level));
    }
}

/// Maps a numeric level to the `EnvFilter` level keyword.
pub(crate) const fn filter_level(level: u8) -> &'static str {
    match level {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}
