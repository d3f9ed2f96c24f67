//! crates/logging/src/config.rs
//! Verbosity configuration derived from `-v` counts.

use super::levels::{Target, TraceLevels, filter_level};

/// Verbosity configuration applied when the subscriber is installed.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VerbosityConfig {
    /// Per-target levels.
    pub levels: TraceLevels,
}

impl VerbosityConfig {
    /// Create a configuration from a verbose count (0-3; higher counts clamp).
    pub fn from_verbose_level(level: u8) -> Self {
        let mut config = Self::default();

        match level {
            0 => {}
            1 => {
                config.levels.fs = 1;
                config.levels.registry = 1;
                config.levels.stack = 1;
            }
            2 => {
                config.levels.fs = 2;
                config.levels.registry = 2;
                config.levels.stack = 2;
                config.levels.cache = 2;
                config.levels.lazy = 1;
            }
            _ => {
                for target in Target::ALL {
                    config.levels.set(target, 3);
                }
            }
        }

        config
    }

    /// Builds `EnvFilter` directives for this configuration.
    ///
    /// The default directive is always `warn`; targets above level 0 get their
    /// own directive.
    #[must_use]
    pub fn directives(&self) -> String {
        let mut directives = String::from("warn");
        for target in Target::ALL {
            let level = self.levels.get(target);
            if level > 0 {
                directives.push(',');
                directives.push_str(target.name());
                directives.push('=');
                directives.push_str(filter_level(level));
            }
        }
        directives
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_level_only_has_default_directive() {
        assert_eq!(VerbosityConfig::from_verbose_level(0).directives(), "warn");
    }

    #[test]
    fn high_levels_clamp_to_trace_everywhere() {
        let config = VerbosityConfig::from_verbose_level(7);
        for target in Target::ALL {
            assert_eq!(config.levels.get(target), 3);
        }
        assert!(config.directives().contains("walk::fs=trace"));
    }
}
