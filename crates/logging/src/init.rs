//! crates/logging/src/init.rs
//! Subscriber installation.

use std::fmt;

use tracing_subscriber::EnvFilter;

use super::config::VerbosityConfig;

/// Failure to install the global subscriber.
#[derive(Debug)]
pub enum InitError {
    /// The derived or `RUST_LOG` directives did not parse.
    Filter(String),
    /// A global subscriber is already installed.
    AlreadyInstalled,
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Filter(message) => write!(f, "invalid log filter: {message}"),
            Self::AlreadyInstalled => f.write_str("a tracing subscriber is already installed"),
        }
    }
}

impl std::error::Error for InitError {}

/// Installs a formatting subscriber writing to standard error.
///
/// `RUST_LOG`, when set and non-empty, overrides the directives derived from
/// `config`.
///
/// # Errors
///
/// Returns [`InitError::Filter`] when the directives do not parse and
/// [`InitError::AlreadyInstalled`] when another subscriber owns the process.
pub fn init_tracing(config: &VerbosityConfig) -> Result<(), InitError> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) if !value.trim().is_empty() => EnvFilter::try_new(value),
        _ => EnvFilter::try_new(config.directives()),
    }
    .map_err(|error| InitError::Filter(error.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|_| InitError::AlreadyInstalled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_reported() {
        let config = VerbosityConfig::from_verbose_level(1);
        let first = init_tracing(&config);
        let second = init_tracing(&config);
        assert!(first.is_ok() || matches!(first, Err(InitError::AlreadyInstalled)));
        assert!(matches!(second, Err(InitError::AlreadyInstalled)));
    }
}
