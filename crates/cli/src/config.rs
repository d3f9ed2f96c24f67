//! Browse settings loaded from a TOML file and overridden on the command line.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Number of buffered entries a cursor may keep for subtrees it has left.
pub const DEFAULT_CACHE_SIZE: usize = 1024;

/// How nested listings are flattened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Files and directories interleave freely at every level.
    #[default]
    Hetero,
    /// Each level is regrouped into runs of files and lone directories.
    Homo,
}

impl Mode {
    /// Parses the command-line spelling.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "hetero" => Some(Self::Hetero),
            "homo" => Some(Self::Homo),
            _ => None,
        }
    }
}

/// Effective browse configuration.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrowseConfig {
    /// Recursor cache budget per cursor. `0` rebuilds on every entry.
    pub cache_size: usize,
    /// Flattening mode.
    pub mode: Mode,
    /// Keep only files with one of these extensions (case-insensitive).
    /// Empty keeps everything.
    pub extensions: Vec<String>,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Diagnostic verbosity, as a `-v` count.
    pub verbose: u8,
    /// Walk from the end towards the start.
    pub reverse: bool,
    /// Stop after this many entries.
    pub limit: Option<usize>,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            cache_size: DEFAULT_CACHE_SIZE,
            mode: Mode::default(),
            extensions: Vec::new(),
            follow_symlinks: false,
            verbose: 0,
            reverse: false,
            limit: None,
        }
    }
}

/// Failure to load a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        /// Configuration path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The file is not a valid configuration.
    #[error("invalid config '{}': {source}", path.display())]
    Parse {
        /// Configuration path.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },
}

impl BrowseConfig {
    /// Parses a configuration document.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Returns `true` when `path` passes the extension filter.
    #[must_use]
    pub fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| {
                self.extensions.iter().any(|wanted| {
                    wanted
                        .trim_start_matches('.')
                        .eq_ignore_ascii_case(extension)
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = BrowseConfig::from_toml("").expect("parse");
        assert_eq!(config, BrowseConfig::default());
        assert_eq!(config.cache_size, DEFAULT_CACHE_SIZE);
    }

    #[test]
    fn every_field_is_read() {
        let config = BrowseConfig::from_toml(
            r#"
            cache_size = 0
            mode = "homo"
            extensions = ["jpg", ".PNG"]
            follow_symlinks = true
            verbose = 2
            reverse = true
            limit = 5
            "#,
        )
        .expect("parse");
        assert_eq!(config.cache_size, 0);
        assert_eq!(config.mode, Mode::Homo);
        assert!(config.follow_symlinks);
        assert_eq!(config.verbose, 2);
        assert!(config.reverse);
        assert_eq!(config.limit, Some(5));
        assert!(config.accepts(Path::new("a/b.png")));
        assert!(config.accepts(Path::new("c.JPG")));
        assert!(!config.accepts(Path::new("notes.txt")));
        assert!(!config.accepts(Path::new("README")));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(BrowseConfig::from_toml("colour = true").is_err());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(BrowseConfig::from_toml(r#"mode = "flat""#).is_err());
        assert_eq!(Mode::from_name("homo"), Some(Mode::Homo));
        assert_eq!(Mode::from_name("flat"), None);
    }

    #[test]
    fn load_reports_missing_file() {
        let error = BrowseConfig::load(Path::new("/nonexistent/riffle.toml")).expect_err("missing");
        assert!(matches!(error, ConfigError::Read { .. }));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("riffle.toml");
        fs::write(&path, "limit = 3\n").expect("write");
        assert_eq!(BrowseConfig::load(&path).expect("load").limit, Some(3));
    }
}
