use std::ffi::OsString;
use std::path::PathBuf;

use crate::command::clap_command;
use crate::config::{BrowseConfig, Mode};

/// Program name used when `argv` is empty.
pub(crate) const PROGRAM_NAME: &str = "riffle";

/// Arguments recognised on the command line.
///
/// Settings that can also come from a config file are optional here so that
/// an absent flag leaves the file's value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedArgs {
    /// Roots to browse.
    pub paths: Vec<PathBuf>,
    /// `--config`
    pub config: Option<PathBuf>,
    /// `--cache-size`
    pub cache_size: Option<usize>,
    /// `--mode`
    pub mode: Option<Mode>,
    /// `--ext`, repeatable.
    pub extensions: Vec<String>,
    /// `--follow-symlinks` / `--no-follow-symlinks`
    pub follow_symlinks: Option<bool>,
    /// `-v` count.
    pub verbose: u8,
    /// `--reverse`
    pub reverse: bool,
    /// `--limit`
    pub limit: Option<usize>,
    /// `--script`
    pub script: Option<String>,
}

impl ParsedArgs {
    /// Applies these arguments on top of `config`.
    #[must_use]
    pub fn overlay(&self, mut config: BrowseConfig) -> BrowseConfig {
        if let Some(cache_size) = self.cache_size {
            config.cache_size = cache_size;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if !self.extensions.is_empty() {
            config.extensions.clone_from(&self.extensions);
        }
        if let Some(follow) = self.follow_symlinks {
            config.follow_symlinks = follow;
        }
        config.verbose = config.verbose.max(self.verbose);
        config.reverse |= self.reverse;
        if self.limit.is_some() {
            config.limit = self.limit;
        }
        config
    }
}

/// Parses `argv`, including the program name.
pub fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let mut matches = clap_command(PROGRAM_NAME).try_get_matches_from(arguments)?;

    let paths = matches
        .remove_many::<OsString>("paths")
        .map(|values| values.map(PathBuf::from).collect())
        .unwrap_or_default();
    let follow_symlinks = if matches.get_flag("follow-symlinks") {
        Some(true)
    } else if matches.get_flag("no-follow-symlinks") {
        Some(false)
    } else {
        None
    };

    Ok(ParsedArgs {
        paths,
        config: matches.remove_one::<OsString>("config").map(PathBuf::from),
        cache_size: matches.remove_one::<usize>("cache-size"),
        mode: matches
            .remove_one::<String>("mode")
            .and_then(|name| Mode::from_name(&name)),
        extensions: matches
            .remove_many::<String>("ext")
            .map(Iterator::collect)
            .unwrap_or_default(),
        follow_symlinks,
        verbose: matches.get_count("verbose"),
        reverse: matches.get_flag("reverse"),
        limit: matches.remove_one::<usize>("limit"),
        script: matches.remove_one::<String>("script"),
    })
}
