use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use preiter::nonblocking::{BoxCursor, HeteroStack, HomoStack, Recursable, Sequence, SequenceExt, SharedSequence};
use preiter::{Direction, Interner, Step, Term};
use tracing::debug;
use walk::{Entry, WalkError, WalkOptions};

use crate::config::{BrowseConfig, Mode};
use crate::script::{Command, Script};

/// Failure while walking the requested paths.
#[derive(Debug, thiserror::Error)]
pub enum BrowseError {
    /// A root could not be inspected.
    #[error(transparent)]
    Walk(#[from] WalkError),
    /// A cursor step failed.
    #[error(transparent)]
    Cursor(#[from] preiter::Error),
    /// The async runtime could not start.
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] io::Error),
    /// Writing results failed.
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

/// Walks `paths` and writes one line per entry, or per scripted step.
pub fn browse<Out: Write>(
    paths: &[PathBuf],
    config: &BrowseConfig,
    script: Option<&Script>,
    out: &mut Out,
) -> Result<(), BrowseError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(BrowseError::Runtime)?;
    runtime.block_on(async {
        let sequence = sequence(paths, config).await?;
        let mut cursor = sequence.cursor();
        match script {
            Some(script) => run_script(&mut cursor, script, out).await,
            None => walk_all(&mut cursor, config, out).await,
        }
    })
}

async fn sequence(paths: &[PathBuf], config: &BrowseConfig) -> Result<SharedSequence<Entry>, BrowseError> {
    let interner = Arc::new(Interner::new());
    let options = WalkOptions {
        follow_symlinks: config.follow_symlinks,
    };
    let root = walk::collection(paths, options, &interner).await?;
    debug!(
        mode = ?config.mode,
        cache_size = config.cache_size,
        roots = paths.len(),
        "browsing"
    );

    let flattened = flatten(root, config);
    if config.extensions.is_empty() {
        return Ok(flattened);
    }
    let filter = config.clone();
    Ok(flattened
        .filtered(move |entry: &Entry| filter.accepts(entry.relative_path()))
        .shared())
}

fn flatten(root: Recursable<Entry>, config: &BrowseConfig) -> SharedSequence<Entry> {
    match (config.mode, config.cache_size) {
        (Mode::Hetero, 0) => HeteroStack::flatten(root).shared(),
        (Mode::Hetero, size) => HeteroStack::flatten_cached(root, size).shared(),
        (Mode::Homo, 0) => HomoStack::flatten(HomoStack::homogenize(&root)).shared(),
        (Mode::Homo, size) => HomoStack::flatten_cached(HomoStack::homogenize(&root), size).shared(),
    }
}

async fn walk_all<Out: Write>(
    cursor: &mut BoxCursor<Entry>,
    config: &BrowseConfig,
    out: &mut Out,
) -> Result<(), BrowseError> {
    let direction = if config.reverse {
        cursor.jump(Term::EndOfData).await?;
        Direction::Backward
    } else {
        Direction::Forward
    };

    let mut shown = 0usize;
    while config.limit.is_none_or(|limit| shown < limit) {
        match cursor.get(direction).await? {
            Step::Value(entry) => {
                print_entry(out, &entry)?;
                shown += 1;
            }
            Step::Exhausted(_) => break,
        }
    }
    Ok(())
}

async fn run_script<Out: Write>(
    cursor: &mut BoxCursor<Entry>,
    script: &Script,
    out: &mut Out,
) -> Result<(), BrowseError> {
    for command in script.commands() {
        match *command {
            Command::Get(direction) => match cursor.get(direction).await? {
                Step::Value(entry) => print_entry(out, &entry)?,
                Step::Exhausted(term) => print_term(out, term)?,
            },
            Command::Jump(term) => cursor.jump(term).await?,
        }
    }
    Ok(())
}

fn print_entry<Out: Write>(out: &mut Out, entry: &Entry) -> Result<(), BrowseError> {
    writeln!(out, "{}", entry.relative_path().display()).map_err(BrowseError::Output)
}

fn print_term<Out: Write>(out: &mut Out, term: Term) -> Result<(), BrowseError> {
    let marker = match term {
        Term::StartOfData => "[start]",
        Term::EndOfData => "[end]",
    };
    writeln!(out, "{marker}").map_err(BrowseError::Output)
}
