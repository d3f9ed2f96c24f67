#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the command-line front end of `riffle`. It parses the
//! arguments, merges them over an optional TOML configuration file, turns the
//! requested paths into one lazily flattened listing and walks it, printing
//! one relative path per line.
//!
//! # Design
//!
//! The crate exposes [`run`] as the primary entry point. The function accepts
//! an iterator of arguments together with handles for standard output and
//! error, so tests can drive it in-process. A [`clap`] builder definition
//! performs the parse. [`config::BrowseConfig`] carries the effective
//! settings. Walking happens on a `tokio` runtime owned by the call.
//!
//! # Invariants
//!
//! - `run` never panics; failures surface as non-zero exit codes.
//! - Command-line flags always take precedence over configuration values.
//! - A reverse walk prints exactly the reverse of the forward walk.
//!
//! # Errors
//!
//! | Exit code | Meaning |
//! |---|---|
//! | `0` | Success, including `--help` and `--version`. |
//! | `1` | Invalid arguments, configuration or script. |
//! | `2` | A path or directory listing could not be read. |
//!
//! # Examples
//!
//! ```
//! let temp = tempfile::tempdir().unwrap();
//! std::fs::create_dir(temp.path().join("album")).unwrap();
//! std::fs::write(temp.path().join("album/b.jpg"), b"").unwrap();
//! std::fs::write(temp.path().join("album/a.jpg"), b"").unwrap();
//!
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let root = temp.path().join("album");
//! let exit_code = cli::run(
//!     [std::ffi::OsStr::new("riffle"), std::ffi::OsStr::new("--reverse"), root.as_os_str()],
//!     &mut stdout,
//!     &mut stderr,
//! );
//!
//! assert_eq!(exit_code, 0);
//! assert_eq!(String::from_utf8(stdout).unwrap(), "album/b.jpg\nalbum/a.jpg\n");
//! assert!(stderr.is_empty());
//! ```

use std::ffi::OsString;
use std::io::Write;

use clap::error::ErrorKind;
use logging::{InitError, VerbosityConfig};

mod arguments;
mod browse;
mod command;
pub mod config;
pub mod script;

pub use arguments::{ParsedArgs, parse_args};
pub use browse::BrowseError;

use arguments::PROGRAM_NAME;
use config::BrowseConfig;
use script::Script;

/// Exit code for a successful run.
pub const EXIT_OK: i32 = 0;
/// Exit code for invalid arguments, configuration or scripts.
pub const EXIT_USAGE: i32 = 1;
/// Exit code for traversal failures.
pub const EXIT_TRAVERSAL: i32 = 2;

/// Parses `arguments`, walks the requested paths and returns the exit code.
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
    if args.is_empty() {
        args.push(OsString::from(PROGRAM_NAME));
    }

    let parsed = match parse_args(args) {
        Ok(parsed) => parsed,
        Err(error) => {
            return match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = write!(stdout, "{error}");
                    EXIT_OK
                }
                _ => {
                    let _ = write!(stderr, "{error}");
                    EXIT_USAGE
                }
            };
        }
    };

    let base = match parsed.config.as_deref() {
        Some(path) => match BrowseConfig::load(path) {
            Ok(config) => config,
            Err(error) => {
                let _ = writeln!(stderr, "{PROGRAM_NAME}: {error}");
                return EXIT_USAGE;
            }
        },
        None => BrowseConfig::default(),
    };
    let config = parsed.overlay(base);

    let script = match parsed.script.as_deref().map(Script::parse).transpose() {
        Ok(script) => script,
        Err(error) => {
            let _ = writeln!(stderr, "{PROGRAM_NAME}: {error}");
            return EXIT_USAGE;
        }
    };

    match logging::init_tracing(&VerbosityConfig::from_verbose_level(config.verbose)) {
        Ok(()) | Err(InitError::AlreadyInstalled) => {}
        Err(error) => {
            let _ = writeln!(stderr, "{PROGRAM_NAME}: {error}");
        }
    }

    match browse::browse(&parsed.paths, &config, script.as_ref(), stdout) {
        Ok(()) => EXIT_OK,
        Err(error) => {
            let _ = writeln!(stderr, "{PROGRAM_NAME}: {error}");
            EXIT_TRAVERSAL
        }
    }
}
