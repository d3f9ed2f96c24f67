#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` owns the diagnostic vocabulary shared by the riffle crates: the
//! tracing targets each subsystem emits under, one macro per target, and the
//! mapping from a command-line verbosity count to per-target levels.
//!
//! # Design
//!
//! Subsystems never name targets by hand. They call the macros in
//! [`tracing_macros`], which expand to `::tracing` events tagged with the
//! constants in [`targets`]. [`VerbosityConfig`] translates `-v` counts into a
//! [`TraceLevels`] table, and [`init_tracing`] installs a `tracing-subscriber`
//! formatter whose `EnvFilter` is derived from that table. A `RUST_LOG`
//! variable, when present, replaces the derived directives entirely.
//!
//! # Invariants
//!
//! - Level 0 only lets warnings and errors through.
//! - Raising the verbosity never lowers the level of any target.
//! - Installing the subscriber twice is reported, never a panic.
//!
//! # Examples
//!
//! ```
//! use logging::{Target, VerbosityConfig};
//!
//! let config = VerbosityConfig::from_verbose_level(2);
//! assert_eq!(config.levels.get(Target::Stack), 2);
//! assert!(config.directives().contains("preiter::stack=debug"));
//! ```

mod config;
mod init;
mod levels;
pub mod targets;
pub mod tracing_macros;

pub use config::VerbosityConfig;
pub use init::{InitError, init_tracing};
pub use levels::{Target, TraceLevels};
