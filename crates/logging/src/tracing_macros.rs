//! crates/logging/src/tracing_macros.rs
//! One macro per diagnostic target.
//!
//! Every macro forwards its arguments untouched, so the full `tracing` field
//! syntax (`key = %value`, `?debug`, format strings) is available.

/// Emit a cursor trace.
///
/// # Example
/// ```ignore
/// trace_cursor!(direction = ?direction, "stepped");
/// ```
#[macro_export]
macro_rules! trace_cursor {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "preiter::cursor", $($arg)*);
    };
}

/// Emit a stack trace when a nested sequence is entered or left.
///
/// # Example
/// ```ignore
/// trace_stack!(depth = 2, "entered nested sequence");
/// ```
#[macro_export]
macro_rules! trace_stack {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "preiter::stack", $($arg)*);
    };
}

/// Emit a cache trace.
///
/// # Example
/// ```ignore
/// trace_cache!(sequence = %identity, "cache hit");
/// ```
#[macro_export]
macro_rules! trace_cache {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "preiter::cache", $($arg)*);
    };
}

/// Emit a lazy buffer trace.
///
/// # Example
/// ```ignore
/// trace_lazy!(buffered = 12, "source exhausted");
/// ```
#[macro_export]
macro_rules! trace_lazy {
    ($($arg:tt)*) => {
        ::tracing::trace!(target: "preiter::lazy", $($arg)*);
    };
}

/// Emit a registry trace.
///
/// # Example
/// ```ignore
/// trace_registry!(sequence = %token, "sequence registered");
/// ```
#[macro_export]
macro_rules! trace_registry {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "preiter::registry", $($arg)*);
    };
}

/// Emit a filesystem trace.
///
/// # Example
/// ```ignore
/// trace_fs!(path = %path.display(), "skipping special file");
/// ```
#[macro_export]
macro_rules! trace_fs {
    ($($arg:tt)*) => {
        ::tracing::debug!(target: "walk::fs", $($arg)*);
    };
}
