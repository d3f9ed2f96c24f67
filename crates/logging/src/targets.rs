//! crates/logging/src/targets.rs
//! Tracing target names used across the workspace.

/// Cursor positioning and stepping.
pub const CURSOR: &str = "preiter::cursor";
/// Flattening stacks entering and leaving nested sequences.
pub const STACK: &str = "preiter::stack";
/// Recursor caches and loaders.
pub const CACHE: &str = "preiter::cache";
/// Lazy buffers pulling from their sources.
pub const LAZY: &str = "preiter::lazy";
/// Sequence registry traffic.
pub const REGISTRY: &str = "preiter::registry";
/// Filesystem producer.
pub const FS: &str = "walk::fs";
