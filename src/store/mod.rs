//! Durable persistence for repository state.
//!
//! The engine does not impose a physical storage format; this module is
//! the conforming adapter for a JSON directory layout, able to round-trip
//! commits, branch pointers, and change bodies, plus the staging file the
//! CLI commits from.

mod file;

pub use file::{FileStore, StoreError, StoreResult, CHANGES_FILE, REPO_FILE};
