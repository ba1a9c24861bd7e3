//! Repository and branch layer.
//!
//! This is the engine's public surface for history manipulation:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       Repository                         │
//! │   commit arena · branch pointers · change store · memo   │
//! └──────────────────────────────────────────────────────────┘
//!        │ branch()/checkout()                 ▲ commit()
//!        ▼                                     │
//! ┌──────────────────────────────────────────────────────────┐
//! │                         Branch                           │
//! │     cursor: parent commit + working schema + pending     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! A caller opens a [`Branch`] from the [`Repository`], submits changes to
//! it (each validated against the working schema), then commits, which
//! freezes the pending log into an immutable commit and advances the
//! branch pointer. The repository can then derive migration plans between
//! any two commits in the graph.

mod branch;
mod error;
mod repository;

pub use branch::Branch;
pub use error::{RepoError, RepoResult};
pub use repository::Repository;
