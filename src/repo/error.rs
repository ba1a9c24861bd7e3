//! Repository-level error types.
//!
//! Everything here is a local, expected, recoverable failure: it is
//! returned to the immediate caller and never retried internally. Batch
//! operations validate every change before mutating anything, so a single
//! invalid change aborts the whole batch with nothing partially applied.

use thiserror::Error;

use crate::history::{ChangeId, CommitId};
use crate::schema::SchemaError;

/// The main error type for repository operations.
#[derive(Debug, Error)]
pub enum RepoError {
    /// Checkout or branch-from-parent referenced an unknown branch name.
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    /// Creating a branch whose name is already registered.
    #[error("branch already exists: {0}")]
    BranchAlreadyExists(String),

    /// A commit id absent from the store, or an ancestor-chain search that
    /// never reached the requested target.
    #[error("commit not found: {0}")]
    CommitNotFound(String),

    /// A changelog referenced a change body missing from the store.
    #[error("change not found in store: {0}")]
    ChangeNotFound(ChangeId),

    /// A change failed verification, or a rollback/rollforward was asked
    /// to operate between a commit and itself.
    #[error("invalid change: {0}")]
    InvalidChange(String),

    /// Two commits' ancestor chains share no prefix. Unreachable in a
    /// single-root repository unless the store is corrupt.
    #[error("no common parent between {one} and {two}")]
    NoCommonParent { one: CommitId, two: CommitId },

    /// JSON serialization failed while deriving a content id.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<SchemaError> for RepoError {
    fn from(err: SchemaError) -> Self {
        RepoError::InvalidChange(err.to_string())
    }
}

impl RepoError {
    /// Check if this error indicates the referenced thing doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RepoError::BranchNotFound(_)
                | RepoError::CommitNotFound(_)
                | RepoError::ChangeNotFound(_)
        )
    }
}

/// Result type alias for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;
