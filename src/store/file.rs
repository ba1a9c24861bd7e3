//! On-disk repository persistence.
//!
//! A repository directory holds two JSON files:
//!
//! - `evodb.json`: the repository marker and its durable state: config,
//!   commit records, branch pointers, and content-addressed change bodies.
//! - `changes.json`: the staging area: an ordered list of change bodies
//!   waiting to be verified and committed.
//!
//! The layout round-trips a [`Repository`] exactly; the root commit is
//! implicit and re-inserted on load.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::history::{ChangeId, CommitId, CommitRecord};
use crate::repo::Repository;
use crate::schema::Change;

/// The repository marker file.
pub const REPO_FILE: &str = "evodb.json";

/// The staged-changes file.
pub const CHANGES_FILE: &str = "changes.json";

/// Persistence-layer failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Initializing a directory that already holds a repository marker.
    #[error("repository already exists at {0}")]
    AlreadyExists(PathBuf),

    /// Opening a directory with no repository marker.
    #[error("no repository found at {0}")]
    NotARepository(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// On-disk shape of `evodb.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RepoFile {
    #[serde(default)]
    config: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    commits: BTreeMap<CommitId, CommitRecord>,
    #[serde(default)]
    changes: BTreeMap<ChangeId, Change>,
    #[serde(default)]
    branches: BTreeMap<String, CommitId>,
}

/// On-disk shape of `changes.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ChangesFile {
    #[serde(default)]
    changes: Vec<Change>,
}

/// Handle on a repository directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Initialize a fresh repository directory.
    ///
    /// Creates the directory if needed, then writes an empty marker file
    /// and an empty staging file. Fails with [`StoreError::AlreadyExists`]
    /// when a marker is already present.
    pub fn init(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self { root: root.into() };
        if store.is_repository() {
            return Err(StoreError::AlreadyExists(store.root));
        }

        if !store.root.exists() {
            fs::create_dir_all(&store.root)?;
        }

        store.write_json(REPO_FILE, &RepoFile::default())?;
        store.write_json(CHANGES_FILE, &ChangesFile::default())?;
        Ok(store)
    }

    /// Open an existing repository directory.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self { root: root.into() };
        if !store.is_repository() {
            return Err(StoreError::NotARepository(store.root));
        }
        Ok(store)
    }

    /// The repository directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check whether the directory holds a repository marker.
    pub fn is_repository(&self) -> bool {
        self.root.join(REPO_FILE).exists()
    }

    /// Load the repository state from disk.
    pub fn load(&self) -> StoreResult<Repository> {
        let file: RepoFile = self.read_json(REPO_FILE)?;
        Ok(Repository::from_parts(
            file.commits,
            file.branches,
            file.changes,
        ))
    }

    /// Write the repository state back to disk.
    pub fn save(&self, repo: &Repository) -> StoreResult<()> {
        let file = RepoFile {
            config: BTreeMap::new(),
            commits: repo.commits().clone(),
            changes: repo.changes().clone(),
            branches: repo.branches().clone(),
        };
        self.write_json(REPO_FILE, &file)
    }

    /// Read the staged changes awaiting commit.
    pub fn staged_changes(&self) -> StoreResult<Vec<Change>> {
        let file: ChangesFile = self.read_json(CHANGES_FILE)?;
        Ok(file.changes)
    }

    /// Replace the staged changes.
    pub fn write_staged_changes(&self, changes: &[Change]) -> StoreResult<()> {
        self.write_json(
            CHANGES_FILE,
            &ChangesFile {
                changes: changes.to_vec(),
            },
        )
    }

    /// Empty the staging file (after a successful commit).
    pub fn clear_staged_changes(&self) -> StoreResult<()> {
        self.write_json(CHANGES_FILE, &ChangesFile::default())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, name: &str) -> StoreResult<T> {
        let bytes = fs::read(self.root.join(name))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(value)?;
        fs::write(self.root.join(name), json)?;
        Ok(())
    }
}
