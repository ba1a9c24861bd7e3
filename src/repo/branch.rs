//! Branch cursors.
//!
//! A branch is not stored history: it is a named, mutable cursor holding
//! the commit it currently points at, a working copy of that commit's
//! schema, and the changes accepted but not yet committed. The only way
//! pending state becomes durable is [`Branch::commit`].

use std::sync::Arc;

use crate::history::{content_hash, ChangeId, Commit, CommitId, CommitRecord};
use crate::schema::{Change, Schema, SchemaError};

use super::error::RepoResult;
use super::repository::Repository;

/// A named cursor into the commit graph, with uncommitted working state.
#[derive(Debug)]
pub struct Branch {
    name: String,
    parent: Arc<Commit>,
    schema: Schema,
    pending: Vec<Change>,
}

impl Branch {
    pub(crate) fn new(name: impl Into<String>, parent: Arc<Commit>) -> Self {
        let schema = parent.schema().clone();
        Self {
            name: name.into(),
            parent,
            schema,
            pending: Vec::new(),
        }
    }

    /// The branch name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The commit this branch currently points at.
    pub fn parent(&self) -> &Arc<Commit> {
        &self.parent
    }

    /// The working schema, including every pending change.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Changes accepted but not yet committed, in recorded form.
    pub fn pending(&self) -> &[Change] {
        &self.pending
    }

    /// Check a change against the working schema without applying it.
    pub fn verify(&self, change: &Change) -> Result<(), SchemaError> {
        self.schema.verify(change)
    }

    /// Verify a change, apply it to the working schema, and queue its
    /// recorded form for the next commit.
    ///
    /// Verification and application are atomic per change: a rejected
    /// change leaves both the working schema and the pending log untouched.
    pub fn add(&mut self, change: Change) -> RepoResult<()> {
        let recorded = self.schema.apply(change)?;
        self.pending.push(recorded);
        Ok(())
    }

    /// Freeze the pending changelog into a new immutable commit.
    ///
    /// Each pending change is stored under its content hash, the commit
    /// record is hashed into its id, the branch pointer advances, and the
    /// cursor resets to a clean state on top of the new commit.
    pub fn commit(&mut self, repo: &mut Repository, msg: impl Into<String>) -> RepoResult<CommitId> {
        let mut changelog = Vec::with_capacity(self.pending.len());
        for change in &self.pending {
            changelog.push(ChangeId::new(content_hash(change)?));
        }

        let record = CommitRecord {
            parent: Some(self.parent.id().clone()),
            changelog: changelog.clone(),
            msg: msg.into(),
        };
        let commit_id = record.content_id()?;

        let bodies = changelog
            .into_iter()
            .zip(std::mem::take(&mut self.pending))
            .collect();
        let commit = repo.record_commit(
            &self.name,
            commit_id.clone(),
            record,
            bodies,
            self.schema.clone(),
        );

        self.parent = commit;
        self.schema = self.parent.schema().clone();
        Ok(commit_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Property, TableSchema};

    fn create_person() -> Change {
        Change::Create {
            schema: TableSchema::new("person")
                .with_property("id", Property::string().with_identity()),
        }
    }

    fn setup() -> (Repository, Branch) {
        let mut repo = Repository::new();
        let branch = repo.branch("master", None).unwrap();
        (repo, branch)
    }

    #[test]
    fn test_new_branch_points_at_root() {
        let (_repo, branch) = setup();
        assert_eq!(branch.name(), "master");
        assert!(branch.parent().is_root());
        assert!(branch.schema().is_empty());
        assert!(branch.pending().is_empty());
    }

    #[test]
    fn test_add_updates_working_schema_and_queue() {
        let (_repo, mut branch) = setup();
        branch.add(create_person()).unwrap();

        assert!(branch.schema().contains_table("person"));
        assert_eq!(branch.pending().len(), 1);
    }

    #[test]
    fn test_add_invalid_change_is_rejected_atomically() {
        let (_repo, mut branch) = setup();
        branch.add(create_person()).unwrap();

        let err = branch.add(create_person()).unwrap_err();
        assert!(matches!(err, crate::repo::RepoError::InvalidChange(_)));
        assert_eq!(branch.pending().len(), 1);
    }

    #[test]
    fn test_commit_advances_pointer_and_resets() {
        let (mut repo, mut branch) = setup();
        branch.add(create_person()).unwrap();

        let commit_id = branch.commit(&mut repo, "create person").unwrap();

        assert!(!commit_id.is_root());
        assert_eq!(branch.parent().id(), &commit_id);
        assert!(branch.pending().is_empty());
        assert!(branch.schema().contains_table("person"));

        // the repository now resolves the branch to the new commit
        let checked_out = repo.checkout("master").unwrap();
        assert_eq!(checked_out.parent().id(), &commit_id);
        assert_eq!(checked_out.parent().msg(), "create person");
    }

    #[test]
    fn test_commit_stores_recorded_changes_content_addressed() {
        let (mut repo, mut branch) = setup();
        branch.add(create_person()).unwrap();
        let commit_id = branch.commit(&mut repo, "create person").unwrap();

        let commit = repo.checkout_commit(&commit_id).unwrap();
        assert_eq!(commit.changelog().len(), 1);

        let change = repo.change(&commit.changelog()[0]).unwrap();
        assert_eq!(change, &create_person());
    }

    #[test]
    fn test_identical_histories_yield_identical_ids() {
        fn build() -> CommitId {
            let mut repo = Repository::new();
            let mut branch = repo.branch("master", None).unwrap();
            branch.add(create_person()).unwrap();
            branch.commit(&mut repo, "create person").unwrap()
        }

        assert_eq!(build(), build());
    }

    #[test]
    fn test_empty_commit_is_allowed() {
        let (mut repo, mut branch) = setup();
        let commit_id = branch.commit(&mut repo, "checkpoint").unwrap();
        let commit = repo.checkout_commit(&commit_id).unwrap();
        assert!(commit.changelog().is_empty());
        assert_eq!(commit.parent(), Some(&CommitId::root()));
    }
}
