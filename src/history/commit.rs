//! Commit records and materialized commits.
//!
//! A commit exists in two forms. The [`CommitRecord`] is the stored,
//! hashed content: parent id, ordered change-id log, and message, nothing
//! else, so identical histories on different machines produce identical
//! ids. The [`Commit`] is the hydrated form a caller works with: the
//! record plus the schema obtained by replaying every changelog from the
//! root.

use serde::{Deserialize, Serialize};

use crate::schema::Schema;

use super::hash::content_hash;
use super::types::{ChangeId, CommitId};

/// The stored, content-hashed form of a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Parent commit id; absent only for the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<CommitId>,
    /// Ordered log of content-addressed changes.
    pub changelog: Vec<ChangeId>,
    /// Commit message.
    pub msg: String,
}

impl CommitRecord {
    /// The distinguished root record: no parent, empty changelog.
    pub fn root() -> Self {
        Self {
            parent: None,
            changelog: Vec::new(),
            msg: "root".to_string(),
        }
    }

    /// Derive this record's content-addressed id.
    ///
    /// Note the root commit is never addressed by its hash; it always goes
    /// by the literal id `"root"`.
    pub fn content_id(&self) -> Result<CommitId, serde_json::Error> {
        content_hash(self).map(CommitId::new)
    }
}

/// An immutable, materialized commit: its record plus the schema reached
/// by replaying history up to and including it.
#[derive(Debug, Clone)]
pub struct Commit {
    id: CommitId,
    parent: Option<CommitId>,
    changelog: Vec<ChangeId>,
    msg: String,
    schema: Schema,
}

impl Commit {
    pub(crate) fn new(id: CommitId, record: &CommitRecord, schema: Schema) -> Self {
        Self {
            id,
            parent: record.parent.clone(),
            changelog: record.changelog.clone(),
            msg: record.msg.clone(),
            schema,
        }
    }

    /// This commit's id.
    pub fn id(&self) -> &CommitId {
        &self.id
    }

    /// Parent commit id, if any.
    pub fn parent(&self) -> Option<&CommitId> {
        self.parent.as_ref()
    }

    /// The ordered change-id log belonging to this commit alone.
    pub fn changelog(&self) -> &[ChangeId] {
        &self.changelog
    }

    /// Commit message.
    pub fn msg(&self) -> &str {
        &self.msg
    }

    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.msg.lines().next().unwrap_or(&self.msg)
    }

    /// The schema as of this commit.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Check whether this is the root commit.
    pub fn is_root(&self) -> bool {
        self.id.is_root()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_record_shape() {
        let root = CommitRecord::root();
        assert_eq!(root.parent, None);
        assert!(root.changelog.is_empty());
        assert_eq!(root.msg, "root");
    }

    #[test]
    fn test_record_hash_is_stable() {
        let record = CommitRecord {
            parent: Some(CommitId::root()),
            changelog: vec![ChangeId::new("abc")],
            msg: "create person".to_string(),
        };
        assert_eq!(record.content_id().unwrap(), record.content_id().unwrap());
    }

    #[test]
    fn test_record_hash_covers_every_field() {
        let base = CommitRecord {
            parent: Some(CommitId::root()),
            changelog: vec![ChangeId::new("abc")],
            msg: "m".to_string(),
        };

        let mut other_msg = base.clone();
        other_msg.msg = "n".to_string();
        assert_ne!(base.content_id().unwrap(), other_msg.content_id().unwrap());

        let mut other_parent = base.clone();
        other_parent.parent = Some(CommitId::new("deadbeef"));
        assert_ne!(
            base.content_id().unwrap(),
            other_parent.content_id().unwrap()
        );

        let mut other_log = base.clone();
        other_log.changelog.push(ChangeId::new("def"));
        assert_ne!(base.content_id().unwrap(), other_log.content_id().unwrap());
    }

    #[test]
    fn test_parent_key_absent_when_missing() {
        let json = serde_json::to_value(CommitRecord::root()).unwrap();
        assert!(json.get("parent").is_none());
    }

    #[test]
    fn test_commit_summary() {
        let record = CommitRecord {
            parent: Some(CommitId::root()),
            changelog: Vec::new(),
            msg: "first line\nsecond line".to_string(),
        };
        let commit = Commit::new(CommitId::new("x"), &record, Schema::new());
        assert_eq!(commit.summary(), "first line");
        assert!(!commit.is_root());
    }
}
