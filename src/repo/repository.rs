//! The top-level repository store.
//!
//! A repository is three maps and a cache:
//!
//! - an arena of immutable commit records keyed by content-derived id,
//! - branch pointers (name -> commit id), the only mutable references,
//! - a content-addressed store of recorded change bodies,
//! - a memoization cache of materialized commits, safe to share because
//!   commits never change after creation.
//!
//! Commits and changes grow monotonically; nothing is ever deleted or
//! rewritten, only branch pointers move. All history walks (ancestors,
//! common parent, rollback/rollforward/migrate) live here because parent
//! links are ids into the arena, not live references.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::history::{ChangeId, Commit, CommitId, CommitRecord};
use crate::schema::{Change, Schema};

use super::branch::Branch;
use super::error::{RepoError, RepoResult};

/// The top-level store: commit arena, branch pointers, change bodies.
pub struct Repository {
    commits: BTreeMap<CommitId, CommitRecord>,
    branches: BTreeMap<String, CommitId>,
    changes: BTreeMap<ChangeId, Change>,
    checkouts: RwLock<BTreeMap<CommitId, Arc<Commit>>>,
}

impl Repository {
    /// Create a repository holding only the root commit and no branches.
    pub fn new() -> Self {
        Self::from_parts(BTreeMap::new(), BTreeMap::new(), BTreeMap::new())
    }

    /// Rebuild a repository from persisted maps.
    ///
    /// The root commit is implicit: it is inserted if the persisted arena
    /// does not carry it.
    pub fn from_parts(
        mut commits: BTreeMap<CommitId, CommitRecord>,
        branches: BTreeMap<String, CommitId>,
        changes: BTreeMap<ChangeId, Change>,
    ) -> Self {
        commits
            .entry(CommitId::root())
            .or_insert_with(CommitRecord::root);
        Self {
            commits,
            branches,
            changes,
            checkouts: RwLock::new(BTreeMap::new()),
        }
    }

    // ==================== Branches ====================

    /// Create a branch and return a cursor on it.
    ///
    /// With a parent branch, the new pointer copies the parent's current
    /// commit id; without one it points at the root.
    pub fn branch(&mut self, name: &str, parent_branch: Option<&str>) -> RepoResult<Branch> {
        if self.branches.contains_key(name) {
            return Err(RepoError::BranchAlreadyExists(name.to_string()));
        }

        let target = match parent_branch {
            Some(parent) => self
                .branches
                .get(parent)
                .cloned()
                .ok_or_else(|| RepoError::BranchNotFound(parent.to_string()))?,
            None => CommitId::root(),
        };

        self.branches.insert(name.to_string(), target);
        self.checkout(name)
    }

    /// Resolve a branch name and return a fresh cursor with an empty
    /// pending changelog.
    pub fn checkout(&self, name: &str) -> RepoResult<Branch> {
        let commit_id = self
            .branches
            .get(name)
            .ok_or_else(|| RepoError::BranchNotFound(name.to_string()))?;
        let commit = self.checkout_commit(commit_id)?;
        Ok(Branch::new(name, commit))
    }

    /// Check whether a branch exists.
    pub fn branch_exists(&self, name: &str) -> bool {
        self.branches.contains_key(name)
    }

    /// Resolve a branch name to its current commit id.
    pub fn resolve_branch(&self, name: &str) -> RepoResult<&CommitId> {
        self.branches
            .get(name)
            .ok_or_else(|| RepoError::BranchNotFound(name.to_string()))
    }

    /// Branch pointers: name -> commit id.
    pub fn branches(&self) -> &BTreeMap<String, CommitId> {
        &self.branches
    }

    // ==================== Commits ====================

    /// Materialize the commit with the given id, replaying changelogs from
    /// the nearest already-materialized ancestor (or the root).
    ///
    /// Results are memoized per id; commits are immutable, so a cached
    /// checkout is always current and resolving the same id twice yields
    /// the same `Arc`.
    pub fn checkout_commit(&self, id: &CommitId) -> RepoResult<Arc<Commit>> {
        if let Some(commit) = self.checkouts.read().get(id) {
            return Ok(commit.clone());
        }

        // Walk rootward until a cached ancestor (or the root) is found.
        let mut chain: Vec<(CommitId, &CommitRecord)> = Vec::new();
        let mut base: Option<Arc<Commit>> = None;
        let mut cursor = id.clone();
        loop {
            if let Some(commit) = self.checkouts.read().get(&cursor) {
                base = Some(commit.clone());
                break;
            }
            let record = self
                .commits
                .get(&cursor)
                .ok_or_else(|| RepoError::CommitNotFound(cursor.to_string()))?;
            chain.push((cursor.clone(), record));
            match &record.parent {
                Some(parent) => cursor = parent.clone(),
                None => break,
            }
        }

        // Replay forward, memoizing every commit on the way down.
        let mut schema = base
            .as_ref()
            .map(|commit| commit.schema().clone())
            .unwrap_or_default();
        let mut materialized = base;
        for (commit_id, record) in chain.into_iter().rev() {
            for change_id in &record.changelog {
                let change = self
                    .changes
                    .get(change_id)
                    .ok_or_else(|| RepoError::ChangeNotFound(change_id.clone()))?;
                schema.apply(change.clone())?;
            }
            let commit = Arc::new(Commit::new(commit_id.clone(), record, schema.clone()));
            self.checkouts.write().insert(commit_id, commit.clone());
            materialized = Some(commit);
        }

        materialized.ok_or_else(|| RepoError::CommitNotFound(id.to_string()))
    }

    /// Check whether a commit id is present in the store.
    pub fn contains_commit(&self, id: &CommitId) -> bool {
        self.commits.contains_key(id)
    }

    /// Look up a stored commit record.
    pub fn record(&self, id: &CommitId) -> RepoResult<&CommitRecord> {
        self.commits
            .get(id)
            .ok_or_else(|| RepoError::CommitNotFound(id.to_string()))
    }

    /// Look up a stored change body.
    pub fn change(&self, id: &ChangeId) -> RepoResult<&Change> {
        self.changes
            .get(id)
            .ok_or_else(|| RepoError::ChangeNotFound(id.clone()))
    }

    /// The commit arena: id -> stored record.
    pub fn commits(&self) -> &BTreeMap<CommitId, CommitRecord> {
        &self.commits
    }

    /// The content-addressed change store: id -> change body.
    pub fn changes(&self) -> &BTreeMap<ChangeId, Change> {
        &self.changes
    }

    /// Insert a frozen commit, its change bodies, and move the branch
    /// pointer. Called by [`Branch::commit`] once everything is validated.
    pub(crate) fn record_commit(
        &mut self,
        branch_name: &str,
        commit_id: CommitId,
        record: CommitRecord,
        changes: Vec<(ChangeId, Change)>,
        schema: Schema,
    ) -> Arc<Commit> {
        for (change_id, change) in changes {
            self.changes.insert(change_id, change);
        }

        let commit = Arc::new(Commit::new(commit_id.clone(), &record, schema));
        self.commits.insert(commit_id.clone(), record);
        self.branches.insert(branch_name.to_string(), commit_id);
        self.checkouts
            .write()
            .insert(commit.id().clone(), commit.clone());
        commit
    }

    // ==================== Batch operations ====================

    /// Validate an ordered batch of changes against a branch without
    /// committing anything.
    ///
    /// Changes are checked sequentially, each against the schema produced
    /// by its predecessors, exactly as a commit would apply them.
    pub fn verify(&self, branch_name: &str, changes: &[Change]) -> RepoResult<()> {
        let branch = self.checkout(branch_name)?;
        let mut schema = branch.schema().clone();
        for change in changes {
            schema.apply(change.clone())?;
        }
        Ok(())
    }

    /// All-or-nothing batch commit: validate every change up front, then
    /// freeze them into a single new commit on the branch.
    ///
    /// A failing change aborts the whole batch before any commit record or
    /// change body is stored.
    pub fn commit(
        &mut self,
        branch_name: &str,
        changes: Vec<Change>,
        msg: impl Into<String>,
    ) -> RepoResult<CommitId> {
        let mut branch = self.checkout(branch_name)?;
        for change in changes {
            branch.add(change)?;
        }
        branch.commit(self, msg)
    }

    // ==================== History walks ====================

    /// Ancestor chain of a commit, oldest first, ending with the commit
    /// itself. The root's chain is `["root"]`.
    pub fn ancestors(&self, id: &CommitId) -> RepoResult<Vec<CommitId>> {
        let mut chain = Vec::new();
        let mut cursor = id.clone();
        loop {
            let record = self
                .commits
                .get(&cursor)
                .ok_or_else(|| RepoError::CommitNotFound(cursor.to_string()))?;
            chain.push(cursor);
            match &record.parent {
                Some(parent) => cursor = parent.clone(),
                None => break,
            }
        }
        chain.reverse();
        Ok(chain)
    }

    /// Find the most recent commit present in both commits' root-to-self
    /// ancestor chains.
    ///
    /// Walks both chains from the root in lockstep; the last id on which
    /// they agree is the common ancestor. With a single root the chains
    /// always share at least `"root"`, so `NoCommonParent` signals a
    /// corrupt store rather than a normal outcome.
    pub fn find_common_parent(&self, one: &CommitId, two: &CommitId) -> RepoResult<CommitId> {
        let chain_one = self.ancestors(one)?;
        let chain_two = self.ancestors(two)?;

        let mut common = None;
        for (a, b) in chain_one.iter().zip(chain_two.iter()) {
            if a != b {
                break;
            }
            common = Some(a.clone());
        }

        common.ok_or_else(|| RepoError::NoCommonParent {
            one: one.clone(),
            two: two.clone(),
        })
    }

    /// Derive the change sequence that rolls a database back from `source`
    /// to `target`, which must be a strict ancestor of `source`.
    ///
    /// Each commit's changelog is reversed change-by-change in reverse
    /// order, newest commit first.
    pub fn rollback(&self, source: &CommitId, target: &CommitId) -> RepoResult<Vec<Change>> {
        if source == target {
            return Err(RepoError::InvalidChange(format!(
                "cannot roll back {} onto itself",
                source
            )));
        }
        self.collect_rollback(source, target)
    }

    /// Derive the forward change sequence from just after `source` up to
    /// and including `target`; `source` must be a strict ancestor of
    /// `target`.
    pub fn rollforward(&self, source: &CommitId, target: &CommitId) -> RepoResult<Vec<Change>> {
        if source == target {
            return Err(RepoError::InvalidChange(format!(
                "cannot roll forward {} onto itself",
                source
            )));
        }
        self.collect_rollforward(source, target)
    }

    /// Derive the migration plan from one commit to another: roll back to
    /// their common ancestor, then roll forward to the destination.
    ///
    /// When the common ancestor coincides with an endpoint, that half of
    /// the plan is empty (a pure rollback or a fast-forward).
    pub fn migrate(&self, from: &CommitId, to: &CommitId) -> RepoResult<Vec<Change>> {
        if from == to {
            return Err(RepoError::InvalidChange(format!(
                "cannot migrate {} onto itself",
                from
            )));
        }

        let parent = self.find_common_parent(from, to)?;

        let mut plan = if &parent == from {
            Vec::new()
        } else {
            self.collect_rollback(from, &parent)?
        };
        if &parent != to {
            plan.extend(self.collect_rollforward(&parent, to)?);
        }
        Ok(plan)
    }

    fn collect_rollback(&self, source: &CommitId, target: &CommitId) -> RepoResult<Vec<Change>> {
        let mut plan = Vec::new();
        let mut cursor = source.clone();
        while &cursor != target {
            let record = self
                .commits
                .get(&cursor)
                .ok_or_else(|| RepoError::CommitNotFound(cursor.to_string()))?;

            for change_id in record.changelog.iter().rev() {
                let change = self.change(change_id)?;
                plan.push(change.reverse()?);
            }

            // walking past the root means target was never an ancestor
            cursor = record
                .parent
                .clone()
                .ok_or_else(|| RepoError::CommitNotFound(target.to_string()))?;
        }
        Ok(plan)
    }

    fn collect_rollforward(&self, source: &CommitId, target: &CommitId) -> RepoResult<Vec<Change>> {
        // collect the records from target back to (but excluding) source
        let mut records = Vec::new();
        let mut cursor = target.clone();
        while &cursor != source {
            let record = self
                .commits
                .get(&cursor)
                .ok_or_else(|| RepoError::CommitNotFound(cursor.to_string()))?;
            records.push(record);
            cursor = record
                .parent
                .clone()
                .ok_or_else(|| RepoError::CommitNotFound(source.to_string()))?;
        }

        // then emit their changelogs oldest commit first
        let mut plan = Vec::new();
        for record in records.into_iter().rev() {
            for change_id in &record.changelog {
                plan.push(self.change(change_id)?.clone());
            }
        }
        Ok(plan)
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}
