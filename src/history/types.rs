//! Type-safe wrappers around content-derived identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A commit identifier.
///
/// Either the distinguished `"root"` id or a lowercase hex content hash.
/// The wrapper keeps commit ids from being confused with change ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// The distinguished root commit id.
    pub const ROOT: &'static str = "root";

    /// Wrap an id (a content hash, or an id parsed from user input).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The root commit id.
    pub fn root() -> Self {
        Self(Self::ROOT.to_string())
    }

    /// Check whether this is the root id.
    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for display (first 7 characters).
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(7)]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A content-addressed change identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(String);

impl ChangeId {
    /// Wrap an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form for display (first 7 characters).
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(7)]
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_id() {
        let root = CommitId::root();
        assert!(root.is_root());
        assert_eq!(root.as_str(), "root");
        assert_eq!(root.short(), "root");
    }

    #[test]
    fn test_short_truncates_long_ids() {
        let id = CommitId::new("0123456789abcdef");
        assert!(!id.is_root());
        assert_eq!(id.short(), "0123456");
    }

    #[test]
    fn test_ids_serialize_as_bare_strings() {
        let id = ChangeId::new("abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
        let back: ChangeId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(back, id);
    }
}
