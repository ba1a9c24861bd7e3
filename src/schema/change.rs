//! Structural change descriptions and their inverses.
//!
//! A [`Change`] is a data-only delta against a schema: create or drop a
//! table, or alter one table's columns. Every kind has a well-defined
//! inverse; destructive kinds carry a snapshot of what they destroyed so
//! the inverse can be derived mechanically.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::SchemaError;
use super::types::{Property, TableSchema};

/// The six change kinds, by wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Drop,
    AlterAdd,
    AlterRename,
    AlterModify,
    AlterDrop,
}

impl ChangeKind {
    /// Get the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Create => "create",
            ChangeKind::Drop => "drop",
            ChangeKind::AlterAdd => "alter.add",
            ChangeKind::AlterRename => "alter.rename",
            ChangeKind::AlterModify => "alter.modify",
            ChangeKind::AlterDrop => "alter.drop",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single structural delta against a schema.
///
/// The `old_schema` / `old_columns` fields are reversal bookkeeping: they
/// are attached by [`Schema::apply`](super::Schema::apply) when a change
/// destroys information, and callers never populate them by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change")]
pub enum Change {
    /// Create a table with the given shape.
    #[serde(rename = "create")]
    Create { schema: TableSchema },

    /// Drop a table.
    #[serde(rename = "drop")]
    Drop {
        schema: TableSchema,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_schema: Option<TableSchema>,
    },

    /// Add columns to an existing table.
    #[serde(rename = "alter.add")]
    AddColumns {
        table: String,
        columns: BTreeMap<String, Property>,
    },

    /// Rename columns: old name -> new name.
    #[serde(rename = "alter.rename")]
    RenameColumns {
        table: String,
        renames: BTreeMap<String, String>,
    },

    /// Replace the descriptors of existing columns.
    #[serde(rename = "alter.modify")]
    ModifyColumns {
        table: String,
        columns: BTreeMap<String, Property>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_columns: Option<BTreeMap<String, Property>>,
    },

    /// Remove columns from an existing table.
    #[serde(rename = "alter.drop")]
    DropColumns {
        table: String,
        columns: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_columns: Option<BTreeMap<String, Property>>,
    },
}

impl Change {
    /// The kind of this change.
    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::Create { .. } => ChangeKind::Create,
            Change::Drop { .. } => ChangeKind::Drop,
            Change::AddColumns { .. } => ChangeKind::AlterAdd,
            Change::RenameColumns { .. } => ChangeKind::AlterRename,
            Change::ModifyColumns { .. } => ChangeKind::AlterModify,
            Change::DropColumns { .. } => ChangeKind::AlterDrop,
        }
    }

    /// The table this change touches.
    pub fn table(&self) -> &str {
        match self {
            Change::Create { schema } | Change::Drop { schema, .. } => &schema.id,
            Change::AddColumns { table, .. }
            | Change::RenameColumns { table, .. }
            | Change::ModifyColumns { table, .. }
            | Change::DropColumns { table, .. } => table,
        }
    }

    /// Derive the inverse of this change.
    ///
    /// Reversing a recorded change and reversing the result again yields the
    /// original, except that a reversed `create`/`drop` carries no snapshot
    /// (it is freshly derivable on the next apply).
    ///
    /// Destructive kinds (`alter.modify`, `alter.drop`) can only be reversed
    /// after they have been applied, since the inverse needs the recorded
    /// snapshot of what was overwritten or removed.
    pub fn reverse(&self) -> Result<Change, SchemaError> {
        match self {
            Change::Create { schema } => Ok(Change::Drop {
                schema: schema.clone(),
                old_schema: None,
            }),

            Change::Drop { schema, old_schema } => Ok(Change::Create {
                schema: old_schema.clone().unwrap_or_else(|| schema.clone()),
            }),

            Change::AddColumns { table, columns } => Ok(Change::DropColumns {
                table: table.clone(),
                columns: columns.keys().cloned().collect(),
                old_columns: Some(columns.clone()),
            }),

            Change::RenameColumns { table, renames } => Ok(Change::RenameColumns {
                table: table.clone(),
                renames: renames
                    .iter()
                    .map(|(old, new)| (new.clone(), old.clone()))
                    .collect(),
            }),

            Change::ModifyColumns {
                table,
                columns,
                old_columns,
            } => {
                let old = old_columns.as_ref().ok_or_else(|| SchemaError::NotReversible {
                    kind: ChangeKind::AlterModify,
                    table: table.clone(),
                })?;
                Ok(Change::ModifyColumns {
                    table: table.clone(),
                    columns: old.clone(),
                    old_columns: Some(columns.clone()),
                })
            }

            Change::DropColumns {
                table, old_columns, ..
            } => {
                let old = old_columns.as_ref().ok_or_else(|| SchemaError::NotReversible {
                    kind: ChangeKind::AlterDrop,
                    table: table.clone(),
                })?;
                Ok(Change::AddColumns {
                    table: table.clone(),
                    columns: old.clone(),
                })
            }
        }
    }
}
