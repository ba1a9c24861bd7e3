//! The mutable working schema.
//!
//! A [`Schema`] is the materialized "what the schema looks like right now"
//! model kept by a branch (or reconstructed for a commit by replaying its
//! history). It is only ever mutated through [`Schema::apply`], which
//! checks the change's preconditions first and attaches the reversal
//! snapshots a destructive change needs.

use std::collections::{BTreeMap, BTreeSet};

use super::change::{Change, ChangeKind};
use super::types::TableSchema;

/// Precondition or reversibility failures for a single change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("table already exists: {0}")]
    TableExists(String),

    #[error("table not found: {0}")]
    TableNotFound(String),

    #[error("column already exists: {table}.{column}")]
    ColumnExists { table: String, column: String },

    #[error("column not found: {table}.{column}")]
    ColumnNotFound { table: String, column: String },

    #[error("two renames target the same column: {table}.{column}")]
    DuplicateRenameTarget { table: String, column: String },

    #[error("cannot reverse an unapplied {kind} change on {table}: no snapshot recorded")]
    NotReversible { kind: ChangeKind, table: String },
}

/// The working table-shape model: table id -> table schema.
///
/// Invariant: table ids are unique, and a table stays addressable from
/// `create` until `drop`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    tables: BTreeMap<String, TableSchema>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a table by id.
    pub fn table(&self, id: &str) -> Option<&TableSchema> {
        self.tables.get(id)
    }

    /// Check whether a table exists.
    pub fn contains_table(&self, id: &str) -> bool {
        self.tables.contains_key(id)
    }

    /// All tables, sorted by id.
    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// True when no tables exist.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Check a change's preconditions against the current state.
    ///
    /// Pure: never mutates. A change that verifies is guaranteed to apply.
    pub fn verify(&self, change: &Change) -> Result<(), SchemaError> {
        match change {
            Change::Create { schema } => {
                if self.tables.contains_key(&schema.id) {
                    return Err(SchemaError::TableExists(schema.id.clone()));
                }
                Ok(())
            }

            Change::Drop { schema, .. } => {
                self.existing_table(&schema.id)?;
                Ok(())
            }

            Change::AddColumns { table, columns } => {
                let existing = self.existing_table(table)?;
                for name in columns.keys() {
                    if existing.has_property(name) {
                        return Err(SchemaError::ColumnExists {
                            table: table.clone(),
                            column: name.clone(),
                        });
                    }
                }
                Ok(())
            }

            Change::RenameColumns { table, renames } => {
                let existing = self.existing_table(table)?;
                let mut targets = BTreeSet::new();
                for (old, new) in renames {
                    if !existing.has_property(old) {
                        return Err(SchemaError::ColumnNotFound {
                            table: table.clone(),
                            column: old.clone(),
                        });
                    }
                    if existing.has_property(new) {
                        return Err(SchemaError::ColumnExists {
                            table: table.clone(),
                            column: new.clone(),
                        });
                    }
                    if !targets.insert(new.as_str()) {
                        return Err(SchemaError::DuplicateRenameTarget {
                            table: table.clone(),
                            column: new.clone(),
                        });
                    }
                }
                Ok(())
            }

            Change::ModifyColumns { table, columns, .. } => {
                let existing = self.existing_table(table)?;
                for name in columns.keys() {
                    if !existing.has_property(name) {
                        return Err(SchemaError::ColumnNotFound {
                            table: table.clone(),
                            column: name.clone(),
                        });
                    }
                }
                Ok(())
            }

            Change::DropColumns { table, columns, .. } => {
                let existing = self.existing_table(table)?;
                for name in columns {
                    if !existing.has_property(name) {
                        return Err(SchemaError::ColumnNotFound {
                            table: table.clone(),
                            column: name.clone(),
                        });
                    }
                }
                Ok(())
            }
        }
    }

    /// Verify and apply a change, returning the recorded form.
    ///
    /// The returned change is the one that belongs in a changelog: for
    /// destructive kinds it carries a snapshot of the state it replaced
    /// (`old_schema` for a table drop, the touched columns' prior
    /// descriptors for `alter.modify` / `alter.drop`), so its inverse can
    /// be derived later. The input is consumed rather than mutated in
    /// place.
    pub fn apply(&mut self, change: Change) -> Result<Change, SchemaError> {
        self.verify(&change)?;

        match change {
            Change::Create { schema } => {
                self.tables.insert(schema.id.clone(), schema.clone());
                Ok(Change::Create { schema })
            }

            Change::Drop { schema, .. } => {
                let snapshot = self
                    .tables
                    .remove(&schema.id)
                    .ok_or_else(|| SchemaError::TableNotFound(schema.id.clone()))?;
                Ok(Change::Drop {
                    schema,
                    old_schema: Some(snapshot),
                })
            }

            Change::AddColumns { table, columns } => {
                let target = self.existing_table_mut(&table)?;
                for (name, property) in &columns {
                    target.properties.insert(name.clone(), property.clone());
                }
                Ok(Change::AddColumns { table, columns })
            }

            Change::RenameColumns { table, renames } => {
                let target = self.existing_table_mut(&table)?;
                for (old, new) in &renames {
                    if let Some(property) = target.properties.remove(old) {
                        target.properties.insert(new.clone(), property);
                    }
                }
                Ok(Change::RenameColumns { table, renames })
            }

            Change::ModifyColumns { table, columns, .. } => {
                let target = self.existing_table_mut(&table)?;
                let mut old_columns = BTreeMap::new();
                for (name, property) in &columns {
                    if let Some(previous) =
                        target.properties.insert(name.clone(), property.clone())
                    {
                        old_columns.insert(name.clone(), previous);
                    }
                }
                Ok(Change::ModifyColumns {
                    table,
                    columns,
                    old_columns: Some(old_columns),
                })
            }

            Change::DropColumns { table, columns, .. } => {
                let target = self.existing_table_mut(&table)?;
                let mut old_columns = BTreeMap::new();
                for name in &columns {
                    if let Some(previous) = target.properties.remove(name) {
                        old_columns.insert(name.clone(), previous);
                    }
                }
                Ok(Change::DropColumns {
                    table,
                    columns,
                    old_columns: Some(old_columns),
                })
            }
        }
    }

    fn existing_table(&self, id: &str) -> Result<&TableSchema, SchemaError> {
        self.tables
            .get(id)
            .ok_or_else(|| SchemaError::TableNotFound(id.to_string()))
    }

    fn existing_table_mut(&mut self, id: &str) -> Result<&mut TableSchema, SchemaError> {
        self.tables
            .get_mut(id)
            .ok_or_else(|| SchemaError::TableNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::Property;

    fn create_person() -> Change {
        Change::Create {
            schema: TableSchema::new("person")
                .with_property("id", Property::string().with_identity()),
        }
    }

    fn schema_with_person() -> Schema {
        let mut schema = Schema::new();
        schema.apply(create_person()).unwrap();
        schema
    }

    #[test]
    fn test_create_and_lookup() {
        let schema = schema_with_person();
        assert!(schema.contains_table("person"));
        assert!(schema.table("person").unwrap().has_property("id"));
        assert_eq!(schema.len(), 1);
    }

    #[test]
    fn test_create_existing_table_fails_verify() {
        let schema = schema_with_person();
        assert_eq!(
            schema.verify(&create_person()),
            Err(SchemaError::TableExists("person".into()))
        );
    }

    #[test]
    fn test_drop_missing_table_fails_verify() {
        let schema = Schema::new();
        let drop = Change::Drop {
            schema: TableSchema::new("person"),
            old_schema: None,
        };
        assert_eq!(
            schema.verify(&drop),
            Err(SchemaError::TableNotFound("person".into()))
        );
    }

    #[test]
    fn test_drop_records_full_snapshot() {
        let mut schema = schema_with_person();
        let recorded = schema
            .apply(Change::Drop {
                schema: TableSchema::new("person"),
                old_schema: None,
            })
            .unwrap();

        assert!(!schema.contains_table("person"));
        match recorded {
            Change::Drop { old_schema, .. } => {
                // the snapshot carries the properties the drop destroyed
                assert!(old_schema.unwrap().has_property("id"));
            }
            other => panic!("expected a drop change, got {:?}", other),
        }
    }

    #[test]
    fn test_add_existing_column_fails_verify() {
        let schema = schema_with_person();
        let add = Change::AddColumns {
            table: "person".into(),
            columns: [("id".to_string(), Property::string())].into(),
        };
        assert_eq!(
            schema.verify(&add),
            Err(SchemaError::ColumnExists {
                table: "person".into(),
                column: "id".into()
            })
        );
    }

    #[test]
    fn test_add_and_drop_columns() {
        let mut schema = schema_with_person();
        schema
            .apply(Change::AddColumns {
                table: "person".into(),
                columns: [("name".to_string(), Property::string())].into(),
            })
            .unwrap();
        assert!(schema.table("person").unwrap().has_property("name"));

        let recorded = schema
            .apply(Change::DropColumns {
                table: "person".into(),
                columns: vec!["name".into()],
                old_columns: None,
            })
            .unwrap();
        assert!(!schema.table("person").unwrap().has_property("name"));

        match recorded {
            Change::DropColumns { old_columns, .. } => {
                assert_eq!(
                    old_columns.unwrap().get("name"),
                    Some(&Property::string())
                );
            }
            other => panic!("expected a drop-columns change, got {:?}", other),
        }
    }

    #[test]
    fn test_modify_snapshots_only_touched_columns() {
        let mut schema = schema_with_person();
        schema
            .apply(Change::AddColumns {
                table: "person".into(),
                columns: [("name".to_string(), Property::string())].into(),
            })
            .unwrap();

        let recorded = schema
            .apply(Change::ModifyColumns {
                table: "person".into(),
                columns: [("name".to_string(), Property::string().with_max_length(50))].into(),
                old_columns: None,
            })
            .unwrap();

        match recorded {
            Change::ModifyColumns { old_columns, .. } => {
                let old = old_columns.unwrap();
                assert_eq!(old.len(), 1);
                assert_eq!(old.get("name"), Some(&Property::string()));
            }
            other => panic!("expected a modify change, got {:?}", other),
        }

        assert_eq!(
            schema.table("person").unwrap().property("name"),
            Some(&Property::string().with_max_length(50))
        );
    }

    #[test]
    fn test_modify_missing_column_fails_verify() {
        let schema = schema_with_person();
        let modify = Change::ModifyColumns {
            table: "person".into(),
            columns: [("age".to_string(), Property::string())].into(),
            old_columns: None,
        };
        assert_eq!(
            schema.verify(&modify),
            Err(SchemaError::ColumnNotFound {
                table: "person".into(),
                column: "age".into()
            })
        );
    }

    #[test]
    fn test_rename_moves_descriptor() {
        let mut schema = schema_with_person();
        schema
            .apply(Change::RenameColumns {
                table: "person".into(),
                renames: [("id".to_string(), "person_id".to_string())].into(),
            })
            .unwrap();

        let table = schema.table("person").unwrap();
        assert!(!table.has_property("id"));
        assert_eq!(
            table.property("person_id"),
            Some(&Property::string().with_identity())
        );
    }

    #[test]
    fn test_rename_preconditions() {
        let mut schema = schema_with_person();
        schema
            .apply(Change::AddColumns {
                table: "person".into(),
                columns: [("name".to_string(), Property::string())].into(),
            })
            .unwrap();

        // source must exist
        let missing_source = Change::RenameColumns {
            table: "person".into(),
            renames: [("nickname".to_string(), "alias".to_string())].into(),
        };
        assert!(matches!(
            schema.verify(&missing_source),
            Err(SchemaError::ColumnNotFound { .. })
        ));

        // target must be free
        let taken_target = Change::RenameColumns {
            table: "person".into(),
            renames: [("id".to_string(), "name".to_string())].into(),
        };
        assert!(matches!(
            schema.verify(&taken_target),
            Err(SchemaError::ColumnExists { .. })
        ));

        // two sources may not collapse onto one target
        let collapsing = Change::RenameColumns {
            table: "person".into(),
            renames: [
                ("id".to_string(), "merged".to_string()),
                ("name".to_string(), "merged".to_string()),
            ]
            .into(),
        };
        assert!(matches!(
            schema.verify(&collapsing),
            Err(SchemaError::DuplicateRenameTarget { .. })
        ));
    }

    #[test]
    fn test_verify_does_not_mutate() {
        let schema = schema_with_person();
        let before = schema.clone();
        let _ = schema.verify(&create_person());
        let _ = schema.verify(&Change::Drop {
            schema: TableSchema::new("person"),
            old_schema: None,
        });
        assert_eq!(schema, before);
    }

    #[test]
    fn test_apply_then_reverse_restores_state() {
        let mut schema = schema_with_person();
        let before = schema.clone();

        let recorded = schema
            .apply(Change::Drop {
                schema: TableSchema::new("person"),
                old_schema: None,
            })
            .unwrap();
        schema.apply(recorded.reverse().unwrap()).unwrap();

        assert_eq!(schema, before);
    }
}
