//! Rendering change sequences as SQL DDL.
//!
//! The engine hands a deployer an ordered change sequence (a migration
//! plan, or a staged batch); this module renders it as portable DDL text,
//! one statement list per change. Only `string` properties have concrete
//! column-type semantics; everything else fails loudly rather than
//! guessing a type the target database would have to live with.

use thiserror::Error;

use crate::schema::{Change, Property, PropertyType};

/// Deploy-boundary failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeployError {
    /// The property type has no column-type mapping.
    #[error("no column type mapping for property type: {0}")]
    UnsupportedType(PropertyType),

    /// The format is enumerated but has no deployable semantics yet.
    #[error("the {0:?} format is reserved and cannot be deployed")]
    UnimplementedFormat(String),
}

/// Map a property to its SQL column type.
///
/// `string` maps to `TEXT`, or `VARCHAR(n)` when length-bounded. The
/// `date` format is reserved. Unrecognized formats are ignored and the
/// property is treated as a plain string.
pub fn column_type(property: &Property) -> Result<String, DeployError> {
    match property.ty {
        PropertyType::String => match property.format.as_deref() {
            Some("date") => Err(DeployError::UnimplementedFormat("date".to_string())),
            _ => Ok(match property.max_length {
                Some(max_length) => format!("VARCHAR({})", max_length),
                None => "TEXT".to_string(),
            }),
        },
        other => Err(DeployError::UnsupportedType(other)),
    }
}

/// Render a full column definition: name, type, and the identity marker.
fn column_def(name: &str, property: &Property) -> Result<String, DeployError> {
    let mut def = format!("{} {}", name, column_type(property)?);
    if property.identity {
        def.push_str(" PRIMARY KEY");
    }
    Ok(def)
}

/// Render one change as its DDL statement list.
pub fn statements(change: &Change) -> Result<Vec<String>, DeployError> {
    match change {
        Change::Create { schema } => {
            let mut columns = Vec::with_capacity(schema.properties.len());
            for (name, property) in &schema.properties {
                columns.push(column_def(name, property)?);
            }
            Ok(vec![format!(
                "CREATE TABLE {} ({})",
                schema.id,
                columns.join(", ")
            )])
        }

        Change::Drop { schema, .. } => Ok(vec![format!("DROP TABLE {}", schema.id)]),

        Change::AddColumns { table, columns } => {
            let mut out = Vec::with_capacity(columns.len());
            for (name, property) in columns {
                out.push(format!(
                    "ALTER TABLE {} ADD COLUMN {}",
                    table,
                    column_def(name, property)?
                ));
            }
            Ok(out)
        }

        Change::RenameColumns { table, renames } => Ok(renames
            .iter()
            .map(|(old, new)| format!("ALTER TABLE {} RENAME COLUMN {} TO {}", table, old, new))
            .collect()),

        Change::ModifyColumns { table, columns, .. } => {
            let mut out = Vec::with_capacity(columns.len());
            for (name, property) in columns {
                out.push(format!(
                    "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
                    table,
                    name,
                    column_type(property)?
                ));
            }
            Ok(out)
        }

        Change::DropColumns { table, columns, .. } => Ok(columns
            .iter()
            .map(|name| format!("ALTER TABLE {} DROP COLUMN {}", table, name))
            .collect()),
    }
}

/// Render an ordered change sequence as one executable SQL script.
pub fn render_script(changes: &[Change]) -> Result<String, DeployError> {
    let mut script = String::new();
    for change in changes {
        for statement in statements(change)? {
            script.push_str(&statement);
            script.push_str(";\n");
        }
    }
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableSchema;

    #[test]
    fn test_column_types() {
        assert_eq!(column_type(&Property::string()).unwrap(), "TEXT");
        assert_eq!(
            column_type(&Property::string().with_max_length(40)).unwrap(),
            "VARCHAR(40)"
        );
    }

    #[test]
    fn test_unrecognized_format_is_ignored() {
        let prop = Property::string().with_format("email");
        assert_eq!(column_type(&prop).unwrap(), "TEXT");
    }

    #[test]
    fn test_date_format_is_reserved() {
        let prop = Property::string().with_format("date");
        assert_eq!(
            column_type(&prop),
            Err(DeployError::UnimplementedFormat("date".to_string()))
        );
    }

    #[test]
    fn test_non_string_types_fail_loudly() {
        for ty in [
            PropertyType::Number,
            PropertyType::Integer,
            PropertyType::Boolean,
            PropertyType::Object,
            PropertyType::Array,
        ] {
            assert_eq!(
                column_type(&Property::new(ty)),
                Err(DeployError::UnsupportedType(ty))
            );
        }
    }

    #[test]
    fn test_create_table_with_identity() {
        let change = Change::Create {
            schema: TableSchema::new("person")
                .with_property("id", Property::string().with_identity())
                .with_property("name", Property::string().with_max_length(80)),
        };
        assert_eq!(
            statements(&change).unwrap(),
            vec!["CREATE TABLE person (id TEXT PRIMARY KEY, name VARCHAR(80))"]
        );
    }

    #[test]
    fn test_drop_table() {
        let change = Change::Drop {
            schema: TableSchema::new("person"),
            old_schema: None,
        };
        assert_eq!(statements(&change).unwrap(), vec!["DROP TABLE person"]);
    }

    #[test]
    fn test_alter_statements_one_per_column() {
        let add = Change::AddColumns {
            table: "person".into(),
            columns: [
                ("name".to_string(), Property::string()),
                ("nickname".to_string(), Property::string()),
            ]
            .into(),
        };
        assert_eq!(
            statements(&add).unwrap(),
            vec![
                "ALTER TABLE person ADD COLUMN name TEXT",
                "ALTER TABLE person ADD COLUMN nickname TEXT",
            ]
        );

        let rename = Change::RenameColumns {
            table: "person".into(),
            renames: [("name".to_string(), "full_name".to_string())].into(),
        };
        assert_eq!(
            statements(&rename).unwrap(),
            vec!["ALTER TABLE person RENAME COLUMN name TO full_name"]
        );

        let modify = Change::ModifyColumns {
            table: "person".into(),
            columns: [("name".to_string(), Property::string().with_max_length(50))].into(),
            old_columns: None,
        };
        assert_eq!(
            statements(&modify).unwrap(),
            vec!["ALTER TABLE person ALTER COLUMN name TYPE VARCHAR(50)"]
        );

        let drop = Change::DropColumns {
            table: "person".into(),
            columns: vec!["nickname".into()],
            old_columns: None,
        };
        assert_eq!(
            statements(&drop).unwrap(),
            vec!["ALTER TABLE person DROP COLUMN nickname"]
        );
    }

    #[test]
    fn test_render_script_terminates_statements() {
        let changes = vec![
            Change::Create {
                schema: TableSchema::new("person").with_property("id", Property::string()),
            },
            Change::AddColumns {
                table: "person".into(),
                columns: [("name".to_string(), Property::string())].into(),
            },
        ];
        let script = render_script(&changes).unwrap();
        assert_eq!(
            script,
            "CREATE TABLE person (id TEXT);\nALTER TABLE person ADD COLUMN name TEXT;\n"
        );
    }

    #[test]
    fn test_render_script_propagates_type_errors() {
        let changes = vec![Change::Create {
            schema: TableSchema::new("metrics")
                .with_property("count", Property::new(PropertyType::Integer)),
        }];
        assert!(matches!(
            render_script(&changes),
            Err(DeployError::UnsupportedType(PropertyType::Integer))
        ));
    }
}
