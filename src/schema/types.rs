//! Abstract column and table descriptors.
//!
//! A [`Property`] describes a single column's type without committing to any
//! concrete database dialect. A [`TableSchema`] is one table's full shape:
//! a unique id plus a name -> property mapping.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The enumeration of abstract property types.
///
/// Only `string` has concrete column semantics today; the rest are carried
/// through the engine untouched and rejected at the deploy boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl PropertyType {
    /// Get the wire name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Number => "number",
            PropertyType::Integer => "integer",
            PropertyType::Boolean => "boolean",
            PropertyType::Object => "object",
            PropertyType::Array => "array",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single column's abstract type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Abstract type.
    #[serde(rename = "type")]
    pub ty: PropertyType,
    /// Upper bound on string length, when bounded.
    #[serde(rename = "maxLength", default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    /// Optional refinement of the type (only `date` is reserved today).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Marks the column as the table's identity (primary key).
    #[serde(default, skip_serializing_if = "is_false")]
    pub identity: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Property {
    /// Create a property of the given type with no refinements.
    pub fn new(ty: PropertyType) -> Self {
        Self {
            ty,
            max_length: None,
            format: None,
            identity: false,
        }
    }

    /// Shorthand for an unbounded string property.
    pub fn string() -> Self {
        Self::new(PropertyType::String)
    }

    /// Bound the property's length.
    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Set the format refinement.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Mark the property as the table identity.
    pub fn with_identity(mut self) -> Self {
        self.identity = true;
        self
    }
}

/// One table's shape: a unique id and its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name, unique within a schema.
    pub id: String,
    /// Column name -> descriptor.
    pub properties: BTreeMap<String, Property>,
}

impl TableSchema {
    /// Create an empty table schema.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Add a column.
    pub fn with_property(mut self, name: impl Into<String>, property: Property) -> Self {
        self.properties.insert(name.into(), property);
        self
    }

    /// Look up a column descriptor by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Check whether a column exists.
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Column names, in sorted order.
    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }
}
