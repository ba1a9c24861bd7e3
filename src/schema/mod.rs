//! Schema model: table descriptors, structural changes, and the mutable
//! working schema they apply to.
//!
//! Everything here is pure data transformation. History (commits, branches)
//! lives in [`crate::repo`]; this module only knows how to describe a
//! schema, describe a delta against it, check the delta's preconditions,
//! and derive the delta's inverse.

mod change;
mod model;
mod types;

pub use change::{Change, ChangeKind};
pub use model::{Schema, SchemaError};
pub use types::{Property, PropertyType, TableSchema};
