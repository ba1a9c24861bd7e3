//! Deploy boundary: turning change sequences into something a database
//! can execute.
//!
//! The engine itself never talks to a database. A deployer receives an
//! ordered [`Change`](crate::schema::Change) sequence (a migration plan
//! from [`Repository::migrate`](crate::repo::Repository::migrate) or a
//! staged batch) and materializes it. The SQL renderer here produces
//! portable DDL text for that purpose.

mod sql;

pub use sql::{column_type, render_script, statements, DeployError};
