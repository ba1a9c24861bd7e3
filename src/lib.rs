//! EvoDB - A git-like version control engine for relational schemas.
//!
//! Schemas evolve the way source code does: independent branches apply
//! structural changes (create table, drop table, add/rename/modify/drop
//! column), commits freeze those changes into immutable content-addressed
//! snapshots, and migration plans are derived by walking two commits back
//! to their common ancestor and replaying one side in reverse followed by
//! the other side forward.
//!
//! # Example
//!
//! ```no_run
//! use evodb::repo::Repository;
//! use evodb::schema::{Change, Property, TableSchema};
//!
//! let mut repo = Repository::new();
//! let mut master = repo.branch("master", None).unwrap();
//! master
//!     .add(Change::Create {
//!         schema: TableSchema::new("person")
//!             .with_property("id", Property::string().with_identity()),
//!     })
//!     .unwrap();
//! master.commit(&mut repo, "create person").unwrap();
//! ```

pub mod deploy;
pub mod history;
pub mod repo;
pub mod schema;
pub mod store;
