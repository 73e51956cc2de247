//! Relata: an in-process object-relational store.
//!
//! A registry of typed records held entirely in memory, offering identity
//! lookup, a composable lazy query language, and declarative associations
//! (one-to-one, one-to-many, many-to-many, self-referential, and two-hop
//! "through" associations). No backing database, no persistence: the
//! store lives and dies with the process.
//!
//! # Quickstart
//!
//! ```
//! use relata::prelude::*;
//!
//! let db = Database::new();
//! let parents = db
//!     .define(
//!         ModelDef::builder("Parent")
//!             .has_many("children", "Child", "parent_id")
//!             .has_many_through("dogs", "Dog", "children", "dogs")
//!             .build(),
//!     )
//!     .unwrap();
//! db.define(
//!     ModelDef::builder("Child")
//!         .belongs_to("parent", "Parent", "parent_id")
//!         .has_many("dogs", "Dog", "child_id")
//!         .build(),
//! )
//! .unwrap();
//! db.define(
//!     ModelDef::builder("Dog")
//!         .attribute("breed")
//!         .belongs_to("child", "Child", "child_id")
//!         .build(),
//! )
//! .unwrap();
//!
//! let parent = parents.create(attrs! {}).unwrap();
//! let child = parent.create_related("children", attrs! {}).unwrap();
//! let dog = child.create_related("dogs", attrs! { "breed" => "mutt" }).unwrap();
//!
//! assert_eq!(dog.related_one("child").unwrap(), Some(child));
//! assert_eq!(parent.related("dogs").unwrap(), vec![dog]);
//!
//! db.drop_all();
//! assert_eq!(parents.count(), 0);
//! ```
//!
//! # Evaluation model
//!
//! Queries are specifications, not snapshots: every enumeration re-scans
//! the live store, so a query built once stays current as records are
//! created and destroyed. All operations are synchronous and complete in
//! one pass; callers needing cross-thread access serialize externally.

pub mod types;

pub use types::*;

/// Everything an application typically imports.
pub mod prelude {
    pub use crate::types::{
        Attrs, Database, Filters, Model, ModelDef, Query, Record, RecordId, RelataError,
        RelataResult, Value,
    };
    pub use relata_core::attrs;
}

// The `attrs!` macro is defined in relata-core; re-export it at the crate
// root so `relata::attrs!` works.
pub use relata_core::attrs;
