//! Relata engine: the live, mutable record store and everything that reads
//! or writes it.
//!
//! Layering, leaves first:
//! - `store`: per-model live record collections (insertion-ordered)
//! - [`record`]: record cells and the public [`Record`] handle
//! - [`schema`]: model metadata (attributes, associations, scopes, hooks)
//! - [`query`]: lazy, composable, re-scanning predicate sets
//! - `assoc`: association resolution and dual-sided linkage
//! - [`model`]: the per-model facade tying the layers together
//! - [`database`]: the process-wide registry of model stores
//!
//! Everything is synchronous and single-logical-thread; each store
//! mutation is one critical section so interleaved readers never observe a
//! half-applied update.

mod assoc;
pub mod database;
pub mod model;
pub mod query;
pub mod record;
pub mod schema;
mod store;

pub use database::Database;
pub use model::Model;
pub use query::{Comparison, Filters, Query, Term};
pub use record::Record;
pub use schema::{AfterCreate, AssocDef, AssocKind, ModelBuilder, ModelDef, ID_ATTR};
