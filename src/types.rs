//! Public types for the Relata unified API.
//!
//! This module re-exports types from internal crates with a clean public
//! interface.

// ============================================================================
// Public API types - these are what users should use
// ============================================================================

// Core value types
pub use relata_core::Value;

// Identifiers and generation strategies
pub use relata_core::{IdGenerator, RandomIds, RecordId, SerialIds};

// Attribute maps
pub use relata_core::Attrs;

// Errors
pub use relata_core::{RelataError, RelataResult};

// The store registry and per-model handles
pub use relata_engine::{Database, Model, Record};

// Queries and filters
pub use relata_engine::{Comparison, Filters, Query, Term};

// Model metadata
pub use relata_engine::{AfterCreate, AssocDef, AssocKind, ModelBuilder, ModelDef, ID_ATTR};
