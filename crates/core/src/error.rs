//! Error taxonomy for the store.
//!
//! Absence is never an error: `find`, `first`, and to-one association reads
//! return `Option`. `RelataError` covers structural misuse (unknown names,
//! wrong association target, duplicate identifiers), writes to destroyed
//! records, and after-create hook failures. All errors surface
//! synchronously; there is no retry layer.

use crate::id::RecordId;
use thiserror::Error;

/// Convenience alias used across the workspace.
pub type RelataResult<T> = std::result::Result<T, RelataError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RelataError {
    /// The model name is not registered in the database.
    #[error("model `{0}` is not defined")]
    UnknownModel(String),

    /// A model with this name is already registered.
    #[error("model `{0}` is already defined")]
    ModelExists(String),

    /// The attribute name is not in the model's schema.
    #[error("model `{model}` has no attribute `{attr}`")]
    UnknownAttribute { model: String, attr: String },

    /// The association name is not declared on the model.
    #[error("model `{model}` has no association `{name}`")]
    UnknownAssociation { model: String, name: String },

    /// The scope name is not declared on the model.
    #[error("model `{model}` has no scope `{name}`")]
    UnknownScope { model: String, name: String },

    /// Inserting a record whose identifier is already live in the store.
    /// The record is not inserted.
    #[error("duplicate id {id} in store for model `{model}`")]
    DuplicateId { model: String, id: RecordId },

    /// Assigning an association a record of the wrong model.
    /// Fails at assignment time, not at the next query evaluation.
    #[error("association target must be a `{expected}` record, got `{actual}`")]
    WrongModel { expected: String, actual: String },

    /// Attribute write on a destroyed (frozen) record.
    #[error("record {id} of model `{model}` is destroyed and frozen")]
    FrozenRecord { model: String, id: RecordId },

    /// Attribute write targeting the reserved `id` attribute.
    #[error("the id of record {id} on model `{model}` is immutable")]
    ImmutableId { model: String, id: RecordId },

    /// A value that cannot be coerced for the attribute it targets
    /// (e.g. a string supplied as an explicit `id`).
    #[error("invalid value for attribute `{attr}` on model `{model}`: expected {expected}")]
    InvalidValue {
        model: String,
        attr: String,
        expected: &'static str,
    },

    /// The operation is not meaningful for this association kind
    /// (e.g. appending through a two-hop association).
    #[error("association `{name}` on model `{model}` does not support {operation}")]
    Unsupported {
        model: String,
        name: String,
        operation: &'static str,
    },

    /// An after-create hook failed. The record remains inserted: hooks run
    /// after insertion and this design does not roll back.
    #[error("after-create hook `{hook}` on model `{model}` failed: {message}")]
    Hook {
        model: String,
        hook: String,
        message: String,
    },
}
