//! Core types for the Relata in-process object-relational store.
//!
//! This crate holds the leaf types shared by the engine and the public
//! facade:
//! - [`RecordId`] and the pluggable [`IdGenerator`] strategies
//! - [`Value`], the dynamically-typed attribute value
//! - [`Attrs`], ordered attribute maps for record creation
//! - [`RelataError`] / [`RelataResult`], the error taxonomy
//!
//! Nothing here touches a store; the live engine lives in `relata-engine`.

pub mod attrs;
pub mod error;
pub mod id;
pub mod value;

pub use attrs::Attrs;
pub use error::{RelataError, RelataResult};
pub use id::{IdGenerator, RandomIds, RecordId, SerialIds};
pub use value::Value;
