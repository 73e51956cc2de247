//! Record identifiers and identifier generation.
//!
//! A [`RecordId`] is an opaque, comparable key that is unique within one
//! model's store. Identifiers compare equal to their raw underlying value,
//! so lookups accept either form.
//!
//! Generation strategy is pluggable via [`IdGenerator`]:
//! - [`SerialIds`]: monotonically increasing integers starting at 1 (default)
//! - [`RandomIds`]: 128-bit values derived from UUID v4

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque record identifier.
///
/// Equality is by underlying value, and a raw integer compares equal to the
/// identifier wrapping it:
///
/// ```
/// use relata_core::RecordId;
///
/// let id = RecordId::from_raw(42);
/// assert_eq!(id, RecordId::from(42u64));
/// assert_eq!(id, 42u64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u128);

impl RecordId {
    /// Wrap a raw value as an identifier.
    pub const fn from_raw(raw: u128) -> Self {
        RecordId(raw)
    }

    /// The raw underlying value.
    pub const fn raw(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for RecordId {
    fn from(raw: u128) -> Self {
        RecordId(raw)
    }
}

impl From<u64> for RecordId {
    fn from(raw: u64) -> Self {
        RecordId(raw as u128)
    }
}

impl From<u32> for RecordId {
    fn from(raw: u32) -> Self {
        RecordId(raw as u128)
    }
}

impl PartialEq<u128> for RecordId {
    fn eq(&self, other: &u128) -> bool {
        self.0 == *other
    }
}

impl PartialEq<RecordId> for u128 {
    fn eq(&self, other: &RecordId) -> bool {
        *self == other.0
    }
}

impl PartialEq<u64> for RecordId {
    fn eq(&self, other: &u64) -> bool {
        self.0 == *other as u128
    }
}

impl PartialEq<RecordId> for u64 {
    fn eq(&self, other: &RecordId) -> bool {
        *self as u128 == other.0
    }
}

/// Pluggable identifier generation strategy.
///
/// Implementations must produce values that are unique within a model's
/// store for the store's lifetime. Each model store owns one generator.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    /// Produce the next identifier.
    fn next_id(&self) -> RecordId;
}

/// Serial identifier generator: 1, 2, 3, ...
///
/// The default strategy. Ids are small and stable, which keeps diagnostics
/// readable and makes the raw-value equality form (`find(3u64)`) practical.
#[derive(Debug, Default)]
pub struct SerialIds {
    next: AtomicU64,
}

impl SerialIds {
    /// Create a generator whose first id is 1.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SerialIds {
    fn next_id(&self) -> RecordId {
        RecordId::from(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

/// Random identifier generator backed by UUID v4.
///
/// Collision probability is negligible for in-process stores; uniqueness is
/// still validated at insert time like any other identifier.
#[derive(Debug, Default)]
pub struct RandomIds;

impl RandomIds {
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for RandomIds {
    fn next_id(&self) -> RecordId {
        RecordId::from_raw(uuid::Uuid::new_v4().as_u128())
    }
}
