//! Dynamically-typed attribute values.
//!
//! Every record attribute holds a [`Value`]. The variants cover the types
//! the query engine can compare: scalars, timestamps, identifiers, and
//! ordered identifier lists (the storage form of direct many-to-many
//! associations).
//!
//! Two equality rules matter for lookups:
//! - `Id` and `Int` compare equal when the numeric values agree, so a raw
//!   integer can stand in for the identifier wrapping it.
//! - `Int` and `Float` compare numerically.

use crate::id::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A single attribute value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    /// Absent / unset.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// UTC timestamp.
    Time(DateTime<Utc>),
    /// A record identifier (foreign key attributes hold these).
    Id(RecordId),
    /// An ordered set of record identifiers (direct many-to-many).
    IdList(Vec<RecordId>),
}

impl Value {
    /// True for `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The identifier inside `Id`, or an `Int` reinterpreted as one.
    pub fn as_id(&self) -> Option<RecordId> {
        match self {
            Value::Id(id) => Some(*id),
            Value::Int(n) if *n >= 0 => Some(RecordId::from(*n as u64)),
            _ => None,
        }
    }

    /// The identifier list inside `IdList`.
    pub fn as_id_list(&self) -> Option<&[RecordId]> {
        match self {
            Value::IdList(ids) => Some(ids),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// Variant name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Time(_) => "time",
            Value::Id(_) => "id",
            Value::IdList(_) => "id_list",
        }
    }

    /// Ordering between two values of comparable kinds.
    ///
    /// Used by inclusive range predicates. Same-kind scalars compare
    /// directly; `Int` and `Float` cross-compare numerically. Incomparable
    /// kinds return `None`, which a range test treats as no-match.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Id(a), Value::Id(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Render into a `serde_json::Value` for diagnostic output.
    ///
    /// Identifiers wider than 64 bits (random generators) render as strings
    /// since JSON numbers cannot hold them.
    pub fn to_json(&self) -> serde_json::Value {
        fn id_json(id: RecordId) -> serde_json::Value {
            if id.raw() <= u64::MAX as u128 {
                serde_json::Value::from(id.raw() as u64)
            } else {
                serde_json::Value::from(id.to_string())
            }
        }
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::from(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Str(s) => serde_json::Value::from(s.as_str()),
            Value::Time(t) => serde_json::Value::from(t.to_rfc3339()),
            Value::Id(id) => id_json(*id),
            Value::IdList(ids) => {
                serde_json::Value::Array(ids.iter().map(|id| id_json(*id)).collect())
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Id(a), Value::Id(b)) => a == b,
            // Identifier ↔ raw form: lookups accept either.
            (Value::Id(id), Value::Int(n)) | (Value::Int(n), Value::Id(id)) => {
                *n >= 0 && *id == *n as u64
            }
            (Value::IdList(a), Value::IdList(b)) => a == b,
            _ => false,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Time(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Id(id) => write!(f, "{id}"),
            Value::IdList(ids) => {
                write!(f, "[")?;
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{id}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Time(v)
    }
}

impl From<RecordId> for Value {
    fn from(v: RecordId) -> Self {
        Value::Id(v)
    }
}

impl From<Vec<RecordId>> for Value {
    fn from(v: Vec<RecordId>) -> Self {
        Value::IdList(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_and_raw_int_compare_equal() {
        let id = Value::Id(RecordId::from_raw(5));
        assert_eq!(id, Value::Int(5));
        assert_eq!(Value::Int(5), id);
        assert_ne!(id, Value::Int(6));
        assert_ne!(id, Value::Int(-5));
    }

    #[test]
    fn int_and_float_compare_numerically() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_ne!(Value::Int(2), Value::Float(2.5));
        assert_eq!(Value::Int(1).compare(&Value::Float(1.5)), Some(Ordering::Less));
    }

    #[test]
    fn strings_order_lexicographically() {
        assert_eq!(
            Value::from("apple").compare(&Value::from("banana")),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn incomparable_kinds_return_none() {
        assert_eq!(Value::from("a").compare(&Value::Int(1)), None);
        assert_eq!(Value::Null.compare(&Value::Null), None);
    }

    #[test]
    fn times_compare_chronologically() {
        let earlier = Value::Time(DateTime::from_timestamp(1_000, 0).unwrap());
        let later = Value::Time(DateTime::from_timestamp(2_000, 0).unwrap());
        assert_eq!(earlier.compare(&later), Some(Ordering::Less));
    }

    #[test]
    fn option_from_maps_none_to_null() {
        assert!(Value::from(None::<i64>).is_null());
        assert_eq!(Value::from(Some(3i64)), Value::Int(3));
    }

    #[test]
    fn to_json_renders_small_ids_as_numbers() {
        let v = Value::Id(RecordId::from_raw(7));
        assert_eq!(v.to_json(), serde_json::json!(7));
    }

    #[test]
    fn to_json_renders_wide_ids_as_strings() {
        let wide = RecordId::from_raw(u64::MAX as u128 + 1);
        assert!(Value::Id(wide).to_json().is_string());
    }

    #[test]
    fn to_json_renders_id_lists_in_order() {
        let v = Value::IdList(vec![RecordId::from_raw(2), RecordId::from_raw(1)]);
        assert_eq!(v.to_json(), serde_json::json!([2, 1]));
    }

    #[test]
    fn serde_roundtrip_scalar_values() {
        for v in [
            Value::Null,
            Value::Bool(true),
            Value::Int(-4),
            Value::from("hello"),
            Value::Id(RecordId::from_raw(9)),
            Value::IdList(vec![RecordId::from_raw(1), RecordId::from_raw(2)]),
        ] {
            let json = serde_json::to_string(&v).unwrap();
            let restored: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(restored, v);
        }
    }
}
