//! Ordered attribute-name → value collections.
//!
//! [`Attrs`] seeds record creation and carries explicit overrides into
//! `first_or_create`. Entries keep the order they were written in; setting
//! a name twice replaces the earlier value in place.

use crate::value::Value;

/// An ordered list of `(attribute name, value)` pairs.
///
/// ```
/// use relata_core::{attrs, Attrs, Value};
///
/// let a = Attrs::new().set("name", "Rex").set("age", 3i64);
/// assert_eq!(a.get("name"), Some(&Value::from("Rex")));
///
/// // The `attrs!` macro is shorthand for the same chain.
/// let b = attrs! { "name" => "Rex", "age" => 3i64 };
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attrs {
    entries: Vec<(String, Value)>,
}

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing any earlier entry with the same name.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    /// Look up a value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Overlay `other` on top of `self`: entries in `other` win.
    pub fn merged_with(self, other: Attrs) -> Attrs {
        let mut merged = self;
        for (name, value) in other.entries {
            merged = merged.set(name, value);
        }
        merged
    }
}

impl FromIterator<(String, Value)> for Attrs {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut attrs = Attrs::new();
        for (name, value) in iter {
            attrs = attrs.set(name, value);
        }
        attrs
    }
}

/// Build an [`Attrs`] from `name => value` pairs.
///
/// ```
/// use relata_core::attrs;
///
/// let a = attrs! { "breed" => "mutt", "age" => 4i64 };
/// assert_eq!(a.len(), 2);
/// ```
#[macro_export]
macro_rules! attrs {
    () => {
        $crate::Attrs::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::Attrs::new()$(.set($name, $value))+
    };
}
