//! Lazy, composable queries over one model's store.
//!
//! A [`Query`] is a specification, not a result set: it carries an ordered
//! list of predicate terms and re-scans the live store every time it is
//! evaluated (`all`, `first`, `count`, `exists`). Combinators never mutate;
//! each returns a new value, so a query can be forked and extended safely.
//!
//! Predicate semantics by term kind:
//! - `Eq`: value equality (identifier / raw-integer equality included)
//! - `In`: membership in an explicit value set
//! - `Between`: inclusive range test using [`Value::compare`]
//! - `Matches`: nested association match, satisfied iff the record's
//!   resolved association yields at least one record matching the nested
//!   filter (recursive)
//!
//! A record matches a query iff every term matches (conjunction), honoring
//! each term's own negation flag. Term order never changes the result set.

use crate::database::Database;
use crate::model::create_record;
use crate::record::Record;
use crate::schema::ModelDef;
use relata_core::{Attrs, RelataError, RelataResult, Value};
use std::cmp::Ordering;
use std::sync::Arc;

/// One comparison against a record attribute (or association, for
/// `Matches`).
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Eq(Value),
    In(Vec<Value>),
    /// Inclusive on both ends.
    Between(Value, Value),
    /// Keyed by association name; holds the nested filter.
    Matches(Filters),
}

/// One predicate term: attribute, comparison, negation flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub attr: String,
    pub cmp: Comparison,
    pub negated: bool,
}

/// An ordered set of named comparisons, used to extend queries and to
/// express nested association matches.
///
/// ```
/// use relata_engine::Filters;
///
/// let f = Filters::new().eq("breed", "mutt").between("age", 1i64, 9i64);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    entries: Vec<(String, Comparison)>,
}

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equality on an attribute.
    pub fn eq(mut self, attr: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push((attr.into(), Comparison::Eq(value.into())));
        self
    }

    /// Membership in a value set.
    pub fn one_of(
        mut self,
        attr: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.entries.push((attr.into(), Comparison::In(values)));
        self
    }

    /// Inclusive range membership.
    pub fn between(
        mut self,
        attr: impl Into<String>,
        lo: impl Into<Value>,
        hi: impl Into<Value>,
    ) -> Self {
        self.entries
            .push((attr.into(), Comparison::Between(lo.into(), hi.into())));
        self
    }

    /// Nested association match: at least one record reached through the
    /// association `name` must satisfy `nested`.
    pub fn matching(mut self, name: impl Into<String>, nested: Filters) -> Self {
        self.entries.push((name.into(), Comparison::Matches(nested)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn to_terms(&self, negated: bool) -> Vec<Term> {
        self.entries
            .iter()
            .map(|(attr, cmp)| Term {
                attr: attr.clone(),
                cmp: cmp.clone(),
                negated,
            })
            .collect()
    }

    /// Test a record against every entry (conjunction, no negation).
    pub(crate) fn matches(&self, record: &Record) -> bool {
        self.to_terms(false).iter().all(|t| term_matches(record, t))
    }
}

fn term_matches(record: &Record, term: &Term) -> bool {
    let satisfied = match &term.cmp {
        Comparison::Eq(expected) => record
            .get(&term.attr)
            .map_or(false, |actual| actual == *expected),
        Comparison::In(values) => record
            .get(&term.attr)
            .map_or(false, |actual| values.iter().any(|v| *v == actual)),
        Comparison::Between(lo, hi) => record.get(&term.attr).map_or(false, |actual| {
            matches!(actual.compare(lo), Some(Ordering::Greater | Ordering::Equal))
                && matches!(actual.compare(hi), Some(Ordering::Less | Ordering::Equal))
        }),
        Comparison::Matches(nested) => match record.related(&term.attr) {
            Ok(related) => related.iter().any(|r| nested.matches(r)),
            Err(err) => {
                tracing::warn!(
                    model = record.model_name(),
                    term = %term.attr,
                    %err,
                    "nested predicate did not resolve"
                );
                false
            }
        },
    };
    satisfied != term.negated
}

/// A lazy predicate specification over one model's store.
#[derive(Debug, Clone)]
pub struct Query {
    db: Database,
    def: Arc<ModelDef>,
    terms: Vec<Term>,
    /// Consumed by the next scope application; inverts its terms.
    negate_next: bool,
}

impl Query {
    pub(crate) fn new(db: Database, def: Arc<ModelDef>) -> Self {
        Self {
            db,
            def,
            terms: Vec::new(),
            negate_next: false,
        }
    }

    /// Target model name.
    pub fn model_name(&self) -> &str {
        self.def.name()
    }

    /// The accumulated terms, in construction order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Append the filter's terms.
    pub fn filter(mut self, filters: Filters) -> Self {
        self.terms.extend(filters.to_terms(false));
        self
    }

    /// Append the filter's terms, each negated.
    pub fn exclude(mut self, filters: Filters) -> Self {
        self.terms.extend(filters.to_terms(true));
        self
    }

    pub fn filter_eq(self, attr: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filters::new().eq(attr, value))
    }

    pub fn filter_in(
        self,
        attr: impl Into<String>,
        values: impl IntoIterator<Item = impl Into<Value>>,
    ) -> Self {
        self.filter(Filters::new().one_of(attr, values))
    }

    pub fn filter_between(
        self,
        attr: impl Into<String>,
        lo: impl Into<Value>,
        hi: impl Into<Value>,
    ) -> Self {
        self.filter(Filters::new().between(attr, lo, hi))
    }

    pub fn filter_matching(self, name: impl Into<String>, nested: Filters) -> Self {
        self.filter(Filters::new().matching(name, nested))
    }

    /// Arm negation for the next scope application: the terms that scope
    /// appends are inverted instead, and the flag clears.
    pub fn negated(mut self) -> Self {
        self.negate_next = true;
        self
    }

    /// Apply a named scope from the target model.
    pub fn scope(mut self, name: &str, args: &[Value]) -> RelataResult<Query> {
        let f = self
            .def
            .scope_fn(name)
            .cloned()
            .ok_or_else(|| RelataError::UnknownScope {
                model: self.def.name().to_string(),
                name: name.to_string(),
            })?;
        let negate = std::mem::take(&mut self.negate_next);
        let before = self.terms.len();
        let mut applied = (*f)(self, args);
        if negate {
            for term in &mut applied.terms[before..] {
                term.negated = !term.negated;
            }
        }
        Ok(applied)
    }

    /// Does the record satisfy every term?
    pub fn matches(&self, record: &Record) -> bool {
        self.terms.iter().all(|t| term_matches(record, t))
    }

    /// Evaluate now: matching records in store insertion order. Each call
    /// re-scans the live store.
    pub fn all(&self) -> Vec<Record> {
        let Ok(store) = self.db.store(self.def.name()) else {
            return Vec::new();
        };
        store
            .all()
            .into_iter()
            .map(|cell| Record::new(self.db.clone(), cell))
            .filter(|record| self.matches(record))
            .collect()
    }

    /// First matching record in store order.
    pub fn first(&self) -> Option<Record> {
        let store = self.db.store(self.def.name()).ok()?;
        store
            .all()
            .into_iter()
            .map(|cell| Record::new(self.db.clone(), cell))
            .find(|record| self.matches(record))
    }

    pub fn count(&self) -> usize {
        self.all().len()
    }

    pub fn exists(&self) -> bool {
        self.first().is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.exists()
    }

    /// The query's non-negated equality terms as creation attributes.
    fn equality_attrs(&self) -> Attrs {
        let mut attrs = Attrs::new();
        for term in &self.terms {
            if let (Comparison::Eq(value), false) = (&term.cmp, term.negated) {
                attrs = attrs.set(term.attr.clone(), value.clone());
            }
        }
        attrs
    }

    /// Create a record from the query's equality terms merged with
    /// `overrides` (overrides win). No existence check.
    pub fn create(&self, overrides: Attrs) -> RelataResult<Record> {
        create_record(&self.db, &self.def, self.equality_attrs().merged_with(overrides))
    }

    /// Return the first match, or create one from the equality terms plus
    /// `overrides`. Two sequential identical calls create at most once.
    pub fn first_or_create(&self, overrides: Attrs) -> RelataResult<Record> {
        match self.first() {
            Some(record) => Ok(record),
            None => self.create(overrides),
        }
    }
}

impl PartialEq for Query {
    /// Structural equality: same target model, same ordered term list.
    /// How the query was built (scopes vs. direct filters) is irrelevant.
    fn eq(&self, other: &Query) -> bool {
        self.def.name() == other.def.name() && self.terms == other.terms
    }
}
