//! Model facade: the per-model entry point for creation, lookup, and
//! query construction.
//!
//! A `Model` is a stateless handle over one registered model's store (cheap
//! to clone, all clones share data). Creation is where the engine's pieces
//! meet: attributes are resolved against the schema, association-valued
//! attributes set foreign keys or id lists, the record is inserted, dual
//! id-list linkage is applied, and the after-create hooks run, in that
//! order.

use crate::assoc::append_link_id;
use crate::database::Database;
use crate::query::{Filters, Query};
use crate::record::{Record, RecordCell};
use crate::schema::{AssocKind, ModelDef, ID_ATTR};
use crate::store::RecordStore;
use relata_core::{Attrs, RecordId, RelataError, RelataResult, Value};
use std::sync::Arc;

/// Handle to one registered model.
#[derive(Clone)]
pub struct Model {
    db: Database,
    def: Arc<ModelDef>,
    store: Arc<RecordStore>,
}

impl Model {
    pub(crate) fn new(db: Database, store: Arc<RecordStore>) -> Self {
        let def = Arc::clone(store.def());
        Self { db, def, store }
    }

    pub fn name(&self) -> &str {
        self.def.name()
    }

    /// The model's metadata.
    pub fn def(&self) -> &ModelDef {
        &self.def
    }

    /// Create a record.
    ///
    /// `attrs` keys may be attribute names (including foreign keys), the
    /// reserved `id` (explicit identifier, validated for uniqueness), or
    /// association names: a `BelongsTo` name takes an identifier and sets
    /// the foreign key, a `ManyToMany` name takes an id list and links both
    /// sides.
    pub fn create(&self, attrs: Attrs) -> RelataResult<Record> {
        create_record(&self.db, &self.def, attrs)
    }

    /// Number of live records.
    pub fn count(&self) -> usize {
        self.store.count()
    }

    /// Every live record, in insertion order. Re-snapshots per call.
    pub fn all(&self) -> Vec<Record> {
        self.store
            .all()
            .into_iter()
            .map(|cell| self.wrap(cell))
            .collect()
    }

    pub fn first(&self) -> Option<Record> {
        self.store.first().map(|cell| self.wrap(cell))
    }

    pub fn last(&self) -> Option<Record> {
        self.store.last().map(|cell| self.wrap(cell))
    }

    /// Identity lookup. Accepts the identifier or its raw value.
    pub fn find(&self, id: impl Into<RecordId>) -> Option<Record> {
        self.store.find(id.into()).map(|cell| self.wrap(cell))
    }

    /// Batch identity lookup, ordered by the requested ids. Ids with no
    /// live match are skipped.
    pub fn find_many<I, T>(&self, ids: I) -> Vec<Record>
    where
        I: IntoIterator<Item = T>,
        T: Into<RecordId>,
    {
        let ids: Vec<RecordId> = ids.into_iter().map(Into::into).collect();
        self.store
            .find_many(&ids)
            .into_iter()
            .map(|cell| self.wrap(cell))
            .collect()
    }

    pub fn exists(&self, id: impl Into<RecordId>) -> bool {
        self.store.find(id.into()).is_some()
    }

    /// First record matching the filters, or none.
    pub fn find_by(&self, filters: Filters) -> Option<Record> {
        self.filter(filters).first()
    }

    /// A fresh query with no terms.
    pub fn query(&self) -> Query {
        Query::new(self.db.clone(), Arc::clone(&self.def))
    }

    /// `query().filter(...)` sugar.
    pub fn filter(&self, filters: Filters) -> Query {
        self.query().filter(filters)
    }

    /// `query().exclude(...)` sugar.
    pub fn exclude(&self, filters: Filters) -> Query {
        self.query().exclude(filters)
    }

    /// Apply a named scope to a fresh query. Construction, not evaluation:
    /// nothing scans until the result is enumerated.
    pub fn scope(&self, name: &str, args: &[Value]) -> RelataResult<Query> {
        self.query().scope(name, args)
    }

    /// Destroy every live record. Returns how many were removed.
    pub fn destroy_all(&self) -> usize {
        let removed = self.store.clear();
        tracing::debug!(model = self.name(), removed, "destroyed all records");
        removed
    }

    fn wrap(&self, cell: Arc<RecordCell>) -> Record {
        Record::new(self.db.clone(), cell)
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name())
            .field("count", &self.count())
            .finish()
    }
}

/// Construct, insert, link, and hook one new record.
pub(crate) fn create_record(
    db: &Database,
    def: &Arc<ModelDef>,
    attrs: Attrs,
) -> RelataResult<Record> {
    let store = db.store(def.name())?;
    let mut values = def.fresh_values();
    let mut explicit_id: Option<RecordId> = None;
    // Many-to-many linkage applied after insert: (target model, target-side
    // id-list attribute, target ids).
    let mut pending_links: Vec<(String, String, Vec<RecordId>)> = Vec::new();

    for (name, value) in attrs.iter() {
        if name == ID_ATTR {
            let id = value.as_id().ok_or_else(|| RelataError::InvalidValue {
                model: def.name().to_string(),
                attr: name.to_string(),
                expected: "an identifier",
            })?;
            explicit_id = Some(id);
            continue;
        }
        if let Some(slot) = def.slot(name) {
            values[slot] = value.clone();
            continue;
        }
        let assoc = def.assoc(name).ok_or_else(|| RelataError::UnknownAttribute {
            model: def.name().to_string(),
            attr: name.to_string(),
        })?;
        match &assoc.kind {
            AssocKind::BelongsTo { foreign_key } => {
                let id = value.as_id().ok_or_else(|| RelataError::InvalidValue {
                    model: def.name().to_string(),
                    attr: name.to_string(),
                    expected: "an identifier",
                })?;
                let slot = fk_slot(def, foreign_key)?;
                values[slot] = Value::Id(id);
            }
            AssocKind::ManyToMany {
                own_ids,
                target_ids,
            } => {
                let ids = value
                    .as_id_list()
                    .ok_or_else(|| RelataError::InvalidValue {
                        model: def.name().to_string(),
                        attr: name.to_string(),
                        expected: "an identifier list",
                    })?
                    .to_vec();
                let slot = fk_slot(def, own_ids)?;
                values[slot] = Value::IdList(ids.clone());
                pending_links.push((assoc.target.clone(), target_ids.clone(), ids));
            }
            AssocKind::HasOne { .. }
            | AssocKind::HasMany { .. }
            | AssocKind::HasManyThrough { .. } => {
                return Err(RelataError::Unsupported {
                    model: def.name().to_string(),
                    name: name.to_string(),
                    operation: "assignment at creation",
                });
            }
        }
    }

    let id = explicit_id.unwrap_or_else(|| store.next_id());
    let cell = RecordCell::new(id, Arc::clone(def), values);
    store.insert(Arc::clone(&cell))?;
    let record = Record::new(db.clone(), cell);
    tracing::debug!(model = def.name(), %id, "created record");

    // Second side of the dual id-list update for many-to-many given at
    // creation. Ids with no live target are skipped.
    for (target_model, target_ids_attr, ids) in pending_links {
        if let Ok(target_store) = db.store(&target_model) {
            for target_cell in target_store.find_many(&ids) {
                let target = Record::new(db.clone(), target_cell);
                append_link_id(&target, &target_ids_attr, id)?;
            }
        }
    }

    for hook in def.hooks() {
        hook.invoke(&record).map_err(|err| RelataError::Hook {
            model: def.name().to_string(),
            hook: hook.label().to_string(),
            message: err.to_string(),
        })?;
    }

    Ok(record)
}

fn fk_slot(def: &ModelDef, attr: &str) -> RelataResult<usize> {
    def.slot(attr).ok_or_else(|| RelataError::UnknownAttribute {
        model: def.name().to_string(),
        attr: attr.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use relata_core::attrs;

    fn dogs() -> (Database, Model) {
        let db = Database::new();
        let dogs = db
            .define(
                ModelDef::builder("Dog")
                    .attribute("breed")
                    .attribute_default("sound", "bark")
                    .build(),
            )
            .unwrap();
        (db, dogs)
    }

    #[test]
    fn create_applies_defaults_then_attrs() {
        let (_db, dogs) = dogs();
        let rex = dogs.create(attrs! { "breed" => "mutt" }).unwrap();
        assert_eq!(rex.get("breed").unwrap(), Value::from("mutt"));
        assert_eq!(rex.get("sound").unwrap(), Value::from("bark"));
    }

    #[test]
    fn create_increments_count_by_exactly_one() {
        let (_db, dogs) = dogs();
        assert_eq!(dogs.count(), 0);
        dogs.create(attrs! {}).unwrap();
        assert_eq!(dogs.count(), 1);
        dogs.create(attrs! {}).unwrap();
        assert_eq!(dogs.count(), 2);
    }

    #[test]
    fn find_accepts_id_or_raw_value() {
        let (_db, dogs) = dogs();
        let rex = dogs.create(attrs! { "breed" => "mutt" }).unwrap();
        assert_eq!(dogs.find(rex.id()).unwrap(), rex);
        assert_eq!(dogs.find(rex.id().raw()).unwrap(), rex);
        assert!(dogs.find(9999u64).is_none());
    }

    #[test]
    fn find_by_matches_attributes() {
        let (_db, dogs) = dogs();
        let rex = dogs.create(attrs! { "breed" => "mutt" }).unwrap();
        dogs.create(attrs! { "breed" => "beagle" }).unwrap();
        assert_eq!(dogs.find_by(Filters::new().eq("breed", "mutt")).unwrap(), rex);
        assert!(dogs.find_by(Filters::new().eq("breed", "poodle")).is_none());
    }

    #[test]
    fn unknown_attribute_at_creation_errors() {
        let (_db, dogs) = dogs();
        let err = dogs.create(attrs! { "wings" => 2i64 }).unwrap_err();
        assert_eq!(
            err,
            RelataError::UnknownAttribute {
                model: "Dog".to_string(),
                attr: "wings".to_string(),
            }
        );
        assert_eq!(dogs.count(), 0);
    }

    #[test]
    fn explicit_id_is_honored_and_duplicates_rejected() {
        let (_db, dogs) = dogs();
        let rex = dogs
            .create(attrs! { "id" => RecordId::from_raw(41), "breed" => "mutt" })
            .unwrap();
        assert_eq!(rex.id(), 41u64);

        let err = dogs
            .create(attrs! { "id" => RecordId::from_raw(41) })
            .unwrap_err();
        assert!(matches!(err, RelataError::DuplicateId { .. }));
        assert_eq!(dogs.count(), 1);
    }

    #[test]
    fn destroy_removes_and_find_returns_none() {
        let (_db, dogs) = dogs();
        let rex = dogs.create(attrs! {}).unwrap();
        rex.destroy().unwrap();
        assert_eq!(dogs.count(), 0);
        assert!(dogs.find(rex.id()).is_none());
        assert!(rex.is_destroyed());
    }

    #[test]
    fn destroyed_record_rejects_writes_and_stays_gone() {
        let (_db, dogs) = dogs();
        let rex = dogs.create(attrs! { "breed" => "mutt" }).unwrap();
        rex.destroy().unwrap();
        let err = rex.set("breed", "zombie").unwrap_err();
        assert!(matches!(err, RelataError::FrozenRecord { .. }));
        // It must not reappear in any query.
        assert!(dogs.filter(Filters::new().eq("breed", "mutt")).all().is_empty());
    }

    #[test]
    fn destroy_all_empties_the_model() {
        let (_db, dogs) = dogs();
        for _ in 0..3 {
            dogs.create(attrs! {}).unwrap();
        }
        assert_eq!(dogs.destroy_all(), 3);
        assert_eq!(dogs.count(), 0);
    }

    #[test]
    fn all_and_find_many_preserve_order() {
        let (_db, dogs) = dogs();
        let a = dogs.create(attrs! {}).unwrap();
        let b = dogs.create(attrs! {}).unwrap();
        let c = dogs.create(attrs! {}).unwrap();
        assert_eq!(dogs.all(), vec![a.clone(), b.clone(), c.clone()]);
        assert_eq!(dogs.first().unwrap(), a);
        assert_eq!(dogs.last().unwrap(), c);
        assert_eq!(dogs.find_many([c.id(), a.id()]), vec![c, a]);
    }

    #[test]
    fn last_follows_latest_insert() {
        let (_db, dogs) = dogs();
        dogs.create(attrs! { "breed" => "first" }).unwrap();
        let newest = dogs.create(attrs! { "breed" => "second" }).unwrap();
        assert_eq!(dogs.last().unwrap(), newest);
    }
}
