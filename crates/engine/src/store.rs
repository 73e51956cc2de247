//! Per-model record store.
//!
//! Holds the live records of one model in insertion order, the canonical
//! iteration and `first`/`last` order. Every mutation takes the write lock,
//! so each insert, remove, and clear is one indivisible step relative to
//! any interleaved reader. Reads snapshot current liveness: `all()` built
//! now reflects the store now, not when the handle was obtained.

use crate::record::RecordCell;
use crate::schema::ModelDef;
use relata_core::{IdGenerator, RecordId, RelataError, RelataResult};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

pub(crate) struct RecordStore {
    def: Arc<ModelDef>,
    ids: Arc<dyn IdGenerator>,
    inner: RwLock<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    /// Live records in insertion order.
    order: Vec<Arc<RecordCell>>,
    /// Identifier index over the same records.
    by_id: FxHashMap<RecordId, Arc<RecordCell>>,
}

impl RecordStore {
    pub(crate) fn new(def: Arc<ModelDef>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            def,
            ids,
            inner: RwLock::new(StoreInner::default()),
        }
    }

    pub(crate) fn def(&self) -> &Arc<ModelDef> {
        &self.def
    }

    pub(crate) fn next_id(&self) -> RecordId {
        self.ids.next_id()
    }

    /// Insert a record, validating identifier uniqueness. On a duplicate
    /// the store is left untouched and the record does not appear in it.
    pub(crate) fn insert(&self, cell: Arc<RecordCell>) -> RelataResult<()> {
        let mut inner = self.inner.write();
        let id = cell.id();
        if inner.by_id.contains_key(&id) {
            return Err(RelataError::DuplicateId {
                model: self.def.name().to_string(),
                id,
            });
        }
        inner.by_id.insert(id, Arc::clone(&cell));
        inner.order.push(cell);
        Ok(())
    }

    /// Remove by identifier and freeze. Idempotent: removing an id that is
    /// not live is a no-op returning `None`.
    pub(crate) fn remove(&self, id: RecordId) -> Option<Arc<RecordCell>> {
        let mut inner = self.inner.write();
        let cell = inner.by_id.remove(&id)?;
        inner.order.retain(|c| c.id() != id);
        cell.freeze();
        Some(cell)
    }

    /// Freeze and drop every live record. Returns how many were removed.
    pub(crate) fn clear(&self) -> usize {
        let mut inner = self.inner.write();
        let removed = inner.order.len();
        for cell in inner.order.drain(..) {
            cell.freeze();
        }
        inner.by_id.clear();
        removed
    }

    /// Snapshot of currently-live records in insertion order.
    pub(crate) fn all(&self) -> Vec<Arc<RecordCell>> {
        self.inner.read().order.clone()
    }

    pub(crate) fn find(&self, id: RecordId) -> Option<Arc<RecordCell>> {
        self.inner.read().by_id.get(&id).cloned()
    }

    /// Lookup in *request* order. Ids with no live match are skipped, so
    /// positional correspondence holds exactly when every id is live.
    pub(crate) fn find_many(&self, ids: &[RecordId]) -> Vec<Arc<RecordCell>> {
        let inner = self.inner.read();
        ids.iter()
            .filter_map(|id| inner.by_id.get(id).cloned())
            .collect()
    }

    pub(crate) fn count(&self) -> usize {
        self.inner.read().order.len()
    }

    pub(crate) fn first(&self) -> Option<Arc<RecordCell>> {
        self.inner.read().order.first().cloned()
    }

    pub(crate) fn last(&self) -> Option<Arc<RecordCell>> {
        self.inner.read().order.last().cloned()
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("model", &self.def.name())
            .field("count", &self.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relata_core::{SerialIds, Value};

    fn store() -> RecordStore {
        let def = Arc::new(ModelDef::builder("Widget").attribute("label").build());
        RecordStore::new(def, Arc::new(SerialIds::new()))
    }

    fn cell_with(store: &RecordStore, label: &str) -> Arc<RecordCell> {
        let id = store.next_id();
        let mut values = store.def().fresh_values();
        let slot = store.def().slot("label").unwrap();
        values[slot] = Value::from(label);
        RecordCell::new(id, Arc::clone(store.def()), values)
    }

    #[test]
    fn insert_preserves_insertion_order() {
        let store = store();
        for label in ["a", "b", "c"] {
            store.insert(cell_with(&store, label)).unwrap();
        }
        let labels: Vec<_> = store
            .all()
            .iter()
            .map(|c| c.get("label").unwrap())
            .collect();
        assert_eq!(labels, vec![Value::from("a"), Value::from("b"), Value::from("c")]);
        assert_eq!(store.first().unwrap().get("label").unwrap(), Value::from("a"));
        assert_eq!(store.last().unwrap().get("label").unwrap(), Value::from("c"));
    }

    #[test]
    fn duplicate_id_insert_fails_and_leaves_store_untouched() {
        let store = store();
        let cell = cell_with(&store, "a");
        let dup = RecordCell::new(cell.id(), Arc::clone(store.def()), store.def().fresh_values());
        store.insert(cell).unwrap();
        let err = store.insert(dup).unwrap_err();
        assert!(matches!(err, RelataError::DuplicateId { .. }));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn remove_freezes_and_is_idempotent() {
        let store = store();
        let cell = cell_with(&store, "a");
        let id = cell.id();
        store.insert(cell).unwrap();

        let removed = store.remove(id).unwrap();
        assert!(removed.is_frozen());
        assert_eq!(store.count(), 0);
        assert!(store.find(id).is_none());

        // Second remove is a no-op.
        assert!(store.remove(id).is_none());
    }

    #[test]
    fn find_many_follows_request_order_and_skips_missing() {
        let store = store();
        let a = cell_with(&store, "a");
        let b = cell_with(&store, "b");
        let (id_a, id_b) = (a.id(), b.id());
        store.insert(a).unwrap();
        store.insert(b).unwrap();

        let found = store.find_many(&[id_b, id_a]);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id(), id_b);
        assert_eq!(found[1].id(), id_a);

        store.remove(id_a);
        let found = store.find_many(&[id_a, id_b]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id(), id_b);
    }

    #[test]
    fn all_resnapshots_current_liveness() {
        let store = store();
        let cell = cell_with(&store, "a");
        let id = cell.id();
        store.insert(cell).unwrap();
        assert_eq!(store.all().len(), 1);

        store.remove(id);
        assert!(store.all().is_empty());
    }

    #[test]
    fn clear_freezes_everything() {
        let store = store();
        let cells: Vec<_> = ["a", "b"].into_iter().map(|l| cell_with(&store, l)).collect();
        for cell in &cells {
            store.insert(Arc::clone(cell)).unwrap();
        }
        assert_eq!(store.clear(), 2);
        assert_eq!(store.count(), 0);
        assert!(cells.iter().all(|c| c.is_frozen()));
        // Clearing an empty store is fine.
        assert_eq!(store.clear(), 0);
    }
}
