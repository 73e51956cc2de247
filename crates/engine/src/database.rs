//! The database: a registry of model stores.
//!
//! One `Database` is constructed at process start and referenced explicitly
//! by every model, record, and query handle; there is no ambient global.
//! Cloning a handle is cheap (`Arc` inside); all clones see the same data.
//!
//! `drop_all` is the process-wide reset used by test harnesses: it clears
//! every registered model's store in one pass, leaving each store
//! empty-but-initialized (definitions and id generators stay in place).

use crate::model::Model;
use crate::schema::ModelDef;
use crate::store::RecordStore;
use dashmap::DashMap;
use relata_core::{IdGenerator, RelataError, RelataResult, SerialIds};
use std::sync::Arc;

/// Handle to the store registry. Clone freely; all clones share state.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DbInner>,
}

struct DbInner {
    models: DashMap<String, Arc<RecordStore>>,
}

impl Database {
    /// Create an empty database with no models registered.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DbInner {
                models: DashMap::new(),
            }),
        }
    }

    /// Register a model with the default serial id generator.
    pub fn define(&self, def: ModelDef) -> RelataResult<Model> {
        self.define_with_ids(def, Arc::new(SerialIds::new()))
    }

    /// Register a model with an explicit id generation strategy.
    pub fn define_with_ids(
        &self,
        def: ModelDef,
        ids: Arc<dyn IdGenerator>,
    ) -> RelataResult<Model> {
        let name = def.name().to_string();
        if self.inner.models.contains_key(&name) {
            return Err(RelataError::ModelExists(name));
        }
        let def = Arc::new(def);
        let store = Arc::new(RecordStore::new(Arc::clone(&def), ids));
        self.inner.models.insert(name.clone(), Arc::clone(&store));
        tracing::debug!(model = %name, "defined model");
        Ok(Model::new(self.clone(), store))
    }

    /// Look up a registered model by name.
    pub fn model(&self, name: &str) -> RelataResult<Model> {
        let store = self.store(name)?;
        Ok(Model::new(self.clone(), store))
    }

    /// Names of every registered model, sorted for determinism.
    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .models
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Clear every model's store. Records become frozen and unreachable;
    /// model definitions stay registered. Safe to call when already empty.
    pub fn drop_all(&self) {
        let mut removed = 0;
        for entry in self.inner.models.iter() {
            removed += entry.value().clear();
        }
        tracing::debug!(records = removed, "dropped all stores");
    }

    /// Total live records across every model.
    pub fn total_records(&self) -> usize {
        self.inner
            .models
            .iter()
            .map(|entry| entry.value().count())
            .sum()
    }

    pub(crate) fn store(&self, name: &str) -> RelataResult<Arc<RecordStore>> {
        self.inner
            .models
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| RelataError::UnknownModel(name.to_string()))
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("models", &self.model_names())
            .field("total_records", &self.total_records())
            .finish()
    }
}
