//! Records: one entity instance plus its handle type.
//!
//! The store owns the live data ([`RecordCell`]); a [`Record`] is a cheap
//! cloneable handle pairing a cell with the database it lives in, so
//! association traversal can reach other models' stores. Handles stay valid
//! after destroy, but the cell is frozen: reads still work, writes fail,
//! and no query or traversal returns the record again.

use crate::database::Database;
use crate::schema::{ModelDef, ID_ATTR};
use relata_core::{Attrs, RecordId, RelataError, RelataResult, Value};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Store-owned record state.
pub(crate) struct RecordCell {
    id: RecordId,
    def: Arc<ModelDef>,
    /// Values parallel to the schema's slot order; slot 0 is the id.
    values: RwLock<Vec<Value>>,
    frozen: AtomicBool,
}

impl RecordCell {
    pub(crate) fn new(id: RecordId, def: Arc<ModelDef>, mut values: Vec<Value>) -> Arc<Self> {
        values[0] = Value::Id(id);
        Arc::new(Self {
            id,
            def,
            values: RwLock::new(values),
            frozen: AtomicBool::new(false),
        })
    }

    pub(crate) fn id(&self) -> RecordId {
        self.id
    }

    pub(crate) fn def(&self) -> &Arc<ModelDef> {
        &self.def
    }

    pub(crate) fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub(crate) fn freeze(&self) {
        self.frozen.store(true, Ordering::Release);
    }

    pub(crate) fn get(&self, attr: &str) -> Option<Value> {
        let slot = self.def.slot(attr)?;
        Some(self.values.read()[slot].clone())
    }

    /// Write one attribute. The id slot is immutable; frozen cells reject
    /// every write; unknown names are schema errors.
    pub(crate) fn set(&self, attr: &str, value: Value) -> RelataResult<()> {
        if attr == ID_ATTR {
            return Err(RelataError::ImmutableId {
                model: self.def.name().to_string(),
                id: self.id,
            });
        }
        let slot = self.def.slot(attr).ok_or_else(|| RelataError::UnknownAttribute {
            model: self.def.name().to_string(),
            attr: attr.to_string(),
        })?;
        if self.is_frozen() {
            return Err(RelataError::FrozenRecord {
                model: self.def.name().to_string(),
                id: self.id,
            });
        }
        self.values.write()[slot] = value;
        Ok(())
    }

    /// `(name, value)` pairs in schema order, id first.
    pub(crate) fn snapshot(&self) -> Vec<(String, Value)> {
        let values = self.values.read();
        self.def
            .attr_names()
            .iter()
            .cloned()
            .zip(values.iter().cloned())
            .collect()
    }
}

/// Handle to one live (or destroyed-and-frozen) record.
#[derive(Clone)]
pub struct Record {
    pub(crate) db: Database,
    pub(crate) cell: Arc<RecordCell>,
}

impl Record {
    pub(crate) fn new(db: Database, cell: Arc<RecordCell>) -> Self {
        Self { db, cell }
    }

    pub fn id(&self) -> RecordId {
        self.cell.id()
    }

    pub fn model_name(&self) -> &str {
        self.cell.def().name()
    }

    pub(crate) fn def(&self) -> &Arc<ModelDef> {
        self.cell.def()
    }

    /// Read an attribute. `None` for names outside the schema.
    pub fn get(&self, attr: &str) -> Option<Value> {
        self.cell.get(attr)
    }

    /// Write an attribute.
    pub fn set(&self, attr: &str, value: impl Into<Value>) -> RelataResult<()> {
        self.cell.set(attr, value.into())
    }

    /// Write several attributes, left to right. Stops at the first error.
    pub fn update(&self, attrs: Attrs) -> RelataResult<()> {
        for (name, value) in attrs.iter() {
            self.cell.set(name, value.clone())?;
        }
        Ok(())
    }

    /// The ordered attribute mapping: `(name, value)` pairs in schema
    /// order with `id` first. This is the enumeration contract consumed by
    /// formatters and inspectors.
    pub fn attributes(&self) -> Vec<(String, Value)> {
        self.cell.snapshot()
    }

    /// Render the attribute mapping as JSON for diagnostics.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, value) in self.cell.snapshot() {
            map.insert(name, value.to_json());
        }
        serde_json::Value::Object(map)
    }

    /// True once the record has been removed from its store.
    pub fn is_destroyed(&self) -> bool {
        self.cell.is_frozen()
    }

    /// Remove the record from its store and freeze it. Idempotent.
    pub fn destroy(&self) -> RelataResult<()> {
        let store = self.db.store(self.model_name())?;
        store.remove(self.id());
        tracing::debug!(model = self.model_name(), id = %self.id(), "destroyed record");
        Ok(())
    }
}

impl PartialEq for Record {
    /// Identity equality: same model, same identifier.
    fn eq(&self, other: &Record) -> bool {
        self.model_name() == other.model_name() && self.id() == other.id()
    }
}

impl Eq for Record {}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct(self.model_name());
        for (name, value) in self.cell.snapshot() {
            dbg.field(&name, &value.to_string());
        }
        dbg.finish()
    }
}
