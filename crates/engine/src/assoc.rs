//! Association resolution: traversal, creation-through, and linkage.
//!
//! Every association read is expressed as a lookup or query against the
//! target model's store:
//! - `BelongsTo` → `target.find(self.fk)`
//! - `HasOne` / `HasMany` → `target.filter_eq(fk, self.id)`
//! - `HasManyThrough` → the two hops composed, encounter-ordered and
//!   deduplicated by identity
//! - `ManyToMany` → `target.find_many(self.own_ids)` (request order)
//!
//! Reads tolerate destroyed referents by yielding none/empty. Writes that
//! take a record handle type-check the target model and fail fast with
//! `WrongModel`. The dual-sided id-list append updates both records as one
//! logical operation.

use crate::model::create_record;
use crate::query::Query;
use crate::record::Record;
use crate::schema::{AssocDef, AssocKind, ID_ATTR};
use relata_core::{Attrs, RecordId, RelataError, RelataResult, Value};
use rustc_hash::FxHashSet;
use std::sync::Arc;

impl Record {
    fn assoc_def(&self, name: &str) -> RelataResult<AssocDef> {
        self.def()
            .assoc(name)
            .cloned()
            .ok_or_else(|| RelataError::UnknownAssociation {
                model: self.model_name().to_string(),
                name: name.to_string(),
            })
    }

    fn target_query(&self, assoc: &AssocDef) -> RelataResult<Query> {
        let store = self.db.store(&assoc.target)?;
        Ok(Query::new(self.db.clone(), Arc::clone(store.def())))
    }

    /// Resolve an association to its record collection. To-one kinds yield
    /// zero or one element.
    pub fn related(&self, name: &str) -> RelataResult<Vec<Record>> {
        let assoc = self.assoc_def(name)?;
        match &assoc.kind {
            AssocKind::BelongsTo { foreign_key } => {
                let store = self.db.store(&assoc.target)?;
                let found = self
                    .get(foreign_key)
                    .and_then(|v| v.as_id())
                    .and_then(|id| store.find(id))
                    .map(|cell| Record::new(self.db.clone(), cell));
                Ok(found.into_iter().collect())
            }
            AssocKind::HasOne { foreign_key } | AssocKind::HasMany { foreign_key } => {
                let query = self
                    .target_query(&assoc)?
                    .filter_eq(foreign_key.clone(), self.id());
                Ok(query.all())
            }
            AssocKind::HasManyThrough { via, source } => {
                let mut seen: FxHashSet<RecordId> = FxHashSet::default();
                let mut out = Vec::new();
                for intermediate in self.related(via)? {
                    for record in intermediate.related(source)? {
                        if seen.insert(record.id()) {
                            out.push(record);
                        }
                    }
                }
                Ok(out)
            }
            AssocKind::ManyToMany { own_ids, .. } => {
                let store = self.db.store(&assoc.target)?;
                let ids: Vec<RecordId> = self
                    .get(own_ids)
                    .and_then(|v| v.as_id_list().map(|ids| ids.to_vec()))
                    .unwrap_or_default();
                Ok(store
                    .find_many(&ids)
                    .into_iter()
                    .map(|cell| Record::new(self.db.clone(), cell))
                    .collect())
            }
        }
    }

    /// Resolve to at most one record (the first, for to-many kinds).
    pub fn related_one(&self, name: &str) -> RelataResult<Option<Record>> {
        Ok(self.related(name)?.into_iter().next())
    }

    /// Identifiers of the associated records, in traversal order.
    pub fn related_ids(&self, name: &str) -> RelataResult<Vec<RecordId>> {
        Ok(self.related(name)?.iter().map(Record::id).collect())
    }

    /// The association as a chainable query against the target model.
    ///
    /// For the composed kinds (`HasManyThrough`, `ManyToMany`) the query
    /// pins the target ids resolved now; direct kinds stay fully live.
    pub fn related_query(&self, name: &str) -> RelataResult<Query> {
        let assoc = self.assoc_def(name)?;
        let query = self.target_query(&assoc)?;
        Ok(match &assoc.kind {
            AssocKind::BelongsTo { foreign_key } => {
                let fk = self.get(foreign_key).unwrap_or(Value::Null);
                query.filter_eq(ID_ATTR, fk)
            }
            AssocKind::HasOne { foreign_key } | AssocKind::HasMany { foreign_key } => {
                query.filter_eq(foreign_key.clone(), self.id())
            }
            AssocKind::HasManyThrough { .. } | AssocKind::ManyToMany { .. } => {
                let ids = self.related_ids(name)?;
                query.filter_in(ID_ATTR, ids.into_iter().map(Value::Id))
            }
        })
    }

    /// Create a target record linked through this association.
    ///
    /// - `HasOne`/`HasMany`: the target's foreign key is preset to this
    ///   record's id, so the inverse traversal returns the creator with no
    ///   separate write step.
    /// - `BelongsTo`: the target is created, then this record's foreign key
    ///   is set to it.
    /// - `HasManyThrough`: the first live intermediate is reused; with none
    ///   present the missing intermediate is constructed transitively.
    /// - `ManyToMany`: the target is created and both id lists are linked.
    pub fn create_related(&self, name: &str, attrs: Attrs) -> RelataResult<Record> {
        let assoc = self.assoc_def(name)?;
        match &assoc.kind {
            AssocKind::HasOne { foreign_key } | AssocKind::HasMany { foreign_key } => {
                let store = self.db.store(&assoc.target)?;
                let attrs = attrs.set(foreign_key.clone(), self.id());
                create_record(&self.db, store.def(), attrs)
            }
            AssocKind::BelongsTo { foreign_key } => {
                let store = self.db.store(&assoc.target)?;
                let target = create_record(&self.db, store.def(), attrs)?;
                self.set(foreign_key.as_str(), target.id())?;
                Ok(target)
            }
            AssocKind::HasManyThrough { via, source } => {
                let intermediate = match self.related_one(via)? {
                    Some(existing) => existing,
                    None => self.create_related(via, Attrs::new())?,
                };
                intermediate.create_related(source, attrs)
            }
            AssocKind::ManyToMany { target_ids, .. } => {
                let store = self.db.store(&assoc.target)?;
                // Route through the target's inverse association when it is
                // declared, so both id lists are linked before the target's
                // after-create hooks observe it.
                let inverse = store.def().assocs().iter().find_map(|a| match &a.kind {
                    AssocKind::ManyToMany { own_ids, .. } if own_ids == target_ids => {
                        Some(a.name.clone())
                    }
                    _ => None,
                });
                match inverse {
                    Some(inverse_name) => {
                        let attrs = attrs.set(inverse_name, vec![self.id()]);
                        create_record(&self.db, store.def(), attrs)
                    }
                    None => {
                        let target = create_record(&self.db, store.def(), attrs)?;
                        self.push_related(name, &target)?;
                        Ok(target)
                    }
                }
            }
        }
    }

    /// Append a record to a to-many association.
    ///
    /// `HasMany` (and `HasOne`) set the other record's foreign key; a
    /// `ManyToMany` append updates *both* id lists as one logical
    /// operation, never just one side.
    pub fn push_related(&self, name: &str, other: &Record) -> RelataResult<()> {
        let assoc = self.assoc_def(name)?;
        check_target(&assoc, other)?;
        match &assoc.kind {
            AssocKind::HasOne { foreign_key } | AssocKind::HasMany { foreign_key } => {
                other.set(foreign_key.as_str(), self.id())
            }
            AssocKind::ManyToMany {
                own_ids,
                target_ids,
            } => {
                append_link_id(self, own_ids, other.id())?;
                append_link_id(other, target_ids, self.id())
            }
            AssocKind::BelongsTo { .. } | AssocKind::HasManyThrough { .. } => {
                Err(RelataError::Unsupported {
                    model: self.model_name().to_string(),
                    name: name.to_string(),
                    operation: "appending",
                })
            }
        }
    }

    /// Assign a to-one association.
    ///
    /// `BelongsTo` rewrites this record's foreign key; replacing a link
    /// never retroactively alters the formerly-linked record. `HasOne`
    /// writes the other side's foreign key (and unlinks the current holder
    /// on `None`).
    pub fn set_related(&self, name: &str, other: Option<&Record>) -> RelataResult<()> {
        let assoc = self.assoc_def(name)?;
        if let Some(other) = other {
            check_target(&assoc, other)?;
        }
        match &assoc.kind {
            AssocKind::BelongsTo { foreign_key } => match other {
                Some(other) => self.set(foreign_key.as_str(), other.id()),
                None => self.set(foreign_key.as_str(), Value::Null),
            },
            AssocKind::HasOne { foreign_key } => match other {
                Some(other) => other.set(foreign_key.as_str(), self.id()),
                None => {
                    if let Some(current) = self.related_one(name)? {
                        current.set(foreign_key.as_str(), Value::Null)?;
                    }
                    Ok(())
                }
            },
            AssocKind::HasMany { .. }
            | AssocKind::HasManyThrough { .. }
            | AssocKind::ManyToMany { .. } => Err(RelataError::Unsupported {
                model: self.model_name().to_string(),
                name: name.to_string(),
                operation: "assignment",
            }),
        }
    }
}

fn check_target(assoc: &AssocDef, record: &Record) -> RelataResult<()> {
    if record.model_name() == assoc.target {
        Ok(())
    } else {
        Err(RelataError::WrongModel {
            expected: assoc.target.clone(),
            actual: record.model_name().to_string(),
        })
    }
}

/// Append an id to an ordered id-list attribute, keeping set semantics
/// (an id already present is not appended again).
pub(crate) fn append_link_id(record: &Record, attr: &str, id: RecordId) -> RelataResult<()> {
    let mut ids = match record.get(attr) {
        Some(Value::IdList(ids)) => ids,
        Some(Value::Null) | None => Vec::new(),
        Some(_) => {
            return Err(RelataError::InvalidValue {
                model: record.model_name().to_string(),
                attr: attr.to_string(),
                expected: "an identifier list",
            })
        }
    };
    if !ids.contains(&id) {
        ids.push(id);
        record.set(attr, Value::IdList(ids))?;
    }
    Ok(())
}
