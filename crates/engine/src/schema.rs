//! Model metadata: attribute schema, association definitions, named scopes,
//! and after-create hooks.
//!
//! A [`ModelDef`] is established once, at model definition time, through
//! [`ModelBuilder`]. Association accessors, scope lookup, and hook lists are
//! all fixed tables resolved by name; there is no runtime method synthesis
//! and no ancestor-chain walking. Single-level inheritance is handled by
//! [`ModelBuilder::extends`], which copies the ancestor's schema, scopes,
//! and hook list into the new builder before the descendant adds its own.

use crate::query::Query;
use crate::record::Record;
use relata_core::{RelataResult, Value};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Reserved attribute holding the record identifier. Always slot 0.
pub const ID_ATTR: &str = "id";

/// An after-create hook body.
pub type HookFn = Arc<dyn Fn(&Record) -> RelataResult<()> + Send + Sync>;

/// A scope body: a pure transform from (query, args) to a new query.
pub type ScopeFn = Arc<dyn Fn(Query, &[Value]) -> Query + Send + Sync>;

/// After-create hook entry.
///
/// `Named` hooks are inheritable by reference: a descendant that registers a
/// `Named` hook with the same name replaces the inherited entry in place,
/// keeping its slot in the invocation order.
#[derive(Clone)]
pub enum AfterCreate {
    Named { name: &'static str, run: HookFn },
    Inline { run: HookFn },
}

impl AfterCreate {
    /// Label used in hook-failure errors.
    pub fn label(&self) -> &str {
        match self {
            AfterCreate::Named { name, .. } => name,
            AfterCreate::Inline { .. } => "<inline>",
        }
    }

    pub(crate) fn invoke(&self, record: &Record) -> RelataResult<()> {
        match self {
            AfterCreate::Named { run, .. } | AfterCreate::Inline { run } => (**run)(record),
        }
    }
}

impl fmt::Debug for AfterCreate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AfterCreate").field(&self.label()).finish()
    }
}

/// Association kind plus the attribute(s) realizing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssocKind {
    /// The foreign key lives on this model.
    BelongsTo { foreign_key: String },
    /// The foreign key lives on the target model; reads collapse to one.
    HasOne { foreign_key: String },
    /// The foreign key lives on the target model.
    HasMany { foreign_key: String },
    /// Two hops: resolve `via` on this model, then `source` on each
    /// intermediate.
    HasManyThrough { via: String, source: String },
    /// Direct many-to-many: each side keeps an ordered id list of the other.
    ManyToMany { own_ids: String, target_ids: String },
}

/// One declared association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssocDef {
    /// Accessor name (`children`, `dog`, `roles`, ...).
    pub name: String,
    /// Target model name.
    pub target: String,
    pub kind: AssocKind,
}

impl AssocDef {
    /// True when traversal yields a collection rather than at most one.
    pub fn is_to_many(&self) -> bool {
        matches!(
            self.kind,
            AssocKind::HasMany { .. }
                | AssocKind::HasManyThrough { .. }
                | AssocKind::ManyToMany { .. }
        )
    }
}

/// Immutable per-model metadata.
pub struct ModelDef {
    name: String,
    attr_names: Vec<String>,
    defaults: Vec<Value>,
    slots: FxHashMap<String, usize>,
    assocs: Vec<AssocDef>,
    assoc_slots: FxHashMap<String, usize>,
    scopes: Vec<(String, ScopeFn)>,
    scope_slots: FxHashMap<String, usize>,
    hooks: Vec<AfterCreate>,
}

impl ModelDef {
    /// Start building a model definition. The reserved `id` attribute is
    /// installed at slot 0.
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        let mut builder = ModelBuilder {
            name: name.into(),
            attr_names: Vec::new(),
            defaults: Vec::new(),
            slots: FxHashMap::default(),
            assocs: Vec::new(),
            assoc_slots: FxHashMap::default(),
            scopes: Vec::new(),
            scope_slots: FxHashMap::default(),
            hooks: Vec::new(),
        };
        builder.install_attr(ID_ATTR, Value::Null);
        builder
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute names in schema order, `id` first.
    pub fn attr_names(&self) -> &[String] {
        &self.attr_names
    }

    /// Slot index for an attribute name.
    pub fn slot(&self, attr: &str) -> Option<usize> {
        self.slots.get(attr).copied()
    }

    /// Fresh default values in schema order (slot 0 is overwritten with the
    /// identifier at creation).
    pub(crate) fn fresh_values(&self) -> Vec<Value> {
        self.defaults.clone()
    }

    pub fn assoc(&self, name: &str) -> Option<&AssocDef> {
        self.assoc_slots.get(name).map(|&i| &self.assocs[i])
    }

    pub fn assocs(&self) -> &[AssocDef] {
        &self.assocs
    }

    pub fn scope_fn(&self, name: &str) -> Option<&ScopeFn> {
        self.scope_slots.get(name).map(|&i| &self.scopes[i].1)
    }

    /// Declared scope names, in definition order.
    pub fn scope_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.scopes.iter().map(|(n, _)| n.as_str())
    }

    pub fn hooks(&self) -> &[AfterCreate] {
        &self.hooks
    }
}

impl fmt::Debug for ModelDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDef")
            .field("name", &self.name)
            .field("attrs", &self.attr_names)
            .field("assocs", &self.assocs.iter().map(|a| &a.name).collect::<Vec<_>>())
            .field("scopes", &self.scopes.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("hooks", &self.hooks)
            .finish()
    }
}

/// Builder for [`ModelDef`]. Declaring an association installs the
/// attribute(s) that realize it on this side.
pub struct ModelBuilder {
    name: String,
    attr_names: Vec<String>,
    defaults: Vec<Value>,
    slots: FxHashMap<String, usize>,
    assocs: Vec<AssocDef>,
    assoc_slots: FxHashMap<String, usize>,
    scopes: Vec<(String, ScopeFn)>,
    scope_slots: FxHashMap<String, usize>,
    hooks: Vec<AfterCreate>,
}

impl ModelBuilder {
    fn install_attr(&mut self, name: &str, default: Value) {
        match self.slots.get(name) {
            Some(&slot) => self.defaults[slot] = default,
            None => {
                self.slots.insert(name.to_string(), self.attr_names.len());
                self.attr_names.push(name.to_string());
                self.defaults.push(default);
            }
        }
    }

    fn install_assoc(&mut self, def: AssocDef) {
        match self.assoc_slots.get(&def.name) {
            Some(&slot) => self.assocs[slot] = def,
            None => {
                self.assoc_slots.insert(def.name.clone(), self.assocs.len());
                self.assocs.push(def);
            }
        }
    }

    /// Declare an attribute with a `Null` default.
    pub fn attribute(mut self, name: impl AsRef<str>) -> Self {
        self.install_attr(name.as_ref(), Value::Null);
        self
    }

    /// Declare an attribute with an explicit default.
    pub fn attribute_default(mut self, name: impl AsRef<str>, default: impl Into<Value>) -> Self {
        self.install_attr(name.as_ref(), default.into());
        self
    }

    /// This model holds `foreign_key` pointing at one `target` record.
    pub fn belongs_to(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        let foreign_key = foreign_key.into();
        self.install_attr(&foreign_key, Value::Null);
        self.install_assoc(AssocDef {
            name: name.into(),
            target: target.into(),
            kind: AssocKind::BelongsTo { foreign_key },
        });
        self
    }

    /// One `target` record holds `foreign_key` pointing back at this model.
    pub fn has_one(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.install_assoc(AssocDef {
            name: name.into(),
            target: target.into(),
            kind: AssocKind::HasOne {
                foreign_key: foreign_key.into(),
            },
        });
        self
    }

    /// Many `target` records hold `foreign_key` pointing back at this model.
    pub fn has_many(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.install_assoc(AssocDef {
            name: name.into(),
            target: target.into(),
            kind: AssocKind::HasMany {
                foreign_key: foreign_key.into(),
            },
        });
        self
    }

    /// Two-hop association: traverse `via` on this model, then `source` on
    /// each intermediate, collecting `target` records.
    pub fn has_many_through(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        via: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        self.install_assoc(AssocDef {
            name: name.into(),
            target: target.into(),
            kind: AssocKind::HasManyThrough {
                via: via.into(),
                source: source.into(),
            },
        });
        self
    }

    /// Direct many-to-many: this side stores target ids under `own_ids`,
    /// the target side stores this model's ids under `target_ids`.
    pub fn many_to_many(
        mut self,
        name: impl Into<String>,
        target: impl Into<String>,
        own_ids: impl Into<String>,
        target_ids: impl Into<String>,
    ) -> Self {
        let own_ids = own_ids.into();
        self.install_attr(&own_ids, Value::IdList(Vec::new()));
        self.install_assoc(AssocDef {
            name: name.into(),
            target: target.into(),
            kind: AssocKind::ManyToMany {
                own_ids,
                target_ids: target_ids.into(),
            },
        });
        self
    }

    /// Register a named scope.
    pub fn scope(
        mut self,
        name: impl Into<String>,
        f: impl Fn(Query, &[Value]) -> Query + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        let f: ScopeFn = Arc::new(f);
        match self.scope_slots.get(&name) {
            Some(&slot) => self.scopes[slot].1 = f,
            None => {
                self.scope_slots.insert(name.clone(), self.scopes.len());
                self.scopes.push((name, f));
            }
        }
        self
    }

    /// Append an inline after-create hook.
    pub fn after_create(
        mut self,
        f: impl Fn(&Record) -> RelataResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.hooks.push(AfterCreate::Inline { run: Arc::new(f) });
        self
    }

    /// Append a named after-create hook. Redefining a name inherited via
    /// [`extends`](Self::extends) replaces the inherited entry in place.
    pub fn after_create_named(
        mut self,
        name: &'static str,
        f: impl Fn(&Record) -> RelataResult<()> + Send + Sync + 'static,
    ) -> Self {
        let run: HookFn = Arc::new(f);
        let existing = self.hooks.iter_mut().find(|h| match h {
            AfterCreate::Named { name: n, .. } => *n == name,
            AfterCreate::Inline { .. } => false,
        });
        match existing {
            Some(slot) => *slot = AfterCreate::Named { name, run },
            None => self.hooks.push(AfterCreate::Named { name, run }),
        }
        self
    }

    /// Drop every hook accumulated so far (inherited ones included).
    pub fn clear_after_create(mut self) -> Self {
        self.hooks.clear();
        self
    }

    /// Single-level inheritance: copy the ancestor's attributes, defaults,
    /// associations, scopes, and hook list. Entries the descendant already
    /// declared are kept. Resolved here, once; creation never walks an
    /// ancestor chain.
    pub fn extends(mut self, ancestor: &ModelDef) -> Self {
        for (slot, name) in ancestor.attr_names.iter().enumerate() {
            if !self.slots.contains_key(name) {
                self.install_attr(name, ancestor.defaults[slot].clone());
            }
        }
        for assoc in &ancestor.assocs {
            if !self.assoc_slots.contains_key(&assoc.name) {
                self.install_assoc(assoc.clone());
            }
        }
        for (name, f) in &ancestor.scopes {
            if !self.scope_slots.contains_key(name) {
                self.scope_slots.insert(name.clone(), self.scopes.len());
                self.scopes.push((name.clone(), Arc::clone(f)));
            }
        }
        self.hooks.extend(ancestor.hooks.iter().cloned());
        self
    }

    pub fn build(self) -> ModelDef {
        ModelDef {
            name: self.name,
            attr_names: self.attr_names,
            defaults: self.defaults,
            slots: self.slots,
            assocs: self.assocs,
            assoc_slots: self.assoc_slots,
            scopes: self.scopes,
            scope_slots: self.scope_slots,
            hooks: self.hooks,
        }
    }
}
