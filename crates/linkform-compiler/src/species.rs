//! Carrier species: field layouts of argument-binding handles.
//!
//! A species is identified by its field letters (`""`, `"L"`, `"LI"`).
//! Every species is interned in a [`SpeciesRegistry`], so extension
//! always yields the same `Arc` for the same layout.

use std::fmt;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use linkform_core::{ARG_TYPES, BasicType};

use crate::form::{Intrinsic, NamedFunction};

pub struct Species {
    key: String,
    fields: Vec<BasicType>,
    extensions: [OnceLock<Arc<Species>>; ARG_TYPES.len()],
}

impl Species {
    fn new(fields: Vec<BasicType>) -> Self {
        Self {
            key: BasicType::chars(&fields),
            fields,
            extensions: Default::default(),
        }
    }

    /// Field letters, e.g. `"LI"`.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field_type(&self, index: usize) -> BasicType {
        self.fields[index]
    }

    pub fn fields(&self) -> &[BasicType] {
        &self.fields
    }

    /// The species with no fields.
    pub fn is_top(&self) -> bool {
        self.fields.is_empty()
    }

    /// Function that reads field `index` out of a carrier.
    pub fn getter(self: &Arc<Self>, index: usize) -> NamedFunction {
        assert!(index < self.fields.len(), "{self:?} has no field {index}");
        Intrinsic::BoundField {
            species: Arc::clone(self),
            index,
        }
        .into()
    }

    pub fn getters(self: &Arc<Self>) -> Vec<NamedFunction> {
        (0..self.fields.len()).map(|i| self.getter(i)).collect()
    }
}

impl PartialEq for Species {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Species {}

impl fmt::Debug for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Species[{}]", self.key)
    }
}

/// Interning table of species.
pub struct SpeciesRegistry {
    top: Arc<Species>,
    by_key: DashMap<String, Arc<Species>>,
}

impl Default for SpeciesRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SpeciesRegistry {
    pub fn new() -> Self {
        let top = Arc::new(Species::new(Vec::new()));
        let by_key = DashMap::new();
        by_key.insert(String::new(), Arc::clone(&top));
        Self { top, by_key }
    }

    pub fn top(&self) -> Arc<Species> {
        Arc::clone(&self.top)
    }

    /// Look up or create the species with these fields.
    pub fn species(&self, fields: &[BasicType]) -> Arc<Species> {
        debug_assert!(fields.iter().all(|t| t.is_arg()));
        let key = BasicType::chars(fields);
        if let Some(found) = self.by_key.get(&key) {
            return Arc::clone(&found);
        }
        let created = Arc::new(Species::new(fields.to_vec()));
        Arc::clone(self.by_key.entry(key).or_insert(created).value())
    }

    /// `base` with one more trailing field of type `bt`.
    pub fn extend(&self, base: &Arc<Species>, bt: BasicType) -> Arc<Species> {
        assert!(bt.is_arg(), "cannot extend {base:?} with V");
        base.extensions[bt.ordinal() as usize]
            .get_or_init(|| {
                let mut fields = base.fields.clone();
                fields.push(bt);
                self.species(&fields)
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
