//! Per-form cache of derived forms.
//!
//! The cache grows through three shapes: a single entry, a small array,
//! then a concurrent map. Each shape is published as an immutable snapshot
//! through an atomic pointer, so lookups never wait on a writer. Entries
//! hold derived forms weakly; a stale entry is overwritten by the next
//! insertion under the same key.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use arc_swap::ArcSwap;
use dashmap::DashMap;

use super::TransformKey;
use crate::form::LambdaForm;

#[derive(Clone)]
struct Entry {
    key: TransformKey,
    form: Weak<LambdaForm>,
}

impl Entry {
    fn new(key: TransformKey, form: &Arc<LambdaForm>) -> Self {
        Self {
            key,
            form: Arc::downgrade(form),
        }
    }

    fn is_stale(&self) -> bool {
        self.form.strong_count() == 0
    }
}

/// Published snapshots are never mutated, except through the map's own
/// sharded entries once the cache has grown into one.
enum CacheState {
    Empty,
    Single(Entry),
    Array(Vec<Entry>),
    Map(DashMap<TransformKey, Weak<LambdaForm>>),
}

pub struct TransformCache {
    state: ArcSwap<CacheState>,
    /// Serializes writers below the map stage. Readers never take it.
    writer: Mutex<()>,
}

impl Default for TransformCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformCache {
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(CacheState::Empty),
            writer: Mutex::new(()),
        }
    }

    /// The live form cached under `key`.
    pub fn get(&self, key: &TransformKey) -> Option<Arc<LambdaForm>> {
        let state = self.state.load();
        match &**state {
            CacheState::Empty => None,
            CacheState::Single(entry) => (entry.key == *key).then(|| entry.form.upgrade())?,
            CacheState::Array(entries) => entries
                .iter()
                .find(|e| e.key == *key)
                .and_then(|e| e.form.upgrade()),
            CacheState::Map(map) => map.get(key).and_then(|w| w.upgrade()),
        }
    }

    /// Publish `form` under `key` unless a live form is already there.
    ///
    /// Returns whichever form is cached afterwards: the earlier live form
    /// if one won the race, otherwise `form`.
    pub fn put(
        &self,
        key: TransformKey,
        form: Arc<LambdaForm>,
        array_capacity: usize,
    ) -> Arc<LambdaForm> {
        if let CacheState::Map(map) = &**self.state.load() {
            return publish_in_map(map, key, form);
        }
        let _writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.state.load_full();
        let next = match &*current {
            CacheState::Empty => CacheState::Single(Entry::new(key, &form)),
            CacheState::Single(entry) => {
                if entry.key == key {
                    if let Some(prev) = entry.form.upgrade() {
                        return prev;
                    }
                    CacheState::Single(Entry::new(key, &form))
                } else if entry.is_stale() {
                    CacheState::Single(Entry::new(key, &form))
                } else {
                    CacheState::Array(vec![entry.clone(), Entry::new(key, &form)])
                }
            }
            CacheState::Array(entries) => {
                let mut entries = entries.clone();
                if let Some(entry) = entries.iter_mut().find(|e| e.key == key) {
                    if let Some(prev) = entry.form.upgrade() {
                        return prev;
                    }
                    entry.form = Arc::downgrade(&form);
                    CacheState::Array(entries)
                } else if let Some(stale) = entries.iter_mut().find(|e| e.is_stale()) {
                    *stale = Entry::new(key, &form);
                    CacheState::Array(entries)
                } else if entries.len() < array_capacity {
                    entries.push(Entry::new(key, &form));
                    CacheState::Array(entries)
                } else {
                    let map: DashMap<_, _> =
                        entries.into_iter().map(|e| (e.key, e.form)).collect();
                    map.insert(key, Arc::downgrade(&form));
                    CacheState::Map(map)
                }
            }
            CacheState::Map(map) => return publish_in_map(map, key, form),
        };
        self.state.store(Arc::new(next));
        form
    }

    /// Live entries.
    pub fn len(&self) -> usize {
        match &**self.state.load() {
            CacheState::Empty => 0,
            CacheState::Single(entry) => usize::from(!entry.is_stale()),
            CacheState::Array(entries) => entries.iter().filter(|e| !e.is_stale()).count(),
            CacheState::Map(map) => map.iter().filter(|e| e.value().strong_count() > 0).count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the current representation, for diagnostics.
    pub fn shape(&self) -> &'static str {
        match &**self.state.load() {
            CacheState::Empty => "empty",
            CacheState::Single(_) => "single",
            CacheState::Array(_) => "array",
            CacheState::Map(_) => "map",
        }
    }

    #[cfg(test)]
    pub(super) fn hold_writer(&self) -> std::sync::MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn publish_in_map(
    map: &DashMap<TransformKey, Weak<LambdaForm>>,
    key: TransformKey,
    form: Arc<LambdaForm>,
) -> Arc<LambdaForm> {
    let mut slot = map.entry(key).or_insert_with(Weak::new);
    if let Some(prev) = slot.upgrade() {
        return prev;
    }
    *slot = Arc::downgrade(&form);
    form
}
