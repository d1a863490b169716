//! The shared engine state: registries, retainers and statistics.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use linkform_core::MethodType;

use crate::config::CacheConfig;
use crate::editor::LambdaFormEditor;
use crate::form::LambdaForm;
use crate::soft::SoftRetainer;
use crate::species::SpeciesRegistry;
use crate::type_form::{AnyHandle, MethodTypeForm, TypeFormRegistry};

/// Owns every cache the engine consults. Safe to share across threads.
pub struct FormContext {
    config: CacheConfig,
    species: SpeciesRegistry,
    types: TypeFormRegistry,
    form_retainer: Arc<SoftRetainer<LambdaForm>>,
    handle_retainer: Arc<SoftRetainer<AnyHandle>>,
    stats: EditorStats,
}

impl Default for FormContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FormContext {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        let form_retainer = Arc::new(SoftRetainer::new(config.form_retention));
        let handle_retainer = Arc::new(SoftRetainer::new(config.handle_retention));
        Self {
            config,
            species: SpeciesRegistry::new(),
            types: TypeFormRegistry::new(Arc::clone(&form_retainer), Arc::clone(&handle_retainer)),
            form_retainer,
            handle_retainer,
            stats: EditorStats::default(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn species(&self) -> &SpeciesRegistry {
        &self.species
    }

    pub fn stats(&self) -> &EditorStats {
        &self.stats
    }

    /// Editor deriving forms from `form`.
    pub fn editor(&self, form: &Arc<LambdaForm>) -> LambdaFormEditor<'_> {
        LambdaFormEditor::new(self, form)
    }

    /// Shape data and caches of `mt`'s erasure.
    pub fn type_form(&self, mt: &MethodType) -> Arc<MethodTypeForm> {
        self.types.find(mt)
    }

    pub fn type_forms(&self) -> &TypeFormRegistry {
        &self.types
    }

    pub fn retain_form(&self, form: &Arc<LambdaForm>) {
        self.form_retainer.retain(form);
    }

    pub fn retain_handle(&self, handle: &Arc<AnyHandle>) {
        self.handle_retainer.retain(handle);
    }

    pub fn retained_forms(&self) -> usize {
        self.form_retainer.len()
    }

    /// Release every softly retained value; weakly cached entries whose
    /// values are no longer referenced become stale.
    pub fn release_retained(&self) {
        self.form_retainer.clear();
        self.handle_retainer.clear();
    }
}

/// Counters of transform cache traffic.
#[derive(Default)]
pub struct EditorStats {
    lookups: AtomicU64,
    hits: AtomicU64,
    published: AtomicU64,
    lost_races: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub lookups: u64,
    pub hits: u64,
    pub published: u64,
    pub lost_races: u64,
}

impl EditorStats {
    pub(crate) fn record_lookup(&self, hit: bool) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        if hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_publish(&self, won: bool) {
        let counter = if won { &self.published } else { &self.lost_races };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            lookups: self.lookups.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            lost_races: self.lost_races.load(Ordering::Relaxed),
        }
    }
}
