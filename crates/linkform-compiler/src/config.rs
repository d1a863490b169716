//! Cache sizing knobs.

/// Sizing of the caches owned by a [`FormContext`](crate::FormContext).
///
/// Eviction policy never affects correctness; these only bound memory.
#[derive(Clone, Copy, Debug)]
pub struct CacheConfig {
    /// Derived forms kept alive by the soft retainer (default: 1,024).
    pub(crate) form_retention: usize,
    /// Handles kept alive by the soft retainer (default: 256).
    pub(crate) handle_retention: usize,
    /// Entries in a form's transform array before it becomes a map (default: 16).
    pub(crate) transform_array_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            form_retention: 1024,
            handle_retention: 256,
            transform_array_size: 16,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many derived forms stay strongly reachable. Zero disables retention.
    pub fn form_retention(mut self, count: usize) -> Self {
        self.form_retention = count;
        self
    }

    /// Set how many cached handles stay strongly reachable.
    pub fn handle_retention(mut self, count: usize) -> Self {
        self.handle_retention = count;
        self
    }

    /// Set the per-form transform array capacity (at least 1).
    pub fn transform_array_size(mut self, size: usize) -> Self {
        self.transform_array_size = size.max(1);
        self
    }

    pub fn get_form_retention(&self) -> usize {
        self.form_retention
    }
    pub fn get_handle_retention(&self) -> usize {
        self.handle_retention
    }
    pub fn get_transform_array_size(&self) -> usize {
        self.transform_array_size
    }
}
