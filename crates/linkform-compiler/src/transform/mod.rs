//! Transform keys and the per-form derived-form cache.

mod cache;
mod key;

#[cfg(test)]
mod cache_tests;

pub use cache::TransformCache;
pub use key::{TransformKey, TransformKind};
