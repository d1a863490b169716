#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Lambda-form transformation and caching.
//!
//! A [`LambdaForm`] is an immutable straight-line program over typed names.
//! Handle adapters never build forms from scratch: they ask a
//! [`LambdaFormEditor`] to derive one from the target's form, and every
//! derived form is cached on its base under a compact [`TransformKey`].
//!
//! Pipeline of one derivation:
//! 1. **Lookup**: consult the base form's [`TransformCache`].
//! 2. **Edit**: open a [`LambdaFormBuffer`], apply the edit, repair references.
//! 3. **Publish**: insert into the cache; the first published form wins.
//!
//! [`MethodTypeForm`] caches linkage forms per erased signature, and the
//! [`FormContext`] owns every registry.

pub mod buffer;
pub mod config;
pub mod context;
pub mod editor;
pub mod error;
pub mod form;
pub mod soft;
pub mod species;
pub mod transform;
pub mod type_form;

#[cfg(test)]
mod editor_tests;
#[cfg(test)]
mod soft_tests;
#[cfg(test)]
mod species_tests;
#[cfg(test)]
mod test_utils;

pub use buffer::{LambdaFormBuffer, NameId};
pub use config::CacheConfig;
pub use context::{EditorStats, FormContext, StatsSnapshot};
pub use editor::LambdaFormEditor;
pub use error::{FormError, Result};
pub use form::{
    Arg, Constant, DispatchKind, FormBuilder, FormKind, Intrinsic, LambdaForm, Name, NameIndex,
    NamedFunction,
};
pub use soft::SoftRetainer;
pub use species::{Species, SpeciesRegistry};
pub use transform::{TransformCache, TransformKey, TransformKind};
pub use type_form::{
    AnyHandle, ArgCounts, FormPurpose, HandlePurpose, MethodTypeForm, SlotTable, TypeFormRegistry,
};
