#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core type vocabulary for linkform.
//!
//! Two layers:
//! - **Language types** (`Ty`, `MethodType`): what a handle's signature says,
//!   including class names, subword primitives and arrays.
//! - **Calling-convention types** (`BasicType`): the erased six-letter alphabet
//!   that forms are written in. Every `Ty` maps onto exactly one basic type.
//!
//! Erasure (`MethodType::erase`) folds every reference type to `Object`;
//! `MethodType::basic_type` additionally folds subword primitives to `int`.

mod basic_type;
mod error;
mod method_type;
mod ty;

#[cfg(test)]
mod basic_type_tests;
#[cfg(test)]
mod ty_tests;

pub use basic_type::{ARG_TYPES, BasicType};
pub use error::{Result, TypeError};
pub use method_type::{MAX_JVM_ARITY, MAX_MH_ARITY, MAX_MH_INVOKER_ARITY, MethodType};
pub use ty::{ClassKey, Ty};
