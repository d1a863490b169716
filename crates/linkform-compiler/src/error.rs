//! Caller-visible errors of the form engine.
//!
//! Invariant violations inside the buffer and editor are assertions, not
//! errors; type mismatches, arity overflow and cache slot conflicts
//! surface here.

use linkform_core::{BasicType, MethodType, Ty, TypeError};

use crate::type_form::HandlePurpose;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// The requested edit declares a type the base form does not have.
    #[error("type mismatch at position {position}: expected {expected}, found {found}")]
    TypeMismatch {
        position: usize,
        expected: BasicType,
        found: BasicType,
    },

    /// Spreading requires an array type.
    #[error("cannot spread non-array type {ty}")]
    NotAnArray { ty: Ty },

    /// The combiner or filter signature does not fit the base form.
    #[error("incompatible combiner {combiner} for {form}")]
    IncompatibleCombiner {
        combiner: MethodType,
        form: MethodType,
    },

    /// The derived form would need more argument slots than supported.
    #[error("too many arguments: {slots} slots exceeds the limit of {limit}")]
    TooManyArguments { slots: usize, limit: usize },

    /// A live handle of another type already occupies this cache slot.
    #[error("handle slot {purpose:?} already holds a handle of another type")]
    HandleSlotConflict { purpose: HandlePurpose },

    #[error(transparent)]
    Type(#[from] TypeError),
}

pub type Result<T> = std::result::Result<T, FormError>;
