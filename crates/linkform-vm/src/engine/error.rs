//! Errors that can occur while invoking handles.

use linkform_compiler::FormError;
use linkform_core::{BasicType, ClassKey, MethodType, TypeError};

#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    /// Execution fuel exhausted (too many evaluated expressions).
    #[error("runtime execution limit exceeded")]
    ExecFuelExhausted,

    /// Too many nested form invocations.
    #[error("runtime recursion limit exceeded")]
    RecursionLimitExceeded,

    /// An exact invocation or type adaptation saw an incompatible handle type.
    #[error("wrong method type: expected {expected}, found {found}")]
    WrongMethodType {
        expected: MethodType,
        found: MethodType,
    },

    #[error("expected {expected} arguments, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("argument {position} has basic type {found}, expected {expected}")]
    ArgumentType {
        position: usize,
        expected: BasicType,
        found: BasicType,
    },

    /// A spread array does not hold the number of elements the form consumes.
    #[error("array is not of length {expected} (length {found})")]
    SpreadLength { expected: usize, found: usize },

    #[error("null value in {operation}")]
    NullPointer { operation: &'static str },

    #[error("cannot use {found} as {expected}")]
    ClassCast {
        expected: &'static str,
        found: String,
    },

    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds { index: i64, length: usize },

    #[error("initialization of {class} failed: {reason}")]
    ClassInitFailed { class: ClassKey, reason: String },

    #[error("unknown primitive `{0}`")]
    UnknownPrimitive(String),

    #[error("unknown member {class}.{name}")]
    UnknownMember { class: ClassKey, name: String },

    #[error("invalid argument reordering: {reason}")]
    InvalidReorder { reason: String },

    /// Failure reported by host code.
    #[error("{0}")]
    Host(String),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
