//! Errors raised while constructing or parsing types.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// The signature needs more argument slots than the representation supports.
    #[error("too many arguments: {slots} slots exceeds the limit of {limit}")]
    TooManyArguments { slots: usize, limit: usize },

    /// `void` may only appear as a return type.
    #[error("parameter {index} has type void")]
    VoidParameter { index: usize },

    /// Malformed signature text.
    #[error("cannot parse signature `{input}`: {reason}")]
    Parse { input: String, reason: String },
}

pub type Result<T> = std::result::Result<T, TypeError>;
