pub mod direct;
pub mod dump;
pub mod edit;
pub mod erase;
pub mod invoker;


use linkform_compiler::FormError;
use linkform_core::{MethodType, TypeError};
use linkform_vm::RuntimeError;

/// Errors reported by CLI commands.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("bad edit `{edit}`: {reason}")]
    BadEdit { edit: String, reason: String },

    /// The edit is well-formed but does not apply to the current form.
    #[error("cannot apply `{edit}`: {reason}")]
    Inapplicable { edit: String, reason: String },

    #[error("{0}")]
    Unsupported(String),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

fn parse_signature(signature: &str) -> Result<MethodType, CliError> {
    Ok(MethodType::parse(signature)?)
}

/// Print a command's output, or report its error and exit with status 1.
fn finish(result: Result<String, CliError>) {
    match result {
        Ok(out) => print!("{out}"),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
