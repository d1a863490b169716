//! Forms: names, functions and the immutable `LambdaForm`.

mod builder;
mod dump;
mod function;
mod lambda_form;
mod name;
mod verify;


pub use builder::FormBuilder;
pub use function::{DispatchKind, Intrinsic, NamedFunction};
pub use lambda_form::{FormKind, LambdaForm};
pub use name::{Arg, Args, Constant, Expr, Name, NameIndex};
