//! Runtime engine: handles, linkage forms and their interpretation.
//!
//! Handles never execute Rust code of their own. Everything a handle does
//! is spelled out in its form; the [`Interpreter`] applies intrinsics and
//! defers member calls, primitives and class initialization to the [`Host`].

mod adapters;
mod direct;
mod error;
mod handle;
mod host;
mod init_barrier;
mod interpreter;
mod invokers;
mod runtime;
mod trace;
mod value;

#[cfg(test)]
mod direct_tests;
#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod value_tests;

pub use direct::{DirectMethodHandle, MemberName};
pub use error::{Result, RuntimeError};
pub use handle::{HandleData, MethodHandle};
pub use host::{Host, SimpleHost, SimpleHostBuilder};
pub use init_barrier::{ClassInitTable, InitStatus};
pub use interpreter::Interpreter;
pub use invokers::Invokers;
pub use runtime::{ExecLimits, Runtime, RuntimeBuilder};
pub use trace::{NoopTracer, PrintTracer, Tracer, Verbosity};
pub use value::{Array, Instance, Value};
