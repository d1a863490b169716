#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Method handles over lambda forms, and an interpreter that runs them.
//!
//! A [`MethodHandle`] pairs a type with a form and the data the form reads
//! (bound values or a direct member). Adapters derive new handles through
//! the form editor, so adapted forms are shared across handles.

pub mod engine;

pub use engine::{
    Array, ClassInitTable, DirectMethodHandle, ExecLimits, HandleData, Host, InitStatus,
    Instance, Interpreter, Invokers, MemberName, MethodHandle, NoopTracer, PrintTracer,
    RuntimeError, Result, Runtime, RuntimeBuilder, SimpleHost, SimpleHostBuilder, Tracer, Value,
    Verbosity,
};
