//! The runtime: shared caches, host, class barrier and limits.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use linkform_compiler::{AnyHandle, CacheConfig, FormContext};
use linkform_core::{ClassKey, MethodType};

use super::error::{Result, RuntimeError};
use super::handle::MethodHandle;
use super::host::Host;
use super::init_barrier::{ClassInitTable, InitStatus};
use super::interpreter::Interpreter;
use super::invokers::{InvokerShape, Invokers, invoker_form};
use super::trace::{NoopTracer, Tracer};
use super::value::Value;

/// Limits of one top-level invocation.
#[derive(Clone, Copy, Debug)]
pub struct ExecLimits {
    /// Maximum evaluated expressions (default: 1,000,000).
    pub(crate) exec_fuel: u32,
    /// Maximum nested form invocations (default: 1,024).
    pub(crate) recursion_limit: u32,
}

impl Default for ExecLimits {
    fn default() -> Self {
        Self {
            exec_fuel: 1_000_000,
            recursion_limit: 1024,
        }
    }
}

impl ExecLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exec_fuel(mut self, fuel: u32) -> Self {
        self.exec_fuel = fuel;
        self
    }

    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn get_exec_fuel(&self) -> u32 {
        self.exec_fuel
    }
    pub fn get_recursion_limit(&self) -> u32 {
        self.recursion_limit
    }
}

pub struct Runtime {
    ctx: FormContext,
    host: Box<dyn Host>,
    init: ClassInitTable,
    limits: ExecLimits,
    /// Held weakly; the handle retainer keeps recently used ones alive.
    invokers: DashMap<MethodType, Weak<Invokers>>,
}

impl Runtime {
    pub fn new(host: impl Host + 'static) -> Self {
        Self::builder(host).build()
    }

    pub fn builder(host: impl Host + 'static) -> RuntimeBuilder {
        RuntimeBuilder {
            host: Box::new(host),
            config: CacheConfig::default(),
            limits: ExecLimits::default(),
        }
    }

    pub fn context(&self) -> &FormContext {
        &self.ctx
    }

    pub fn host(&self) -> &dyn Host {
        self.host.as_ref()
    }

    pub fn limits(&self) -> &ExecLimits {
        &self.limits
    }

    pub fn init_table(&self) -> &ClassInitTable {
        &self.init
    }

    /// Invokers of exactly `ty`, created on first request.
    pub fn invokers(&self, ty: &MethodType) -> Arc<Invokers> {
        let found = self.invokers.get(ty).and_then(|w| w.upgrade());
        let invokers = match found {
            Some(found) => found,
            None => self.publish_invokers(ty),
        };
        let erased: Arc<AnyHandle> = invokers.clone();
        self.ctx.retain_handle(&erased);
        invokers
    }

    fn publish_invokers(&self, ty: &MethodType) -> Arc<Invokers> {
        let created = Arc::new(Invokers::new(ty.clone()));
        let published = {
            let mut slot = self.invokers.entry(ty.clone()).or_insert_with(Weak::new);
            if let Some(prev) = slot.upgrade() {
                return prev;
            }
            *slot = Arc::downgrade(&created);
            created
        };
        // Amortized sweep of entries whose invokers were dropped.
        if self.invokers.len().is_power_of_two() {
            self.invokers.retain(|_, w| w.strong_count() > 0);
        }
        published
    }

    #[cfg(test)]
    pub(crate) fn live_invokers(&self) -> usize {
        self.invokers.iter().filter(|e| e.value().strong_count() > 0).count()
    }

    /// Run `class`'s initializer unless it ran already; see [`ClassInitTable::ensure`].
    pub fn ensure_class_initialized(&self, class: &ClassKey) -> Result<InitStatus> {
        self.init.ensure(
            class,
            || self.host.is_class_initialized(class),
            || self.host.initialize_class(self, class),
        )
    }

    /// Run `mh`'s form without any type check.
    pub fn invoke_basic(&self, mh: &Arc<MethodHandle>, args: Vec<Value>) -> Result<Value> {
        self.invoke_traced(mh, args, &mut NoopTracer)
    }

    /// Like [`Runtime::invoke_basic`], reporting every step to `tracer`.
    pub fn invoke_traced<T: Tracer>(
        &self,
        mh: &Arc<MethodHandle>,
        args: Vec<Value>,
        tracer: &mut T,
    ) -> Result<Value> {
        check_arguments(mh.ty(), &args)?;
        Interpreter::new(self, tracer).invoke_handle(mh, args)
    }

    /// Call `mh` as a call site of type `ty`; the handle's type must be
    /// exactly `ty`.
    pub fn invoke_exact(
        &self,
        mh: &Arc<MethodHandle>,
        ty: &MethodType,
        args: Vec<Value>,
    ) -> Result<Value> {
        self.link_and_call(mh, ty, args, false)
    }

    /// Call `mh` as a call site of type `ty`, adapting the handle when the
    /// types differ but share a basic type.
    pub fn invoke(
        &self,
        mh: &Arc<MethodHandle>,
        ty: &MethodType,
        args: Vec<Value>,
    ) -> Result<Value> {
        self.link_and_call(mh, ty, args, true)
    }

    fn link_and_call(
        &self,
        mh: &Arc<MethodHandle>,
        ty: &MethodType,
        args: Vec<Value>,
        generic: bool,
    ) -> Result<Value> {
        check_arguments(ty, &args)?;
        let linker = invoker_form(self, ty, InvokerShape::new(generic, true))?;
        let mut values = Vec::with_capacity(args.len() + 2);
        values.push(Value::Handle(Arc::clone(mh)));
        values.extend(args);
        values.push(Value::Type(ty.clone()));
        Interpreter::new(self, &mut NoopTracer).run_form(&linker, values)
    }
}

fn check_arguments(ty: &MethodType, args: &[Value]) -> Result<()> {
    if args.len() != ty.parameter_count() {
        return Err(RuntimeError::ArityMismatch {
            expected: ty.parameter_count(),
            found: args.len(),
        });
    }
    for (position, (arg, pt)) in args.iter().zip(ty.parameter_types()).enumerate() {
        let expected = pt.basic_type();
        if arg.basic_type() != expected {
            return Err(RuntimeError::ArgumentType {
                position,
                expected,
                found: arg.basic_type(),
            });
        }
    }
    Ok(())
}

pub struct RuntimeBuilder {
    host: Box<dyn Host>,
    config: CacheConfig,
    limits: ExecLimits,
}

impl RuntimeBuilder {
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn limits(mut self, limits: ExecLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn build(self) -> Runtime {
        Runtime {
            ctx: FormContext::with_config(self.config),
            host: self.host,
            init: ClassInitTable::new(),
            limits: self.limits,
            invokers: DashMap::new(),
        }
    }
}
