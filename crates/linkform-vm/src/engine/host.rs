//! The embedding environment: members, primitives and classes.

use std::fmt;
use std::sync::Arc;

use dashmap::DashSet;
use indexmap::IndexMap;
use linkform_compiler::DispatchKind;
use linkform_core::ClassKey;

use super::direct::MemberName;
use super::error::{Result, RuntimeError};
use super::runtime::Runtime;
use super::value::{Instance, Value};

/// Services the interpreter cannot provide itself.
///
/// Implementations must be callable from several threads at once. Every
/// callback receives the runtime so host code can invoke handles in turn.
pub trait Host: Send + Sync {
    /// Invoke a resolved member. For instance members and constructors the
    /// receiver is `args[0]`.
    fn invoke_member(
        &self,
        rt: &Runtime,
        kind: DispatchKind,
        member: &MemberName,
        args: &[Value],
    ) -> Result<Value>;

    /// Call the primitive registered as `name`.
    fn call_primitive(&self, rt: &Runtime, name: &str, args: &[Value]) -> Result<Value>;

    fn is_class_initialized(&self, class: &ClassKey) -> bool;

    /// Run `class`'s initializer. Called at most once per class by the
    /// runtime's barrier; afterwards `is_class_initialized` must hold on
    /// success.
    fn initialize_class(&self, rt: &Runtime, class: &ClassKey) -> std::result::Result<(), String>;

    fn allocate_instance(&self, class: &ClassKey) -> Result<Value> {
        Ok(Value::Object(Arc::new(Instance::new(class.clone()))))
    }
}

pub type HostFn = Arc<dyn Fn(&Runtime, &[Value]) -> Result<Value> + Send + Sync>;
pub type Initializer = Arc<dyn Fn(&Runtime) -> std::result::Result<(), String> + Send + Sync>;

/// A table-driven host: primitives and members are closures registered
/// by name.
pub struct SimpleHost {
    primitives: IndexMap<String, HostFn>,
    members: IndexMap<(ClassKey, String), HostFn>,
    initializers: IndexMap<ClassKey, Initializer>,
    initialized: DashSet<ClassKey>,
}

impl SimpleHost {
    pub fn builder() -> SimpleHostBuilder {
        SimpleHostBuilder::default()
    }

    /// Registered primitive names, in registration order.
    pub fn primitive_names(&self) -> impl Iterator<Item = &str> {
        self.primitives.keys().map(String::as_str)
    }
}

impl Host for SimpleHost {
    fn invoke_member(
        &self,
        rt: &Runtime,
        _kind: DispatchKind,
        member: &MemberName,
        args: &[Value],
    ) -> Result<Value> {
        let key = (member.class().clone(), member.name().to_string());
        let body = self
            .members
            .get(&key)
            .ok_or_else(|| RuntimeError::UnknownMember {
                class: member.class().clone(),
                name: member.name().to_string(),
            })?;
        body(rt, args)
    }

    fn call_primitive(&self, rt: &Runtime, name: &str, args: &[Value]) -> Result<Value> {
        let body = self
            .primitives
            .get(name)
            .ok_or_else(|| RuntimeError::UnknownPrimitive(name.to_string()))?;
        body(rt, args)
    }

    /// Classes without a registered initializer are always initialized.
    fn is_class_initialized(&self, class: &ClassKey) -> bool {
        !self.initializers.contains_key(class) || self.initialized.contains(class)
    }

    fn initialize_class(&self, rt: &Runtime, class: &ClassKey) -> std::result::Result<(), String> {
        if let Some(init) = self.initializers.get(class) {
            init(rt)?;
        }
        self.initialized.insert(class.clone());
        Ok(())
    }
}

impl fmt::Debug for SimpleHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleHost")
            .field("primitives", &self.primitives.keys().collect::<Vec<_>>())
            .field("members", &self.members.keys().collect::<Vec<_>>())
            .field("initializers", &self.initializers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Default)]
pub struct SimpleHostBuilder {
    primitives: IndexMap<String, HostFn>,
    members: IndexMap<(ClassKey, String), HostFn>,
    initializers: IndexMap<ClassKey, Initializer>,
}

impl SimpleHostBuilder {
    /// Register a primitive callable by external forms.
    pub fn primitive(
        mut self,
        name: &str,
        body: impl Fn(&Runtime, &[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.primitives.insert(name.to_string(), Arc::new(body));
        self
    }

    /// Register the body of `class.name`, shared by every dispatch kind.
    pub fn member(
        mut self,
        class: &ClassKey,
        name: &str,
        body: impl Fn(&Runtime, &[Value]) -> Result<Value> + Send + Sync + 'static,
    ) -> Self {
        self.members
            .insert((class.clone(), name.to_string()), Arc::new(body));
        self
    }

    /// Register a class initializer; the class starts uninitialized.
    pub fn initializer(
        mut self,
        class: &ClassKey,
        body: impl Fn(&Runtime) -> std::result::Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.initializers.insert(class.clone(), Arc::new(body));
        self
    }

    pub fn build(self) -> SimpleHost {
        SimpleHost {
            primitives: self.primitives,
            members: self.members,
            initializers: self.initializers,
            initialized: DashSet::new(),
        }
    }
}
