//! The immutable form representation.

use std::fmt;
use std::sync::Arc;

use linkform_core::{BasicType, MethodType};

use super::{Name, NameIndex};
use crate::species::Species;
use crate::transform::TransformCache;

/// What a form was built for. Derived forms are `Generic`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormKind {
    Generic,
    External,
    Empty,
    BoundReinvoker,
    BasicInvoker,
    ExactLinker,
    ExactInvoker,
    GenericLinker,
    GenericInvoker,
    DirectInvokeVirtual,
    DirectInvokeStatic,
    DirectInvokeStaticInit,
    DirectInvokeSpecial,
    DirectInvokeInterface,
    DirectNewInvokeSpecial,
    DirectNewInvokeSpecialInit,
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A straight-line program over typed names.
///
/// Names `[0, arity)` are parameters; every later name applies a function
/// to constants and strictly earlier names. Forms never change after
/// construction; only their transform cache is mutable.
pub struct LambdaForm {
    arity: usize,
    names: Box<[Name]>,
    result: Option<NameIndex>,
    kind: FormKind,
    parameter_types: Box<[BasicType]>,
    transforms: TransformCache,
}

impl LambdaForm {
    /// Build a form. `result` of `None`, or a result name of type `V`,
    /// makes the form return nothing.
    ///
    /// # Panics
    /// If the names violate the form invariants (see [`LambdaForm::verify`]).
    pub fn new(
        arity: usize,
        names: Vec<Name>,
        result: Option<usize>,
        kind: FormKind,
    ) -> Arc<LambdaForm> {
        let result = result
            .filter(|&r| names.get(r).is_none_or(|n| n.ty() != BasicType::V))
            .map(|r| r as NameIndex);
        let parameter_types = names[..arity.min(names.len())]
            .iter()
            .map(Name::ty)
            .collect();
        let form = LambdaForm {
            arity,
            names: names.into_boxed_slice(),
            result,
            kind,
            parameter_types,
            transforms: TransformCache::new(),
        };
        if let Err(problem) = form.verify() {
            panic!("malformed {kind} form: {problem}\n{form}");
        }
        Arc::new(form)
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.arity
    }

    #[inline]
    pub fn names(&self) -> &[Name] {
        &self.names
    }

    #[inline]
    pub fn name(&self, index: usize) -> &Name {
        &self.names[index]
    }

    /// Parameter name `index`.
    pub fn parameter(&self, index: usize) -> &Name {
        assert!(index < self.arity, "no parameter {index} in a form of arity {}", self.arity);
        &self.names[index]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn expression_count(&self) -> usize {
        self.names.len() - self.arity
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn result(&self) -> Option<usize> {
        self.result.map(|r| r as usize)
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn parameter_types(&self) -> &[BasicType] {
        &self.parameter_types
    }

    pub fn parameter_type(&self, index: usize) -> BasicType {
        self.parameter_types[index]
    }

    pub fn return_type(&self) -> BasicType {
        self.result().map_or(BasicType::V, |r| self.names[r].ty())
    }

    /// Species constraint of parameter `index`, if any.
    pub fn parameter_constraint(&self, index: usize) -> Option<&Arc<Species>> {
        self.names[index].constraint()
    }

    /// `(params)ret` over basic types.
    pub fn basic_method_type(&self) -> MethodType {
        MethodType::of_basic(self.return_type(), &self.parameter_types)
            .unwrap_or_else(|e| unreachable!("verified form has a valid signature: {e}"))
    }

    pub(crate) fn transforms(&self) -> &TransformCache {
        &self.transforms
    }

    /// Number of live cached transforms of this form.
    pub fn transform_count(&self) -> usize {
        self.transforms.len()
    }
}

impl fmt::Debug for LambdaForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
