//! Incremental construction of forms in position order.

use std::sync::Arc;

use linkform_core::BasicType;

use super::{Arg, FormKind, LambdaForm, Name, NamedFunction};
use crate::species::Species;

/// Appends expression names after a fixed parameter list.
pub struct FormBuilder {
    arity: usize,
    names: Vec<Name>,
}

impl FormBuilder {
    pub fn new(params: &[BasicType]) -> Self {
        Self {
            arity: params.len(),
            names: params.iter().map(|&t| Name::param(t)).collect(),
        }
    }

    /// Parameter 0 is a carrier of `species`; `params` follow it.
    pub fn with_carrier(species: Arc<Species>, params: &[BasicType]) -> Self {
        let mut names = Vec::with_capacity(params.len() + 1);
        names.push(Name::carrier(species));
        names.extend(params.iter().map(|&t| Name::param(t)));
        Self {
            arity: names.len(),
            names,
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Operand referring to name `index`.
    pub fn arg(&self, index: usize) -> Arg {
        debug_assert!(index < self.names.len());
        Arg::name(index)
    }

    /// Operands referring to names `from..to`.
    pub fn args(&self, from: usize, to: usize) -> Vec<Arg> {
        (from..to).map(|i| self.arg(i)).collect()
    }

    /// Append an expression; returns its index.
    pub fn push(&mut self, function: impl Into<NamedFunction>, args: Vec<Arg>) -> usize {
        self.names.push(Name::expr(function.into(), args));
        self.names.len() - 1
    }

    pub fn build(self, result: Option<usize>, kind: FormKind) -> Arc<LambdaForm> {
        LambdaForm::new(self.arity, self.names, result, kind)
    }
}
