//! Method signatures.

use std::fmt;
use std::sync::Arc;

use crate::{BasicType, Result, Ty, TypeError};

/// Maximum argument slots of any method.
pub const MAX_JVM_ARITY: usize = 255;
/// Maximum argument slots of a handle's type (one slot goes to the handle itself).
pub const MAX_MH_ARITY: usize = MAX_JVM_ARITY - 1;
/// Maximum argument slots of a type passed to an invoker (handle plus invoker).
pub const MAX_MH_INVOKER_ARITY: usize = MAX_MH_ARITY - 1;

/// A method signature: parameter types and a return type.
///
/// Structural equality; cheap to clone (parameters are shared).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MethodType {
    ptypes: Arc<[Ty]>,
    rtype: Ty,
}

impl MethodType {
    /// Create a signature, validating the parameter list.
    pub fn new(rtype: Ty, ptypes: impl Into<Vec<Ty>>) -> Result<Self> {
        let ptypes = ptypes.into();
        if let Some(index) = ptypes.iter().position(Ty::is_void) {
            return Err(TypeError::VoidParameter { index });
        }
        let slots = slot_count(&ptypes);
        if slots > MAX_JVM_ARITY {
            return Err(TypeError::TooManyArguments {
                slots,
                limit: MAX_JVM_ARITY,
            });
        }
        Ok(Self {
            ptypes: ptypes.into(),
            rtype,
        })
    }

    /// `(Object, ..., Object)Object` with `arity` parameters.
    pub fn generic(arity: usize) -> Result<Self> {
        Self::new(Ty::object(), vec![Ty::object(); arity])
    }

    /// Signature built from basic types.
    pub fn of_basic(rtype: BasicType, ptypes: &[BasicType]) -> Result<Self> {
        Self::new(rtype.ty(), ptypes.iter().map(|t| t.ty()).collect::<Vec<_>>())
    }

    #[inline]
    pub fn parameter_count(&self) -> usize {
        self.ptypes.len()
    }

    #[inline]
    pub fn parameter_type(&self, index: usize) -> &Ty {
        &self.ptypes[index]
    }

    #[inline]
    pub fn parameter_types(&self) -> &[Ty] {
        &self.ptypes
    }

    #[inline]
    pub fn return_type(&self) -> &Ty {
        &self.rtype
    }

    /// Interpreter slots needed for the parameters.
    pub fn parameter_slot_count(&self) -> usize {
        slot_count(&self.ptypes)
    }

    pub fn basic_parameter_types(&self) -> Vec<BasicType> {
        self.ptypes.iter().map(Ty::basic_type).collect()
    }

    pub fn basic_return_type(&self) -> BasicType {
        self.rtype.basic_type()
    }

    /// Fold every reference type to `Object`.
    pub fn erase(&self) -> MethodType {
        if self.is_erased() {
            return self.clone();
        }
        MethodType {
            ptypes: self.ptypes.iter().map(Ty::erase).collect(),
            rtype: self.rtype.erase(),
        }
    }

    /// Erase, then fold subword primitives to `int`.
    pub fn basic_type(&self) -> MethodType {
        if self.is_basic() {
            return self.clone();
        }
        MethodType {
            ptypes: self.ptypes.iter().map(Ty::basic).collect(),
            rtype: self.rtype.basic(),
        }
    }

    pub fn is_erased(&self) -> bool {
        self.ptypes
            .iter()
            .chain(std::iter::once(&self.rtype))
            .all(|t| !t.is_reference() || t.is_object())
    }

    pub fn is_basic(&self) -> bool {
        self.is_erased()
            && self
                .ptypes
                .iter()
                .chain(std::iter::once(&self.rtype))
                .all(|t| !t.is_subword())
    }

    pub fn insert_parameter_types(&self, pos: usize, types: &[Ty]) -> Result<MethodType> {
        let mut ptypes = self.ptypes.to_vec();
        ptypes.splice(pos..pos, types.iter().cloned());
        Self::new(self.rtype.clone(), ptypes)
    }

    pub fn append_parameter_types(&self, types: &[Ty]) -> Result<MethodType> {
        self.insert_parameter_types(self.ptypes.len(), types)
    }

    pub fn drop_parameter_types(&self, start: usize, end: usize) -> MethodType {
        let mut ptypes = self.ptypes.to_vec();
        ptypes.drain(start..end);
        MethodType {
            ptypes: ptypes.into(),
            rtype: self.rtype.clone(),
        }
    }

    pub fn change_return_type(&self, rtype: Ty) -> MethodType {
        MethodType {
            ptypes: self.ptypes.clone(),
            rtype,
        }
    }

    pub fn change_parameter_type(&self, index: usize, ty: Ty) -> Result<MethodType> {
        let mut ptypes = self.ptypes.to_vec();
        ptypes[index] = ty;
        Self::new(self.rtype.clone(), ptypes)
    }

    /// The type of an invoker for this type: the target handle is prepended.
    pub fn invoker_type(&self) -> Result<MethodType> {
        if self.parameter_slot_count() > MAX_MH_INVOKER_ARITY {
            return Err(TypeError::TooManyArguments {
                slots: self.parameter_slot_count(),
                limit: MAX_MH_INVOKER_ARITY,
            });
        }
        self.insert_parameter_types(0, &[Ty::class("MethodHandle")])
    }

    /// Basic type letters of parameters followed by the return letter: `"LLIL"`.
    pub fn basic_type_chars(&self) -> String {
        let mut s: String = self.ptypes.iter().map(|t| t.basic_type().char()).collect();
        s.push(self.rtype.basic_type().char());
        s
    }

    /// Parse a signature.
    ///
    /// Accepts descriptor shorthand (`(LLI)L`, `([LJ)V`) and readable lists
    /// (`(Object,int)String`, `(String)void`).
    pub fn parse(input: &str) -> Result<MethodType> {
        let err = |reason: &str| TypeError::Parse {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        let text = input.trim();
        let inner = text.strip_prefix('(').ok_or_else(|| err("expected `(`"))?;
        let close = inner.find(')').ok_or_else(|| err("expected `)`"))?;
        let (params, ret) = (&inner[..close], inner[close + 1..].trim());

        let ptypes = parse_params(params).ok_or_else(|| err("bad parameter list"))?;
        let rtype = Ty::parse_descriptor(ret)
            .or_else(|| Ty::parse_word(ret))
            .ok_or_else(|| err("bad return type"))?;
        MethodType::new(rtype, ptypes)
    }
}

fn slot_count(ptypes: &[Ty]) -> usize {
    ptypes.iter().map(|t| t.basic_type().slots()).sum()
}

fn is_descriptor_list(s: &str) -> bool {
    s.chars().all(|c| "LVZBSCIJFD[".contains(c))
}

fn parse_params(params: &str) -> Option<Vec<Ty>> {
    let params = params.trim();
    if params.is_empty() {
        return Some(Vec::new());
    }
    if params.contains(',') {
        return params.split(',').map(Ty::parse_word).collect();
    }
    if !is_descriptor_list(params) {
        return Ty::parse_word(params).map(|t| vec![t]);
    }
    let mut out = Vec::new();
    let mut start = 0;
    for (i, c) in params.char_indices() {
        if c == '[' {
            continue;
        }
        out.push(Ty::parse_descriptor(&params[start..=i])?);
        start = i + 1;
    }
    if start != params.len() {
        return None;
    }
    Some(out)
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, t) in self.ptypes.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{t}")?;
        }
        write!(f, "){}", self.rtype)
    }
}

impl fmt::Debug for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
