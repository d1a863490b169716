//! Names: the single-assignment slots of a form.

use std::fmt;
use std::sync::Arc;

use linkform_core::{BasicType, ClassKey, MethodType};
use smallvec::SmallVec;

use super::NamedFunction;
use crate::species::Species;

/// Index of a name.
///
/// Inside a published form this is the name's position; inside a
/// [`LambdaFormBuffer`](crate::LambdaFormBuffer) it is an arena id.
pub type NameIndex = u32;

/// A literal operand of an expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    Null,
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(Arc<str>),
    MethodType(MethodType),
    Class(ClassKey),
}

impl Constant {
    pub fn basic_type(&self) -> BasicType {
        match self {
            Constant::Int(_) => BasicType::I,
            Constant::Long(_) => BasicType::J,
            Constant::Float(_) => BasicType::F,
            Constant::Double(_) => BasicType::D,
            Constant::Null | Constant::Str(_) | Constant::MethodType(_) | Constant::Class(_) => {
                BasicType::L
            }
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => f.write_str("null"),
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Long(v) => write!(f, "{v}L"),
            Constant::Float(v) => write!(f, "{v:?}F"),
            Constant::Double(v) => write!(f, "{v:?}D"),
            Constant::Str(s) => write!(f, "{s:?}"),
            Constant::MethodType(mt) => write!(f, "{mt}"),
            Constant::Class(c) => write!(f, "{c}.class"),
        }
    }
}

/// An expression operand: a reference to an earlier name, or a constant.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Name(NameIndex),
    Const(Constant),
}

impl Arg {
    pub fn name(index: usize) -> Self {
        Arg::Name(index as NameIndex)
    }

    pub fn int(value: i32) -> Self {
        Arg::Const(Constant::Int(value))
    }

    pub fn as_name(&self) -> Option<NameIndex> {
        match self {
            Arg::Name(i) => Some(*i),
            Arg::Const(_) => None,
        }
    }
}

pub type Args = SmallVec<[Arg; 4]>;

/// A function application bound to its operands.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub function: NamedFunction,
    pub args: Args,
}

/// A typed slot. Parameters have no expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Name {
    ty: BasicType,
    constraint: Option<Arc<Species>>,
    expr: Option<Expr>,
}

impl Name {
    pub fn param(ty: BasicType) -> Self {
        debug_assert!(ty.is_arg(), "parameters cannot be void");
        Self {
            ty,
            constraint: None,
            expr: None,
        }
    }

    /// A reference parameter known to carry the fields of `species`.
    pub fn carrier(species: Arc<Species>) -> Self {
        Self {
            ty: BasicType::L,
            constraint: Some(species),
            expr: None,
        }
    }

    /// An expression name; its type is the function's return type.
    pub fn expr(function: NamedFunction, args: impl IntoIterator<Item = Arg>) -> Self {
        let args: Args = args.into_iter().collect();
        debug_assert_eq!(
            args.len(),
            function.parameter_types().len(),
            "arity of {function}"
        );
        Self {
            ty: function.return_type(),
            constraint: None,
            expr: Some(Expr { function, args }),
        }
    }

    #[inline]
    pub fn ty(&self) -> BasicType {
        self.ty
    }

    #[inline]
    pub fn is_param(&self) -> bool {
        self.expr.is_none()
    }

    pub fn constraint(&self) -> Option<&Arc<Species>> {
        self.constraint.as_ref()
    }

    pub fn expression(&self) -> Option<&Expr> {
        self.expr.as_ref()
    }

    pub fn function(&self) -> Option<&NamedFunction> {
        self.expr.as_ref().map(|e| &e.function)
    }

    pub fn args(&self) -> &[Arg] {
        self.expr.as_ref().map_or(&[], |e| &e.args)
    }

    /// Whether any operand refers to `index`.
    pub fn refers_to(&self, index: NameIndex) -> bool {
        self.args().iter().any(|a| a.as_name() == Some(index))
    }

    /// Copy with every name operand passed through `map`.
    ///
    /// Returns `None` when no operand changed.
    pub fn map_args(&self, mut map: impl FnMut(NameIndex) -> NameIndex) -> Option<Name> {
        let expr = self.expr.as_ref()?;
        let mut changed = false;
        let args: Args = expr
            .args
            .iter()
            .map(|a| match a {
                Arg::Name(i) => {
                    let j = map(*i);
                    changed |= j != *i;
                    Arg::Name(j)
                }
                c => c.clone(),
            })
            .collect();
        changed.then(|| Name {
            ty: self.ty,
            constraint: None,
            expr: Some(Expr {
                function: expr.function.clone(),
                args,
            }),
        })
    }
}
