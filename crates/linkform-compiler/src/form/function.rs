//! Functions applied by expression names.

use std::fmt;
use std::sync::Arc;

use linkform_core::{BasicType, MethodType, Ty};

use super::LambdaForm;
use crate::species::Species;

/// How a linker call dispatches to its member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchKind {
    Virtual,
    Static,
    Special,
    Interface,
    /// Constructor body invoked on a freshly allocated instance.
    NewSpecial,
}

impl DispatchKind {
    pub fn name(self) -> &'static str {
        match self {
            DispatchKind::Virtual => "linkToVirtual",
            DispatchKind::Static => "linkToStatic",
            DispatchKind::Special => "linkToSpecial",
            DispatchKind::Interface => "linkToInterface",
            DispatchKind::NewSpecial => "linkToSpecial",
        }
    }

    /// Whether the member takes the receiver as its first argument.
    pub fn has_receiver(self) -> bool {
        !matches!(self, DispatchKind::Static)
    }
}

/// Built-in operations the interpreter implements directly.
#[derive(Clone, Debug, PartialEq)]
pub enum Intrinsic {
    /// Call the handle in operand 0 with the remaining operands.
    /// Carries the callee's basic type, without the handle parameter.
    InvokeBasic(MethodType),
    /// Read field `index` of a carrier of `species`.
    BoundField { species: Arc<Species>, index: usize },
    /// Fail unless the array in operand 0 has exactly operand 1 elements.
    CheckSpreadLength,
    /// Load element operand 1 from the array in operand 0.
    /// Carries the erased element type.
    ArrayLoad(Ty),
    Zero(BasicType),
    Identity(BasicType),
    /// Fail unless the handle's type equals the type token.
    CheckExactType,
    /// Adapt the handle to the type token, yielding the adapted handle.
    CheckGenericType,
    /// Force initialization of a direct handle's declaring class.
    EnsureInitialized,
    /// The member a direct handle resolves to.
    InternalMemberName,
    /// Allocate an uninitialized instance of a constructor handle's class.
    AllocateInstance,
    /// The constructor member of a constructor handle.
    ConstructorMember,
    /// Dispatch to the member passed as the last operand.
    /// Carries the full basic linker type, member included.
    LinkTo { kind: DispatchKind, ty: MethodType },
}

/// The callee of an expression name.
#[derive(Clone, Debug)]
pub enum NamedFunction {
    Intrinsic(Intrinsic),
    /// A host primitive resolved by name at call time.
    External { name: Arc<str>, ty: MethodType },
    /// Another form, interpreted inline.
    Form(Arc<LambdaForm>),
}

impl PartialEq for NamedFunction {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NamedFunction::Intrinsic(a), NamedFunction::Intrinsic(b)) => a == b,
            (
                NamedFunction::External { name: a, ty: at },
                NamedFunction::External { name: b, ty: bt },
            ) => a == b && at == bt,
            (NamedFunction::Form(a), NamedFunction::Form(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Intrinsic> for NamedFunction {
    fn from(intrinsic: Intrinsic) -> Self {
        NamedFunction::Intrinsic(intrinsic)
    }
}

impl NamedFunction {
    pub fn invoke_basic(callee: &MethodType) -> Self {
        Intrinsic::InvokeBasic(callee.basic_type()).into()
    }

    pub fn external(name: &str, ty: &MethodType) -> Self {
        NamedFunction::External {
            name: Arc::from(name),
            ty: ty.basic_type(),
        }
    }

    pub fn parameter_types(&self) -> Vec<BasicType> {
        use BasicType::{I, L};
        match self {
            NamedFunction::Intrinsic(i) => match i {
                Intrinsic::InvokeBasic(mt) => {
                    let mut ps = vec![L];
                    ps.extend(mt.basic_parameter_types());
                    ps
                }
                Intrinsic::BoundField { .. } => vec![L],
                Intrinsic::CheckSpreadLength | Intrinsic::ArrayLoad(_) => vec![L, I],
                Intrinsic::Zero(_) => Vec::new(),
                Intrinsic::Identity(bt) => vec![*bt],
                Intrinsic::CheckExactType | Intrinsic::CheckGenericType => vec![L, L],
                Intrinsic::EnsureInitialized
                | Intrinsic::InternalMemberName
                | Intrinsic::AllocateInstance
                | Intrinsic::ConstructorMember => vec![L],
                Intrinsic::LinkTo { ty, .. } => ty.basic_parameter_types(),
            },
            NamedFunction::External { ty, .. } => ty.basic_parameter_types(),
            NamedFunction::Form(form) => form.parameter_types().to_vec(),
        }
    }

    pub fn return_type(&self) -> BasicType {
        match self {
            NamedFunction::Intrinsic(i) => match i {
                Intrinsic::InvokeBasic(mt) => mt.basic_return_type(),
                Intrinsic::BoundField { species, index } => species.field_type(*index),
                Intrinsic::CheckSpreadLength
                | Intrinsic::CheckExactType
                | Intrinsic::EnsureInitialized => BasicType::V,
                Intrinsic::ArrayLoad(elem) => elem.basic_type(),
                Intrinsic::Zero(bt) | Intrinsic::Identity(bt) => *bt,
                Intrinsic::CheckGenericType
                | Intrinsic::InternalMemberName
                | Intrinsic::AllocateInstance
                | Intrinsic::ConstructorMember => BasicType::L,
                Intrinsic::LinkTo { ty, .. } => ty.basic_return_type(),
            },
            NamedFunction::External { ty, .. } => ty.basic_return_type(),
            NamedFunction::Form(form) => form.return_type(),
        }
    }
}

/// `(LI)L` style signature.
fn basic_signature(mt: &MethodType) -> String {
    let chars = mt.basic_type_chars();
    let (params, ret) = chars.split_at(chars.len() - 1);
    format!("({params}){ret}")
}

impl fmt::Display for NamedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamedFunction::Intrinsic(i) => match i {
                Intrinsic::InvokeBasic(mt) => write!(f, "InvokeBasic[{}]", basic_signature(mt)),
                Intrinsic::BoundField { species, index } => {
                    write!(f, "BoundField[{}.{index}]", species.key())
                }
                Intrinsic::CheckSpreadLength => f.write_str("CheckSpreadLength"),
                Intrinsic::ArrayLoad(elem) => write!(f, "ArrayLoad[{elem}]"),
                Intrinsic::Zero(bt) => write!(f, "Zero[{bt}]"),
                Intrinsic::Identity(bt) => write!(f, "Identity[{bt}]"),
                Intrinsic::CheckExactType => f.write_str("CheckExactType"),
                Intrinsic::CheckGenericType => f.write_str("CheckGenericType"),
                Intrinsic::EnsureInitialized => f.write_str("EnsureInitialized"),
                Intrinsic::InternalMemberName => f.write_str("InternalMemberName"),
                Intrinsic::AllocateInstance => f.write_str("AllocateInstance"),
                Intrinsic::ConstructorMember => f.write_str("ConstructorMember"),
                Intrinsic::LinkTo { kind, ty } => {
                    write!(f, "{}[{}]", kind.name(), basic_signature(ty))
                }
            },
            NamedFunction::External { name, .. } => write!(f, "{name}"),
            NamedFunction::Form(form) => write!(f, "Form[{}]", form.kind()),
        }
    }
}
