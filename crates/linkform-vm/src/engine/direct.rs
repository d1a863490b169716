//! Direct handles: handles that dispatch straight to a member.
//!
//! Every direct handle of one erased type and dispatch kind shares one
//! prepared form, cached in the type's `MethodTypeForm`. Static methods and
//! constructors of classes that are not yet initialized get a barrier
//! variant instead; the barrier swaps in the prepared form once the class
//! is initialized.

use std::fmt;
use std::sync::Arc;

use linkform_compiler::{
    DispatchKind, FormBuilder, FormKind, FormPurpose, Intrinsic, LambdaForm, NamedFunction,
};
use linkform_core::{BasicType, ClassKey, MAX_MH_ARITY, MethodType, Ty, TypeError};
use tracing::debug;

use super::error::Result;
use super::handle::{HandleData, MethodHandle};
use super::runtime::Runtime;

/// A resolved method or constructor.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MemberName {
    class: ClassKey,
    name: Arc<str>,
    /// Declared type, without the receiver.
    ty: MethodType,
    kind: DispatchKind,
}

impl MemberName {
    /// A method of `class`. `ty` excludes the receiver.
    pub fn method(class: ClassKey, name: &str, ty: MethodType, kind: DispatchKind) -> Self {
        assert!(
            kind != DispatchKind::NewSpecial,
            "use MemberName::constructor for constructors"
        );
        Self {
            class,
            name: Arc::from(name),
            ty,
            kind,
        }
    }

    /// A constructor of `class` taking `params`.
    pub fn constructor(class: ClassKey, params: &[Ty]) -> Result<Self> {
        Ok(Self {
            class,
            name: Arc::from("<init>"),
            ty: MethodType::new(Ty::Void, params.to_vec())?,
            kind: DispatchKind::NewSpecial,
        })
    }

    pub fn class(&self) -> &ClassKey {
        &self.class
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &MethodType {
        &self.ty
    }

    pub fn kind(&self) -> DispatchKind {
        self.kind
    }

    pub fn is_constructor(&self) -> bool {
        self.kind == DispatchKind::NewSpecial
    }

    /// Whether calls must first make sure the declaring class is initialized.
    pub fn needs_class_init(&self) -> bool {
        matches!(self.kind, DispatchKind::Static | DispatchKind::NewSpecial)
    }

    /// Type of a direct handle to this member: the receiver is prepended
    /// for instance methods, and constructors return their class.
    pub fn handle_type(&self) -> Result<MethodType> {
        let receiver = Ty::Ref(self.class.clone());
        Ok(match self.kind {
            DispatchKind::Static => self.ty.clone(),
            DispatchKind::NewSpecial => self.ty.change_return_type(receiver),
            _ => self.ty.insert_parameter_types(0, &[receiver])?,
        })
    }
}

impl fmt::Display for MemberName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.class, self.name, self.ty)
    }
}

impl fmt::Debug for MemberName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}/{:?}", self.kind)
    }
}

/// Construction of direct handles and their forms.
pub struct DirectMethodHandle;

impl DirectMethodHandle {
    /// A handle invoking `member`.
    pub fn make(rt: &Runtime, member: MemberName) -> Result<Arc<MethodHandle>> {
        let ty = member.handle_type()?;
        let barrier = member.needs_class_init() && !rt.host().is_class_initialized(member.class());
        let form = Self::prepared_form(rt, &ty, member.kind(), barrier)?;
        debug!(
            target: "linkform::linkage",
            member = %member,
            barrier,
            "direct handle created"
        );
        Ok(MethodHandle::new(
            ty,
            form,
            HandleData::Direct {
                member: Arc::new(member),
            },
        ))
    }

    /// The shared form for direct handles of type `ty`.
    ///
    /// The barrier variant exists only for static methods and constructors.
    pub fn prepared_form(
        rt: &Runtime,
        ty: &MethodType,
        kind: DispatchKind,
        barrier: bool,
    ) -> Result<Arc<LambdaForm>> {
        let barrier = barrier && matches!(kind, DispatchKind::Static | DispatchKind::NewSpecial);
        // The linker call takes the member, and constructors the new instance too.
        let limit = MAX_MH_ARITY - usize::from(kind == DispatchKind::NewSpecial);
        let slots = ty.parameter_slot_count();
        if slots > limit {
            return Err(TypeError::TooManyArguments { slots, limit }.into());
        }
        let purpose = form_purpose(kind, barrier);
        let tf = rt.context().type_form(ty);
        if let Some(form) = tf.cached_form(purpose) {
            return Ok(form);
        }
        let form = make_prepared_form(&ty.basic_type(), kind, barrier);
        Ok(tf.set_cached_form(purpose, form))
    }
}

fn form_purpose(kind: DispatchKind, barrier: bool) -> FormPurpose {
    match (kind, barrier) {
        (DispatchKind::Virtual, _) => FormPurpose::InvokeVirtual,
        (DispatchKind::Static, false) => FormPurpose::InvokeStatic,
        (DispatchKind::Static, true) => FormPurpose::InvokeStaticInit,
        (DispatchKind::Special, _) => FormPurpose::InvokeSpecial,
        (DispatchKind::Interface, _) => FormPurpose::InvokeInterface,
        (DispatchKind::NewSpecial, false) => FormPurpose::NewInvokeSpecial,
        (DispatchKind::NewSpecial, true) => FormPurpose::NewInvokeSpecialInit,
    }
}

fn form_kind(kind: DispatchKind, barrier: bool) -> FormKind {
    match (kind, barrier) {
        (DispatchKind::Virtual, _) => FormKind::DirectInvokeVirtual,
        (DispatchKind::Static, false) => FormKind::DirectInvokeStatic,
        (DispatchKind::Static, true) => FormKind::DirectInvokeStaticInit,
        (DispatchKind::Special, _) => FormKind::DirectInvokeSpecial,
        (DispatchKind::Interface, _) => FormKind::DirectInvokeInterface,
        (DispatchKind::NewSpecial, false) => FormKind::DirectNewInvokeSpecial,
        (DispatchKind::NewSpecial, true) => FormKind::DirectNewInvokeSpecialInit,
    }
}

/// `(dmh, args...) => linkTo*(args..., member)`, with the class barrier
/// and instance allocation when the kind needs them.
fn make_prepared_form(basic: &MethodType, kind: DispatchKind, barrier: bool) -> Arc<LambdaForm> {
    let is_constructor = kind == DispatchKind::NewSpecial;
    let mut params = vec![BasicType::L];
    params.extend(basic.basic_parameter_types());
    let mut fb = FormBuilder::new(&params);
    let dmh = fb.arg(0);

    if barrier {
        fb.push(Intrinsic::EnsureInitialized, vec![dmh.clone()]);
    }
    let new_obj = is_constructor.then(|| fb.push(Intrinsic::AllocateInstance, vec![dmh.clone()]));
    let get_member = if is_constructor {
        Intrinsic::ConstructorMember
    } else {
        Intrinsic::InternalMemberName
    };
    let member = fb.push(get_member, vec![dmh]);

    let mut link_args = Vec::new();
    let mut link_params = Vec::new();
    if let Some(obj) = new_obj {
        link_args.push(fb.arg(obj));
        link_params.push(BasicType::L);
    }
    link_args.extend(fb.args(1, params.len()));
    link_params.extend(&params[1..]);
    link_args.push(fb.arg(member));
    link_params.push(BasicType::L);
    let link_ret = if is_constructor {
        BasicType::V
    } else {
        basic.basic_return_type()
    };
    let link_ty = match MethodType::of_basic(link_ret, &link_params) {
        Ok(ty) => ty,
        Err(e) => unreachable!("a handle type has room for the member: {e}"),
    };
    let call = fb.push(
        NamedFunction::from(Intrinsic::LinkTo { kind, ty: link_ty }),
        link_args,
    );
    let result = if is_constructor { new_obj } else { Some(call) };
    fb.build(result, form_kind(kind, barrier))
}
