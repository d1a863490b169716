//! Invoker handles and linker forms.
//!
//! An invoker takes a target handle as its first argument and calls it
//! with the rest, after checking (exact) or adapting (generic) the target
//! to the invoker's type. A linker form does the same for a call site: the
//! type token is a trailing argument instead of a bound value.
//!
//! Forms are cached per erasure; invoker handles per exact type.

use std::sync::{Arc, OnceLock};

use linkform_compiler::{
    FormBuilder, FormKind, FormPurpose, HandlePurpose, Intrinsic, LambdaForm, NamedFunction,
};
use linkform_core::{BasicType, MAX_MH_INVOKER_ARITY, MethodType, TypeError};
use tracing::debug;

use super::error::Result;
use super::handle::{HandleData, MethodHandle};
use super::runtime::Runtime;
use super::value::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InvokerShape {
    ExactLinker,
    ExactInvoker,
    GenericLinker,
    GenericInvoker,
}

impl InvokerShape {
    pub(crate) fn new(generic: bool, linker: bool) -> Self {
        match (generic, linker) {
            (false, true) => InvokerShape::ExactLinker,
            (false, false) => InvokerShape::ExactInvoker,
            (true, true) => InvokerShape::GenericLinker,
            (true, false) => InvokerShape::GenericInvoker,
        }
    }

    fn is_linker(self) -> bool {
        matches!(self, InvokerShape::ExactLinker | InvokerShape::GenericLinker)
    }

    fn is_generic(self) -> bool {
        matches!(self, InvokerShape::GenericLinker | InvokerShape::GenericInvoker)
    }

    fn purpose(self) -> FormPurpose {
        match self {
            InvokerShape::ExactLinker => FormPurpose::ExactLinker,
            InvokerShape::ExactInvoker => FormPurpose::ExactInvoker,
            InvokerShape::GenericLinker => FormPurpose::GenericLinker,
            InvokerShape::GenericInvoker => FormPurpose::GenericInvoker,
        }
    }

    fn kind(self) -> FormKind {
        match self {
            InvokerShape::ExactLinker => FormKind::ExactLinker,
            InvokerShape::ExactInvoker => FormKind::ExactInvoker,
            InvokerShape::GenericLinker => FormKind::GenericLinker,
            InvokerShape::GenericInvoker => FormKind::GenericInvoker,
        }
    }
}

/// Invokers of one exact type.
pub struct Invokers {
    ty: MethodType,
    exact: OnceLock<Arc<MethodHandle>>,
    generic: OnceLock<Arc<MethodHandle>>,
}

impl Invokers {
    pub(crate) fn new(ty: MethodType) -> Self {
        Self {
            ty,
            exact: OnceLock::new(),
            generic: OnceLock::new(),
        }
    }

    pub fn ty(&self) -> &MethodType {
        &self.ty
    }

    /// `(MethodHandle, params...)ret`: calls a target whose type is exactly
    /// this type.
    pub fn exact_invoker(&self, rt: &Runtime) -> Result<Arc<MethodHandle>> {
        self.cached_invoker(rt, &self.exact, InvokerShape::ExactInvoker)
    }

    /// Like the exact invoker, but adapts the target to this type first.
    pub fn generic_invoker(&self, rt: &Runtime) -> Result<Arc<MethodHandle>> {
        self.cached_invoker(rt, &self.generic, InvokerShape::GenericInvoker)
    }

    /// Invoker of the basic type that calls its target without any check.
    pub fn basic_invoker(&self, rt: &Runtime) -> Result<Arc<MethodHandle>> {
        let basic = self.ty.basic_type();
        let tf = rt.context().type_form(&basic);
        if let Some(handle) = tf.cached_handle::<MethodHandle>(HandlePurpose::BasicInvoker) {
            return Ok(handle);
        }
        let invoker_type = basic.invoker_type()?;
        let form = match tf.cached_form(FormPurpose::BasicInvoker) {
            Some(form) => form,
            None => tf.set_cached_form(FormPurpose::BasicInvoker, basic_invoker_form(&basic)),
        };
        let handle = MethodHandle::new(invoker_type, form, HandleData::Simple);
        Ok(tf.set_cached_handle(HandlePurpose::BasicInvoker, handle)?)
    }

    /// The call-site linker form: `(target, args..., type)`.
    pub fn linker_form(&self, rt: &Runtime, generic: bool) -> Result<Arc<LambdaForm>> {
        invoker_form(rt, &self.ty, InvokerShape::new(generic, true))
    }

    fn cached_invoker(
        &self,
        rt: &Runtime,
        slot: &OnceLock<Arc<MethodHandle>>,
        shape: InvokerShape,
    ) -> Result<Arc<MethodHandle>> {
        if let Some(handle) = slot.get() {
            return Ok(Arc::clone(handle));
        }
        let invoker_type = self.ty.invoker_type()?;
        let form = invoker_form(rt, &self.ty, shape)?;
        let species = rt.context().species().species(&[BasicType::L]);
        let handle = MethodHandle::new(
            invoker_type,
            form,
            HandleData::Bound {
                species,
                values: vec![Value::Type(self.ty.clone())],
            },
        );
        debug!(target: "linkform::linkage", ty = %self.ty, shape = ?shape, "invoker created");
        Ok(Arc::clone(slot.get_or_init(|| handle)))
    }
}

/// The cached invoker or linker form for `mt`'s erasure.
pub(crate) fn invoker_form(
    rt: &Runtime,
    mt: &MethodType,
    shape: InvokerShape,
) -> Result<Arc<LambdaForm>> {
    let slots = mt.parameter_slot_count();
    if slots > MAX_MH_INVOKER_ARITY {
        return Err(TypeError::TooManyArguments {
            slots,
            limit: MAX_MH_INVOKER_ARITY,
        }
        .into());
    }
    let tf = rt.context().type_form(mt);
    if let Some(form) = tf.cached_form(shape.purpose()) {
        return Ok(form);
    }
    let form = make_invoker_form(rt, &mt.basic_type(), shape);
    Ok(tf.set_cached_form(shape.purpose(), form))
}

/// Linker: `(target, args..., type) => InvokeBasic(check(target, type), args...)`.
/// Invoker: `(self/L, target, args...)`, the type read from the carrier.
fn make_invoker_form(rt: &Runtime, basic: &MethodType, shape: InvokerShape) -> Arc<LambdaForm> {
    let args_types = basic.basic_parameter_types();
    let (mut fb, target) = if shape.is_linker() {
        let mut params = vec![BasicType::L];
        params.extend(&args_types);
        params.push(BasicType::L);
        (FormBuilder::new(&params), 0)
    } else {
        let mut params = vec![BasicType::L];
        params.extend(&args_types);
        let species = rt.context().species().species(&[BasicType::L]);
        (FormBuilder::with_carrier(species, &params), 1)
    };
    let first_arg = target + 1;
    let arg_end = first_arg + args_types.len();
    let type_token = if shape.is_linker() {
        fb.arg(arg_end)
    } else {
        let species = rt.context().species().species(&[BasicType::L]);
        let carrier = fb.arg(0);
        let token = fb.push(species.getter(0), vec![carrier]);
        fb.arg(token)
    };

    let target_arg = fb.arg(target);
    let callee = if shape.is_generic() {
        let checked = fb.push(Intrinsic::CheckGenericType, vec![target_arg, type_token]);
        fb.arg(checked)
    } else {
        fb.push(Intrinsic::CheckExactType, vec![target_arg.clone(), type_token]);
        target_arg
    };
    let mut call_args = vec![callee];
    call_args.extend(fb.args(first_arg, arg_end));
    let call = fb.push(NamedFunction::invoke_basic(basic), call_args);
    fb.build(Some(call), shape.kind())
}

/// `(self, target, args...) => InvokeBasic(target, args...)`.
fn basic_invoker_form(basic: &MethodType) -> Arc<LambdaForm> {
    let mut params = vec![BasicType::L, BasicType::L];
    params.extend(basic.basic_parameter_types());
    let mut fb = FormBuilder::new(&params);
    let args = fb.args(1, params.len());
    let call = fb.push(NamedFunction::invoke_basic(basic), args);
    fb.build(Some(call), FormKind::BasicInvoker)
}
