//! Method handles: a type, a swappable form and the data the form reads.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use linkform_compiler::{
    FormBuilder, FormKind, FormPurpose, HandlePurpose, Intrinsic, LambdaForm, NamedFunction,
    Species,
};
use linkform_core::{BasicType, MAX_MH_ARITY, MethodType, TypeError};

use super::direct::MemberName;
use super::error::Result;
use super::runtime::Runtime;
use super::value::Value;

/// What a handle's form reads from the handle itself.
#[derive(Clone)]
pub enum HandleData {
    /// Nothing: the form is self-contained.
    Simple,
    /// A carrier: field values laid out as `species` describes.
    Bound {
        species: Arc<Species>,
        values: Vec<Value>,
    },
    /// A handle that dispatches to a member.
    Direct { member: Arc<MemberName> },
}

pub struct MethodHandle {
    ty: MethodType,
    form: RwLock<Arc<LambdaForm>>,
    data: HandleData,
}

impl MethodHandle {
    pub(crate) fn new(ty: MethodType, form: Arc<LambdaForm>, data: HandleData) -> Arc<Self> {
        debug_assert_eq!(
            form.parameter_types().get(1..),
            Some(ty.basic_parameter_types().as_slice()),
            "form {form} does not fit {ty}"
        );
        debug_assert_eq!(form.return_type(), ty.basic_return_type());
        if let HandleData::Bound { species, values } = &data {
            debug_assert_eq!(form.parameter_constraint(0), Some(species));
            debug_assert_eq!(species.field_count(), values.len());
        }
        Arc::new(Self {
            ty,
            form: RwLock::new(form),
            data,
        })
    }

    /// A handle calling the host primitive `name`.
    pub fn external(rt: &Runtime, name: &str, ty: &MethodType) -> Result<Arc<Self>> {
        check_handle_arity(ty)?;
        let mut params = vec![BasicType::L];
        params.extend(ty.basic_parameter_types());
        let mut fb = FormBuilder::new(&params);
        let args = fb.args(1, params.len());
        let call = fb.push(NamedFunction::external(name, ty), args);
        let form = fb.build(Some(call), FormKind::External);
        rt.context().retain_form(&form);
        Ok(Self::new(ty.clone(), form, HandleData::Simple))
    }

    /// A handle that ignores its arguments and returns the zero value of
    /// its return type.
    pub fn empty(rt: &Runtime, ty: &MethodType) -> Result<Arc<Self>> {
        check_handle_arity(ty)?;
        let basic = ty.basic_type();
        let tf = rt.context().type_form(&basic);
        let handle = match tf.cached_handle::<MethodHandle>(HandlePurpose::Empty) {
            Some(handle) => handle,
            None => {
                let form = match tf.cached_form(FormPurpose::Empty) {
                    Some(form) => form,
                    None => tf.set_cached_form(FormPurpose::Empty, empty_form(&basic)),
                };
                let handle = Self::new(basic.clone(), form, HandleData::Simple);
                tf.set_cached_handle(HandlePurpose::Empty, handle)?
            }
        };
        handle.as_type(ty)
    }

    #[inline]
    pub fn ty(&self) -> &MethodType {
        &self.ty
    }

    /// The current form. Direct handles behind an initialization barrier
    /// switch forms once the barrier is passed.
    pub fn form(&self) -> Arc<LambdaForm> {
        let form = self.form.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&form)
    }

    pub(crate) fn update_form(&self, form: Arc<LambdaForm>) {
        debug_assert_eq!(form.basic_method_type(), self.form().basic_method_type());
        let mut slot = self.form.write().unwrap_or_else(PoisonError::into_inner);
        *slot = form;
    }

    pub fn data(&self) -> &HandleData {
        &self.data
    }

    /// Carrier species, if this handle binds values.
    pub fn species(&self) -> Option<&Arc<Species>> {
        match &self.data {
            HandleData::Bound { species, .. } => Some(species),
            _ => None,
        }
    }

    pub fn bound_values(&self) -> &[Value] {
        match &self.data {
            HandleData::Bound { values, .. } => values,
            _ => &[],
        }
    }

    pub fn member(&self) -> Option<&Arc<MemberName>> {
        match &self.data {
            HandleData::Direct { member } => Some(member),
            _ => None,
        }
    }

    /// Same data, new type and form.
    pub(crate) fn copy_with(&self, ty: MethodType, form: Arc<LambdaForm>) -> Arc<Self> {
        Self::new(ty, form, self.data.clone())
    }

    /// Same data plus one more carrier field holding `value`.
    ///
    /// `form`'s parameter 0 must already be constrained to the extended species.
    pub(crate) fn copy_with_extra(
        &self,
        ty: MethodType,
        form: Arc<LambdaForm>,
        value: Value,
    ) -> Arc<Self> {
        let mut values = self.bound_values().to_vec();
        values.push(value);
        let species = match form.parameter_constraint(0) {
            Some(species) => Arc::clone(species),
            None => unreachable!("carrier form without a species: {form}"),
        };
        Self::new(ty, form, HandleData::Bound { species, values })
    }

    /// This handle as a carrier, wrapping it in a bound reinvoker first if
    /// it carries nothing.
    pub(crate) fn rebind(self: &Arc<Self>, rt: &Runtime) -> Arc<Self> {
        if self.species().is_some() {
            return Arc::clone(self);
        }
        let ctx = rt.context();
        let basic = self.ty.basic_type();
        let tf = ctx.type_form(&basic);
        let form = match tf.cached_form(FormPurpose::BoundReinvoker) {
            Some(form) => form,
            None => tf.set_cached_form(FormPurpose::BoundReinvoker, reinvoker_form(rt, &basic)),
        };
        let species = ctx.species().species(&[BasicType::L]);
        Self::new(
            self.ty.clone(),
            form,
            HandleData::Bound {
                species,
                values: vec![Value::Handle(Arc::clone(self))],
            },
        )
    }
}

/// Handle forms take the handle as parameter 0, so a handle type leaves
/// one slot of the method limit free.
pub(crate) fn check_handle_arity(ty: &MethodType) -> Result<()> {
    let slots = ty.parameter_slot_count();
    if slots > MAX_MH_ARITY {
        return Err(TypeError::TooManyArguments {
            slots,
            limit: MAX_MH_ARITY,
        }
        .into());
    }
    Ok(())
}

/// `(a0:L/L, args...) => InvokeBasic(BoundField[L.0](a0), args...)`.
fn reinvoker_form(rt: &Runtime, basic: &MethodType) -> Arc<LambdaForm> {
    let species = rt.context().species().species(&[BasicType::L]);
    let params = basic.basic_parameter_types();
    let mut fb = FormBuilder::with_carrier(Arc::clone(&species), &params);
    let carrier = fb.arg(0);
    let target = fb.push(species.getter(0), vec![carrier]);
    let mut args = vec![fb.arg(target)];
    args.extend(fb.args(1, fb.arity()));
    let call = fb.push(NamedFunction::invoke_basic(basic), args);
    fb.build(Some(call), FormKind::BoundReinvoker)
}

fn empty_form(basic: &MethodType) -> Arc<LambdaForm> {
    let mut params = vec![BasicType::L];
    params.extend(basic.basic_parameter_types());
    let mut fb = FormBuilder::new(&params);
    let rtype = basic.basic_return_type();
    let result = (rtype != BasicType::V).then(|| fb.push(Intrinsic::Zero(rtype), Vec::new()));
    fb.build(result, FormKind::Empty)
}

impl fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodHandle{} {}", self.ty, self.form().signature_line())
    }
}
