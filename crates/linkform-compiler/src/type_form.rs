//! Per-erasure shape data and linkage caches.
//!
//! Every method type maps to the `MethodTypeForm` of its erasure. Forms of
//! non-basic erasures (subword primitives) hold the same counts and
//! delegate their caches to the basic erasure's form.

use std::any::Any;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use dashmap::DashMap;
use linkform_core::{MethodType, Ty};

use crate::error::FormError;
use crate::form::LambdaForm;
use crate::soft::SoftRetainer;

pub type AnyHandle = dyn Any + Send + Sync;

/// Cached form slots of a basic erasure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FormPurpose {
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
    InvokeStaticInit,
    NewInvokeSpecialInit,
    ExactLinker,
    ExactInvoker,
    GenericLinker,
    GenericInvoker,
    BasicInvoker,
    BoundReinvoker,
    Empty,
}

impl FormPurpose {
    pub const COUNT: usize = 14;
}

/// Cached handle slots of a basic erasure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandlePurpose {
    BasicInvoker,
    Empty,
}

impl HandlePurpose {
    pub const COUNT: usize = 2;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArgCounts {
    pub parameters: usize,
    pub parameter_slots: usize,
    pub primitive_parameters: usize,
    pub long_parameters: usize,
    pub returns: usize,
    pub return_slots: usize,
    pub primitive_returns: usize,
    pub long_returns: usize,
}

impl ArgCounts {
    fn of(mt: &MethodType) -> Self {
        let mut counts = ArgCounts {
            parameters: mt.parameter_count(),
            parameter_slots: mt.parameter_slot_count(),
            ..Default::default()
        };
        for t in mt.parameter_types() {
            if t.is_primitive() {
                counts.primitive_parameters += 1;
                if t.is_double_width() {
                    counts.long_parameters += 1;
                }
            }
        }
        let rtype = mt.return_type();
        if !rtype.is_void() {
            counts.returns = 1;
            counts.return_slots = rtype.basic_type().slots();
            if rtype.is_primitive() {
                counts.primitive_returns = 1;
                counts.long_returns = usize::from(rtype.is_double_width());
            }
        }
        counts
    }
}

/// Mapping between argument indexes and interpreter slots.
///
/// Each table carries a trailing sentinel: `arg_to_slot[n]` is the total
/// slot count and `slot_to_arg[slots]` is the argument count.
#[derive(Debug, PartialEq, Eq)]
pub struct SlotTable {
    arg_to_slot: Box<[usize]>,
    slot_to_arg: Box<[usize]>,
}

impl SlotTable {
    fn single_slot(arity: usize) -> Self {
        let table: Box<[usize]> = (0..=arity).collect();
        Self {
            arg_to_slot: table.clone(),
            slot_to_arg: table,
        }
    }

    fn of(ptypes: &[Ty]) -> Self {
        let mut arg_to_slot = Vec::with_capacity(ptypes.len() + 1);
        let mut slot_to_arg = Vec::new();
        for (arg, t) in ptypes.iter().enumerate() {
            arg_to_slot.push(slot_to_arg.len());
            for _ in 0..t.basic_type().slots() {
                slot_to_arg.push(arg);
            }
        }
        arg_to_slot.push(slot_to_arg.len());
        slot_to_arg.push(ptypes.len());
        Self {
            arg_to_slot: arg_to_slot.into(),
            slot_to_arg: slot_to_arg.into(),
        }
    }

    pub fn arg_to_slot(&self, arg: usize) -> usize {
        self.arg_to_slot[arg]
    }

    /// The argument occupying `slot` (both halves of a double-width value map to it).
    pub fn slot_to_arg(&self, slot: usize) -> usize {
        self.slot_to_arg[slot]
    }
}

pub struct MethodTypeForm {
    erased: MethodType,
    basic: MethodType,
    counts: ArgCounts,
    slots: Arc<SlotTable>,
    basic_form: Option<Arc<MethodTypeForm>>,
    forms: Box<[RwLock<Weak<LambdaForm>>]>,
    handles: Box<[RwLock<Option<Weak<AnyHandle>>>]>,
    form_retainer: Arc<SoftRetainer<LambdaForm>>,
    handle_retainer: Arc<SoftRetainer<AnyHandle>>,
}

impl MethodTypeForm {
    pub fn erased_type(&self) -> &MethodType {
        &self.erased
    }

    pub fn basic_type(&self) -> &MethodType {
        &self.basic
    }

    pub fn counts(&self) -> &ArgCounts {
        &self.counts
    }

    pub fn is_basic(&self) -> bool {
        self.basic_form.is_none()
    }

    /// The form of the basic erasure: `self` when already basic.
    pub fn basic_form(&self) -> &MethodTypeForm {
        self.basic_form.as_deref().unwrap_or(self)
    }

    pub fn slot_table(&self) -> &Arc<SlotTable> {
        &self.slots
    }

    /// Whether the slot table is private to this form (double-width parameters present).
    pub fn has_private_slot_table(&self) -> bool {
        self.counts.long_parameters > 0
    }

    pub fn arg_to_slot(&self, arg: usize) -> usize {
        self.slots.arg_to_slot(arg)
    }

    pub fn slot_to_arg(&self, slot: usize) -> usize {
        self.slots.slot_to_arg(slot)
    }

    pub fn cached_form(&self, purpose: FormPurpose) -> Option<Arc<LambdaForm>> {
        let this = self.basic_form();
        let slot = this.forms[purpose as usize]
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let form = slot.upgrade()?;
        this.form_retainer.retain(&form);
        Some(form)
    }

    /// Publish `form` unless a live form already occupies the slot; returns
    /// the form that occupies it afterwards.
    pub fn set_cached_form(&self, purpose: FormPurpose, form: Arc<LambdaForm>) -> Arc<LambdaForm> {
        let this = self.basic_form();
        let mut slot = this.forms[purpose as usize]
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(prev) = slot.upgrade() {
            return prev;
        }
        *slot = Arc::downgrade(&form);
        this.form_retainer.retain(&form);
        form
    }

    /// Cached form, building it outside any lock on a miss.
    pub fn cached_form_or_try_insert<E>(
        &self,
        purpose: FormPurpose,
        build: impl FnOnce() -> Result<Arc<LambdaForm>, E>,
    ) -> Result<Arc<LambdaForm>, E> {
        if let Some(form) = self.cached_form(purpose) {
            return Ok(form);
        }
        let form = build()?;
        Ok(self.set_cached_form(purpose, form))
    }

    pub fn cached_handle<T: Any + Send + Sync>(&self, purpose: HandlePurpose) -> Option<Arc<T>> {
        let this = self.basic_form();
        let slot = this.handles[purpose as usize]
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let handle = slot.as_ref()?.upgrade()?;
        this.handle_retainer.retain(&handle);
        handle.downcast::<T>().ok()
    }

    pub fn set_cached_handle<T: Any + Send + Sync>(
        &self,
        purpose: HandlePurpose,
        handle: Arc<T>,
    ) -> Result<Arc<T>, FormError> {
        let this = self.basic_form();
        let mut slot = this.handles[purpose as usize]
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(prev) = slot.as_ref().and_then(Weak::upgrade) {
            return prev
                .downcast::<T>()
                .map_err(|_| FormError::HandleSlotConflict { purpose });
        }
        let erased: Arc<AnyHandle> = handle.clone();
        *slot = Some(Arc::downgrade(&erased));
        this.handle_retainer.retain(&erased);
        Ok(handle)
    }
}

/// Interning table from erased method types to their forms.
pub struct TypeFormRegistry {
    forms: DashMap<MethodType, Arc<MethodTypeForm>>,
    shared_slots: DashMap<usize, Arc<SlotTable>>,
    form_retainer: Arc<SoftRetainer<LambdaForm>>,
    handle_retainer: Arc<SoftRetainer<AnyHandle>>,
}

impl TypeFormRegistry {
    pub fn new(
        form_retainer: Arc<SoftRetainer<LambdaForm>>,
        handle_retainer: Arc<SoftRetainer<AnyHandle>>,
    ) -> Self {
        Self {
            forms: DashMap::new(),
            shared_slots: DashMap::new(),
            form_retainer,
            handle_retainer,
        }
    }

    /// The form of `mt`'s erasure. Concurrent first lookups agree on one form.
    pub fn find(&self, mt: &MethodType) -> Arc<MethodTypeForm> {
        let erased = mt.erase();
        if let Some(found) = self.forms.get(&erased) {
            return Arc::clone(&found);
        }
        // Built without holding a shard lock: the basic form may live in the same shard.
        let basic_form = (!erased.is_basic()).then(|| self.find(&erased.basic_type()));
        let built = Arc::new(self.build(erased.clone(), basic_form));
        Arc::clone(self.forms.entry(erased).or_insert(built).value())
    }

    fn build(&self, erased: MethodType, basic_form: Option<Arc<MethodTypeForm>>) -> MethodTypeForm {
        let counts = ArgCounts::of(&erased);
        let slots = if counts.long_parameters > 0 {
            Arc::new(SlotTable::of(erased.parameter_types()))
        } else {
            let arity = counts.parameters;
            Arc::clone(
                self.shared_slots
                    .entry(arity)
                    .or_insert_with(|| Arc::new(SlotTable::single_slot(arity)))
                    .value(),
            )
        };
        let forms = (0..FormPurpose::COUNT).map(|_| RwLock::new(Weak::new())).collect();
        let handles = (0..HandlePurpose::COUNT).map(|_| RwLock::new(None)).collect();
        MethodTypeForm {
            basic: erased.basic_type(),
            erased,
            counts,
            slots,
            basic_form,
            forms,
            handles,
            form_retainer: Arc::clone(&self.form_retainer),
            handle_retainer: Arc::clone(&self.handle_retainer),
        }
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}
