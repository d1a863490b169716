//! Derivation of adapted forms, with per-form caching.
//!
//! Every operation first consults the base form's transform cache under a
//! key describing the edit. On a miss it edits a [`LambdaFormBuffer`] and
//! publishes the result; when two threads race, the first published form
//! wins and both callers receive it.

use std::sync::Arc;

use linkform_core::{BasicType, MAX_JVM_ARITY, MethodType, Ty};
use tracing::{debug, trace};

use crate::buffer::{LambdaFormBuffer, NameId};
use crate::context::FormContext;
use crate::error::{FormError, Result};
use crate::form::{Arg, FormKind, Intrinsic, LambdaForm, Name, NamedFunction};
use crate::species::Species;
use crate::transform::{TransformKey, TransformKind};

pub struct LambdaFormEditor<'a> {
    ctx: &'a FormContext,
    form: Arc<LambdaForm>,
}

impl<'a> LambdaFormEditor<'a> {
    pub(crate) fn new(ctx: &'a FormContext, form: &Arc<LambdaForm>) -> Self {
        Self {
            ctx,
            form: Arc::clone(form),
        }
    }

    pub fn form(&self) -> &Arc<LambdaForm> {
        &self.form
    }

    fn get_in_cache(&self, key: &TransformKey) -> Option<Arc<LambdaForm>> {
        let found = self.form.transforms().get(key);
        self.ctx.stats().record_lookup(found.is_some());
        trace!(
            target: "linkform::editor",
            kind = ?key.kind(),
            hit = found.is_some(),
            "transform cache lookup"
        );
        if let Some(form) = &found {
            self.ctx.retain_form(form);
        }
        found
    }

    fn put_in_cache(&self, key: TransformKey, form: Arc<LambdaForm>) -> Arc<LambdaForm> {
        let kind = key.kind();
        let capacity = self.ctx.config().get_transform_array_size();
        let published = self.form.transforms().put(key, form.clone(), capacity);
        let won = Arc::ptr_eq(&published, &form);
        self.ctx.stats().record_publish(won);
        debug!(
            target: "linkform::editor",
            kind = ?kind,
            won,
            form = %published.signature_line(),
            "derived form published"
        );
        self.ctx.retain_form(&published);
        published
    }

    fn buffer(&self) -> LambdaFormBuffer {
        LambdaFormBuffer::new(&self.form)
    }

    fn old_species(&self) -> Arc<Species> {
        assert_eq!(
            self.form.parameter_type(0),
            BasicType::L,
            "parameter 0 must be a reference"
        );
        match self.form.parameter_constraint(0) {
            Some(species) => Arc::clone(species),
            None => self.ctx.species().top(),
        }
    }

    fn new_species(&self, bt: BasicType) -> Arc<Species> {
        self.ctx.species().extend(&self.old_species(), bt)
    }

    fn expect_parameter_type(&self, pos: usize, requested: BasicType) -> Result<()> {
        let actual = self.form.parameter_type(pos);
        if actual != requested {
            return Err(FormError::TypeMismatch {
                position: pos,
                expected: actual,
                found: requested,
            });
        }
        Ok(())
    }

    /// Fail if adding and removing these parameters overflows the slot limit.
    fn check_slots(&self, added: &[BasicType], removed: &[BasicType]) -> Result<()> {
        let sum = |ts: &[BasicType]| ts.iter().map(|t| t.slots()).sum::<usize>();
        let slots = (sum(self.form.parameter_types()) + sum(added)).saturating_sub(sum(removed));
        if slots > MAX_JVM_ARITY {
            return Err(FormError::TooManyArguments {
                slots,
                limit: MAX_JVM_ARITY,
            });
        }
        Ok(())
    }

    /// Retarget existing carrier field reads to `new` and give parameter 0
    /// the new constraint. Returns the new parameter 0.
    fn switch_carrier(
        &self,
        buf: &mut LambdaFormBuffer,
        old: &Arc<Species>,
        new: &Arc<Species>,
    ) -> NameId {
        let old_base = buf.id_at(0);
        buf.replace_functions(&old.getters(), &new.getters(), &[Arg::Name(old_base)]);
        let new_base = buf.alloc(Name::carrier(Arc::clone(new)));
        buf.rename_parameter(0, new_base);
        new_base
    }

    /// Remove parameter `pos`; the form instead reads a value of type `bt`
    /// from a new trailing carrier field.
    pub fn bind_argument_form(&self, pos: usize, bt: BasicType) -> Result<Arc<LambdaForm>> {
        let arity = self.form.arity();
        assert!(pos < arity, "bind position {pos} out of range");
        self.expect_parameter_type(pos, bt)?;

        let key = TransformKey::of(TransformKind::BindArg, &[pos]);
        let old = self.old_species();
        let new = self.ctx.species().extend(&old, bt);
        if let Some(form) = self.get_in_cache(&key) {
            debug_assert_eq!(form.parameter_constraint(0), Some(&new));
            debug_assert_eq!(form.arity(), if pos == 0 { arity } else { arity - 1 });
            return Ok(form);
        }

        let mut buf = self.buffer();
        buf.start_edit();
        let getter = new.getter(old.field_count());
        if pos != 0 {
            let new_base = self.switch_carrier(&mut buf, &old, &new);
            let read = buf.alloc(Name::expr(getter, [Arg::Name(new_base)]));
            buf.replace_parameter_by_new_expression(pos, read);
        } else {
            assert!(old.is_top(), "binding parameter 0 of a carrier form");
            let new_base = buf.alloc(Name::carrier(Arc::clone(&new)));
            let read = buf.alloc(Name::expr(getter, [Arg::Name(new_base)]));
            buf.replace_parameter_by_new_expression(0, read);
            buf.insert_parameter(0, new_base);
        }
        Ok(self.put_in_cache(key, buf.end_edit()))
    }

    /// Insert an ignored parameter of type `bt` at `pos`.
    pub fn add_argument_form(&self, pos: usize, bt: BasicType) -> Result<Arc<LambdaForm>> {
        let arity = self.form.arity();
        assert!(pos > 0 && pos <= arity, "add position {pos} out of range");
        assert!(bt.is_arg(), "cannot add a void parameter");
        self.check_slots(&[bt], &[])?;

        let key = TransformKey::of(TransformKind::AddArg, &[pos, bt.ordinal() as usize]);
        if let Some(form) = self.get_in_cache(&key) {
            debug_assert_eq!(form.arity(), arity + 1);
            debug_assert_eq!(form.parameter_type(pos), bt);
            return Ok(form);
        }

        let mut buf = self.buffer();
        buf.start_edit();
        let param = buf.alloc(Name::param(bt));
        buf.insert_parameter(pos, param);
        Ok(self.put_in_cache(key, buf.end_edit()))
    }

    /// Merge parameter `dst` into parameter `src`: every use of `dst` reads `src`.
    pub fn dup_argument_form(&self, src: usize, dst: usize) -> Result<Arc<LambdaForm>> {
        let arity = self.form.arity();
        assert!(0 < src && src < dst && dst < arity, "dup {src} -> {dst} out of range");
        assert!(self.form.parameter_constraint(src).is_none());
        assert!(self.form.parameter_constraint(dst).is_none());
        self.expect_parameter_type(dst, self.form.parameter_type(src))?;

        let key = TransformKey::of(TransformKind::DupArg, &[src, dst]);
        if let Some(form) = self.get_in_cache(&key) {
            debug_assert_eq!(form.arity(), arity - 1);
            return Ok(form);
        }

        let mut buf = self.buffer();
        buf.start_edit();
        buf.replace_parameter_by_copy(dst, src);
        Ok(self.put_in_cache(key, buf.end_edit()))
    }

    /// Replace `count` parameters starting at `pos` by one array parameter
    /// whose elements supply them.
    pub fn spread_arguments_form(
        &self,
        pos: usize,
        array_type: &Ty,
        count: usize,
    ) -> Result<Arc<LambdaForm>> {
        let arity = self.form.arity();
        assert!(pos > 0 && pos + count <= arity, "spread {pos}+{count} out of range");
        let elem = array_type
            .component_type()
            .ok_or_else(|| FormError::NotAnArray {
                ty: array_type.clone(),
            })?
            .erase();
        let bt = elem.basic_type();
        for i in 0..count {
            self.expect_parameter_type(pos + i, bt)?;
        }
        self.check_slots(&[BasicType::L], &vec![bt; count])?;

        let key = TransformKey::of(
            TransformKind::SpreadArgs,
            &[pos, element_type_key(&elem), count],
        );
        if let Some(form) = self.get_in_cache(&key) {
            debug_assert_eq!(form.arity(), arity - count + 1);
            return Ok(form);
        }

        let mut buf = self.buffer();
        buf.start_edit();
        let spread = buf.alloc(Name::param(BasicType::L));
        let check = buf.alloc(Name::expr(
            Intrinsic::CheckSpreadLength.into(),
            [Arg::Name(spread), Arg::int(count as i32)],
        ));
        let mut expr_pos = buf.arity();
        buf.insert_expression(expr_pos, check);
        expr_pos += 1;
        for i in 0..count {
            let load = buf.alloc(Name::expr(
                Intrinsic::ArrayLoad(elem.clone()).into(),
                [Arg::Name(spread), Arg::int(i as i32)],
            ));
            buf.insert_expression(expr_pos + i, load);
            buf.replace_parameter_by_copy(pos + i, expr_pos + i);
        }
        buf.insert_parameter(pos, spread);
        Ok(self.put_in_cache(key, buf.end_edit()))
    }

    /// Pre-process parameter `pos`, now of type `new_type`, with a filter
    /// carried in a new trailing carrier field.
    pub fn filter_argument_form(&self, pos: usize, new_type: BasicType) -> Result<Arc<LambdaForm>> {
        let arity = self.form.arity();
        assert!(pos > 0 && pos < arity, "filter position {pos} out of range");
        assert!(new_type.is_arg());
        self.check_slots(&[new_type], &[self.form.parameter_type(pos)])?;

        let key = TransformKey::of(TransformKind::FilterArg, &[pos, new_type.ordinal() as usize]);
        if let Some(form) = self.get_in_cache(&key) {
            debug_assert_eq!(form.arity(), arity);
            debug_assert_eq!(form.parameter_type(pos), new_type);
            return Ok(form);
        }

        let old_type = self.form.parameter_type(pos);
        let filter_type = basic_method_type(old_type, &[new_type])?;
        let form = self.make_argument_combination_form(pos, &filter_type, false, false);
        Ok(self.put_in_cache(key, form))
    }

    /// Replace the parameter at `pos` with the collector's parameters; the
    /// collector's result (unless void) feeds the old parameter.
    pub fn collect_arguments_form(
        &self,
        pos: usize,
        collector: &MethodType,
    ) -> Result<Arc<LambdaForm>> {
        let collector = collector.basic_type();
        let collector_arity = collector.parameter_count();
        let drop_result = collector.basic_return_type() == BasicType::V;
        let arity = self.form.arity();
        assert!(pos > 0 && pos + usize::from(!drop_result) <= arity);
        if !drop_result {
            self.expect_parameter_type(pos, collector.basic_return_type())?;
        }
        if collector_arity == 1 && !drop_result {
            return self.filter_argument_form(pos, collector.basic_parameter_types()[0]);
        }
        let new_types = collector.basic_parameter_types();
        let removed = if drop_result {
            Vec::new()
        } else {
            vec![self.form.parameter_type(pos)]
        };
        self.check_slots(&new_types, &removed)?;

        let (kind, pos) = match (drop_result, collector_arity) {
            (true, 0) => (TransformKind::CollectArgsToVoid, 1),
            (true, _) => (TransformKind::CollectArgsToVoid, pos),
            (false, _) => (TransformKind::CollectArgs, pos),
        };
        let mut operands = vec![pos, collector_arity];
        operands.extend(new_types.iter().map(|t| t.ordinal() as usize));
        let key = TransformKey::of(kind, &operands);
        if let Some(form) = self.get_in_cache(&key) {
            debug_assert_eq!(
                form.arity(),
                arity - usize::from(!drop_result) + collector_arity
            );
            return Ok(form);
        }

        let form = self.make_argument_combination_form(pos, &collector, false, drop_result);
        Ok(self.put_in_cache(key, form))
    }

    /// Post-process the result with a filter carried in a new trailing
    /// carrier field, or replace it by the zero value of `new_type`.
    pub fn filter_return_form(
        &self,
        new_type: BasicType,
        constant_zero: bool,
    ) -> Result<Arc<LambdaForm>> {
        let kind = if constant_zero {
            TransformKind::FilterReturnToZero
        } else {
            TransformKind::FilterReturn
        };
        let key = TransformKey::of(kind, &[new_type.ordinal() as usize]);
        if let Some(form) = self.get_in_cache(&key) {
            debug_assert_eq!(form.arity(), self.form.arity());
            debug_assert_eq!(form.return_type(), new_type);
            return Ok(form);
        }

        let mut buf = self.buffer();
        buf.start_edit();
        let mut ins_pos = self.form.len();
        let call_filter = if constant_zero {
            (new_type != BasicType::V)
                .then(|| buf.alloc(Name::expr(Intrinsic::Zero(new_type).into(), [])))
        } else {
            let old = self.old_species();
            let new = self.new_species(BasicType::L);
            let new_base = self.switch_carrier(&mut buf, &old, &new);
            let get_filter = buf.alloc(Name::expr(
                new.getter(old.field_count()),
                [Arg::Name(new_base)],
            ));
            buf.insert_expression(ins_pos, get_filter);
            ins_pos += 1;
            let mut args = vec![Arg::Name(get_filter)];
            let filter_type = match self.form.result() {
                Some(result) => {
                    args.push(Arg::name(result));
                    basic_method_type(new_type, &[self.form.return_type()])?
                }
                None => basic_method_type(new_type, &[])?,
            };
            Some(buf.alloc(Name::expr(NamedFunction::invoke_basic(&filter_type), args)))
        };
        if let Some(call) = call_filter {
            buf.insert_expression(ins_pos, call);
        }
        buf.set_result(call_filter);
        Ok(self.put_in_cache(key, buf.end_edit()))
    }

    /// Run a combiner over the parameters after `pos`; its result (unless
    /// dropped) replaces parameter `pos`, and the combined parameters stay.
    pub fn fold_arguments_form(
        &self,
        pos: usize,
        drop_result: bool,
        combiner: &MethodType,
    ) -> Result<Arc<LambdaForm>> {
        let combiner = combiner.basic_type();
        let combiner_arity = combiner.parameter_count();
        let arity = self.form.arity();
        let result_arity = usize::from(!drop_result);
        assert!(pos > 0, "cannot fold into the handle parameter");
        let returns_void = combiner.basic_return_type() == BasicType::V;
        if returns_void != drop_result || pos + result_arity + combiner_arity > arity {
            return Err(FormError::IncompatibleCombiner {
                combiner,
                form: self.form.basic_method_type(),
            });
        }
        if !drop_result {
            self.expect_parameter_type(pos, combiner.basic_return_type())?;
        }
        for (i, t) in combiner.basic_parameter_types().into_iter().enumerate() {
            self.expect_parameter_type(pos + result_arity + i, t)?;
        }

        let kind = if drop_result {
            TransformKind::FoldArgsToVoid
        } else {
            TransformKind::FoldArgs
        };
        let key = TransformKey::of(kind, &[pos, combiner_arity]);
        if let Some(form) = self.get_in_cache(&key) {
            debug_assert_eq!(form.arity(), arity - result_arity);
            return Ok(form);
        }

        let form = self.make_argument_combination_form(pos, &combiner, true, drop_result);
        Ok(self.put_in_cache(key, form))
    }

    fn make_argument_combination_form(
        &self,
        pos: usize,
        combiner: &MethodType,
        keep_arguments: bool,
        drop_result: bool,
    ) -> Arc<LambdaForm> {
        let combiner_arity = combiner.parameter_count();
        let result_arity = usize::from(!drop_result);
        assert!(pos > 0 && pos <= MAX_JVM_ARITY);
        assert!(
            pos + result_arity + if keep_arguments { combiner_arity } else { 0 }
                <= self.form.arity()
        );
        assert!(combiner.is_basic());
        assert!(combiner.basic_return_type() != BasicType::V || drop_result);

        let mut buf = self.buffer();
        buf.start_edit();
        let old = self.old_species();
        let new = self.new_species(BasicType::L);
        let new_base = self.switch_carrier(&mut buf, &old, &new);
        let get_combiner = buf.alloc(Name::expr(
            new.getter(old.field_count()),
            [Arg::Name(new_base)],
        ));

        let arg_pos = pos + result_arity;
        let mut combiner_args = vec![Arg::Name(get_combiner)];
        let mut new_params = Vec::new();
        if keep_arguments {
            combiner_args.extend((0..combiner_arity).map(|i| buf.arg_at(arg_pos + i)));
        } else {
            for t in combiner.basic_parameter_types() {
                let param = buf.alloc(Name::param(t));
                new_params.push(param);
                combiner_args.push(Arg::Name(param));
            }
        }
        let call_combiner = buf.alloc(Name::expr(
            NamedFunction::invoke_basic(combiner),
            combiner_args,
        ));

        let expr_pos = self.form.arity();
        buf.insert_expression(expr_pos, get_combiner);
        buf.insert_expression(expr_pos + 1, call_combiner);
        for (i, &param) in new_params.iter().enumerate() {
            buf.insert_parameter(arg_pos + i, param);
        }
        let call_pos = expr_pos + 1 + new_params.len();
        debug_assert_eq!(buf.last_index_of(call_combiner), Some(call_pos));
        if !drop_result {
            buf.replace_parameter_by_copy(pos, call_pos);
        }
        buf.end_edit()
    }

    /// Reorder the parameters after the first `skip`: outgoing parameter
    /// `skip + i` is supplied by incoming parameter `skip + reorder[i]`.
    ///
    /// `reorder` must be a permutation. The identity returns the base form.
    pub fn permute_arguments_form(
        &self,
        skip: usize,
        reorder: &[usize],
    ) -> Result<Arc<LambdaForm>> {
        assert_eq!(skip, 1, "only the handle parameter is skipped");
        let form = &self.form;
        let arity = form.arity();
        let out_args = reorder.len();
        assert_eq!(skip + out_args, arity, "reorder must cover every argument");
        if reorder.iter().enumerate().all(|(i, &r)| i == r) {
            return Ok(Arc::clone(form));
        }
        let mut seen = vec![false; out_args];
        for &r in reorder {
            assert!(r < out_args && !seen[r], "reorder {reorder:?} is not a permutation");
            seen[r] = true;
        }

        let key = TransformKey::of(TransformKind::PermuteArgs, reorder);
        if let Some(found) = self.get_in_cache(&key) {
            debug_assert_eq!(found.arity(), arity);
            return Ok(found);
        }

        let mut types = vec![BasicType::V; out_args];
        for (i, &in_arg) in reorder.iter().enumerate() {
            types[in_arg] = form.parameter_type(skip + i);
        }
        let moved = |p: u32| -> u32 {
            let p = p as usize;
            if p < skip || p >= arity {
                p as u32
            } else {
                (skip + reorder[p - skip]) as u32
            }
        };
        let mut names: Vec<Name> = form.names()[..skip].to_vec();
        names.extend(types.into_iter().map(Name::param));
        for name in &form.names()[arity..] {
            names.push(name.map_args(moved).unwrap_or_else(|| name.clone()));
        }
        let result = form.result().map(|r| moved(r as u32) as usize);
        let permuted = LambdaForm::new(arity, names, result, FormKind::Generic);
        Ok(self.put_in_cache(key, permuted))
    }
}

/// Distinguishes subword arrays from `int[]`, since their loads differ.
fn element_type_key(elem: &Ty) -> usize {
    let subword = match elem {
        Ty::Boolean => 0,
        Ty::Byte => 1,
        Ty::Short => 2,
        Ty::Char => 3,
        _ => return elem.basic_type().ordinal() as usize,
    };
    BasicType::LIMIT as usize + subword
}

fn basic_method_type(ret: BasicType, params: &[BasicType]) -> Result<MethodType> {
    Ok(MethodType::of_basic(ret, params)?)
}
