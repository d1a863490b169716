//! Handle adapters.
//!
//! Each adapter checks the handle-level types, rebinds the target as a
//! carrier, derives the adapted form through the editor and wraps it in a
//! new handle. Adapter functions (filters, combiners) travel in new
//! carrier fields.

use std::sync::Arc;

use linkform_compiler::{FormError, LambdaForm};
use linkform_core::{MethodType, Ty};

use super::error::{Result, RuntimeError};
use super::handle::{MethodHandle, check_handle_arity};
use super::runtime::Runtime;
use super::value::Value;

impl MethodHandle {
    /// View this handle as `ty`, which must have the same basic type.
    pub fn as_type(self: &Arc<Self>, ty: &MethodType) -> Result<Arc<Self>> {
        if self.ty() == ty {
            return Ok(Arc::clone(self));
        }
        if self.ty().basic_type() != ty.basic_type() {
            return Err(RuntimeError::WrongMethodType {
                expected: ty.clone(),
                found: self.ty().clone(),
            });
        }
        Ok(self.copy_with(ty.clone(), self.form()))
    }

    /// Fix parameter `pos` to `value`.
    pub fn bind_argument(
        self: &Arc<Self>,
        rt: &Runtime,
        pos: usize,
        value: Value,
    ) -> Result<Arc<Self>> {
        let ty = self.ty();
        assert!(
            pos < ty.parameter_count(),
            "bind position {pos} out of range for {ty}"
        );
        let bt = ty.parameter_type(pos).basic_type();
        if value.basic_type() != bt {
            return Err(RuntimeError::ArgumentType {
                position: pos,
                expected: bt,
                found: value.basic_type(),
            });
        }
        let carrier = self.rebind(rt);
        let form = rt
            .context()
            .editor(&carrier.form())
            .bind_argument_form(1 + pos, bt)?;
        let new_ty = ty.drop_parameter_types(pos, pos + 1);
        Ok(carrier.copy_with_extra(new_ty, form, value))
    }

    /// Bind `values` to the parameters starting at `pos`.
    pub fn insert_arguments(
        self: &Arc<Self>,
        rt: &Runtime,
        pos: usize,
        values: Vec<Value>,
    ) -> Result<Arc<Self>> {
        let mut result = Arc::clone(self);
        for value in values {
            result = result.bind_argument(rt, pos, value)?;
        }
        Ok(result)
    }

    /// Accept and ignore extra parameters of `types` at `pos`.
    pub fn drop_arguments(
        self: &Arc<Self>,
        rt: &Runtime,
        pos: usize,
        types: &[Ty],
    ) -> Result<Arc<Self>> {
        let ty = self.ty();
        assert!(
            pos <= ty.parameter_count(),
            "drop position {pos} out of range for {ty}"
        );
        let new_ty = ty.insert_parameter_types(pos, types)?;
        if types.is_empty() {
            return Ok(Arc::clone(self));
        }
        // One edit per type; fail before the first one is cached.
        check_handle_arity(&new_ty)?;
        let carrier = self.rebind(rt);
        let mut form = carrier.form();
        for (i, t) in types.iter().enumerate() {
            form = rt
                .context()
                .editor(&form)
                .add_argument_form(1 + pos + i, t.basic_type())?;
        }
        Ok(carrier.copy_with(new_ty, form))
    }

    /// Remove parameter `dst`; the target receives parameter `src` in its place.
    pub fn dup_arguments(
        self: &Arc<Self>,
        rt: &Runtime,
        src: usize,
        dst: usize,
    ) -> Result<Arc<Self>> {
        let ty = self.ty();
        assert!(
            src < dst && dst < ty.parameter_count(),
            "dup {src} -> {dst} out of range for {ty}"
        );
        if ty.parameter_type(src) != ty.parameter_type(dst) {
            return Err(RuntimeError::InvalidReorder {
                reason: format!(
                    "parameter {dst} ({}) cannot alias parameter {src} ({})",
                    ty.parameter_type(dst),
                    ty.parameter_type(src)
                ),
            });
        }
        let carrier = self.rebind(rt);
        let form = rt
            .context()
            .editor(&carrier.form())
            .dup_argument_form(1 + src, 1 + dst)?;
        Ok(carrier.copy_with(ty.drop_parameter_types(dst, dst + 1), form))
    }

    /// Take the `count` parameters at `pos` from one array argument.
    pub fn spread_arguments(
        self: &Arc<Self>,
        rt: &Runtime,
        pos: usize,
        array_type: &Ty,
        count: usize,
    ) -> Result<Arc<Self>> {
        let ty = self.ty();
        assert!(
            pos + count <= ty.parameter_count(),
            "spread {pos}+{count} out of range for {ty}"
        );
        let new_ty = ty
            .drop_parameter_types(pos, pos + count)
            .insert_parameter_types(pos, std::slice::from_ref(array_type))?;
        let carrier = self.rebind(rt);
        let form = rt
            .context()
            .editor(&carrier.form())
            .spread_arguments_form(1 + pos, array_type, count)?;
        Ok(carrier.copy_with(new_ty, form))
    }

    /// Pre-process parameter `pos` with the one-argument `filter`.
    pub fn filter_argument(
        self: &Arc<Self>,
        rt: &Runtime,
        pos: usize,
        filter: &Arc<MethodHandle>,
    ) -> Result<Arc<Self>> {
        let ty = self.ty();
        assert!(
            pos < ty.parameter_count(),
            "filter position {pos} out of range for {ty}"
        );
        let fty = filter.ty();
        if fty.parameter_count() != 1 || fty.return_type() != ty.parameter_type(pos) {
            return Err(incompatible(fty, ty));
        }
        let new_param = fty.parameter_type(0).clone();
        let carrier = self.rebind(rt);
        let form = rt
            .context()
            .editor(&carrier.form())
            .filter_argument_form(1 + pos, new_param.basic_type())?;
        let new_ty = ty.change_parameter_type(pos, new_param)?;
        Ok(carrier.copy_with_extra(new_ty, form, Value::Handle(Arc::clone(filter))))
    }

    /// Replace parameter `pos` by the collector's parameters; the
    /// collector's result (unless void) becomes the target's argument.
    pub fn collect_arguments(
        self: &Arc<Self>,
        rt: &Runtime,
        pos: usize,
        collector: &Arc<MethodHandle>,
    ) -> Result<Arc<Self>> {
        let ty = self.ty();
        let cty = collector.ty();
        let returns_void = cty.return_type().is_void();
        let removed = usize::from(!returns_void);
        assert!(
            pos + removed <= ty.parameter_count(),
            "collect position {pos} out of range for {ty}"
        );
        if !returns_void && cty.return_type() != ty.parameter_type(pos) {
            return Err(incompatible(cty, ty));
        }
        let new_ty = ty
            .drop_parameter_types(pos, pos + removed)
            .insert_parameter_types(pos, cty.parameter_types())?;
        let carrier = self.rebind(rt);
        let form = rt
            .context()
            .editor(&carrier.form())
            .collect_arguments_form(1 + pos, cty)?;
        Ok(carrier.copy_with_extra(new_ty, form, Value::Handle(Arc::clone(collector))))
    }

    /// Post-process the result with `filter`.
    pub fn filter_return(
        self: &Arc<Self>,
        rt: &Runtime,
        filter: &Arc<MethodHandle>,
    ) -> Result<Arc<Self>> {
        let ty = self.ty();
        let fty = filter.ty();
        let fits = if ty.return_type().is_void() {
            fty.parameter_count() == 0
        } else {
            fty.parameter_types() == std::slice::from_ref(ty.return_type())
        };
        if !fits {
            return Err(incompatible(fty, ty));
        }
        let carrier = self.rebind(rt);
        let form = rt
            .context()
            .editor(&carrier.form())
            .filter_return_form(fty.basic_return_type(), false)?;
        let new_ty = ty.change_return_type(fty.return_type().clone());
        Ok(carrier.copy_with_extra(new_ty, form, Value::Handle(Arc::clone(filter))))
    }

    /// Discard the result and return the zero value of `rtype` instead.
    pub fn zero_return(self: &Arc<Self>, rt: &Runtime, rtype: Ty) -> Result<Arc<Self>> {
        let carrier = self.rebind(rt);
        let form = rt
            .context()
            .editor(&carrier.form())
            .filter_return_form(rtype.basic_type(), true)?;
        Ok(carrier.copy_with(self.ty().change_return_type(rtype), form))
    }

    pub fn drop_return(self: &Arc<Self>, rt: &Runtime) -> Result<Arc<Self>> {
        self.zero_return(rt, Ty::Void)
    }

    /// Pre-compute an argument from the parameters after `pos`. A void
    /// combiner only runs for its effects.
    pub fn fold_arguments(
        self: &Arc<Self>,
        rt: &Runtime,
        pos: usize,
        combiner: &Arc<MethodHandle>,
    ) -> Result<Arc<Self>> {
        let ty = self.ty();
        let cty = combiner.ty();
        let drop_result = cty.return_type().is_void();
        let folded = pos + usize::from(!drop_result);
        let end = folded + cty.parameter_count();
        let fits = end <= ty.parameter_count()
            && (drop_result || cty.return_type() == ty.parameter_type(pos))
            && cty.parameter_types() == &ty.parameter_types()[folded..end];
        if !fits {
            return Err(incompatible(cty, ty));
        }
        let new_ty = ty.drop_parameter_types(pos, folded);
        let carrier = self.rebind(rt);
        let form = rt
            .context()
            .editor(&carrier.form())
            .fold_arguments_form(1 + pos, drop_result, cty)?;
        Ok(carrier.copy_with_extra(new_ty, form, Value::Handle(Arc::clone(combiner))))
    }

    /// Adapt to `new_type`: the target's argument `i` is the new
    /// argument `reorder[i]`. New arguments may be used several times or
    /// not at all.
    pub fn permute_arguments(
        self: &Arc<Self>,
        rt: &Runtime,
        new_type: &MethodType,
        reorder: &[usize],
    ) -> Result<Arc<Self>> {
        check_reorder(self.ty(), new_type, reorder)?;
        let carrier = self.rebind(rt);
        let ctx = rt.context();
        let mut form: Arc<LambdaForm> = carrier.form();
        let mut reorder = reorder.to_vec();
        // Normalize to a true permutation: merge duplicates, add dropped arguments.
        loop {
            match first_dup_or_drop(&reorder, new_type.parameter_count()) {
                DupOrDrop::Dup(dst) => {
                    let dup = reorder[dst];
                    let Some(src) = reorder[..dst].iter().position(|&r| r == dup) else {
                        unreachable!("duplicate at {dst} has an earlier occurrence");
                    };
                    form = ctx.editor(&form).dup_argument_form(1 + src, 1 + dst)?;
                    reorder.remove(dst);
                }
                DupOrDrop::Drop(value) => {
                    let ins = reorder.iter().position(|&r| r > value).unwrap_or(reorder.len());
                    let bt = new_type.parameter_type(value).basic_type();
                    form = ctx.editor(&form).add_argument_form(1 + ins, bt)?;
                    reorder.insert(ins, value);
                }
                DupOrDrop::Permutation => break,
            }
        }
        let form = ctx.editor(&form).permute_arguments_form(1, &reorder)?;
        Ok(carrier.copy_with(new_type.clone(), form))
    }
}

fn incompatible(combiner: &MethodType, target: &MethodType) -> RuntimeError {
    FormError::IncompatibleCombiner {
        combiner: combiner.clone(),
        form: target.clone(),
    }
    .into()
}

fn check_reorder(old: &MethodType, new: &MethodType, reorder: &[usize]) -> Result<()> {
    let bad = |reason: String| Err(RuntimeError::InvalidReorder { reason });
    if reorder.len() != old.parameter_count() {
        return bad(format!(
            "{} entries for {} target parameters",
            reorder.len(),
            old.parameter_count()
        ));
    }
    if old.return_type() != new.return_type() {
        return bad(format!("return types of {old} and {new} differ"));
    }
    for (i, &r) in reorder.iter().enumerate() {
        if r >= new.parameter_count() {
            return bad(format!("index {r} out of range for {new}"));
        }
        if new.parameter_type(r) != old.parameter_type(i) {
            return bad(format!(
                "parameter {r} of {new} cannot feed parameter {i} of {old}"
            ));
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
pub(super) enum DupOrDrop {
    /// Position of the first repeated entry.
    Dup(usize),
    /// Smallest new argument no entry uses.
    Drop(usize),
    Permutation,
}

pub(super) fn first_dup_or_drop(reorder: &[usize], new_arity: usize) -> DupOrDrop {
    let mut seen = vec![false; new_arity];
    for (i, &r) in reorder.iter().enumerate() {
        if seen[r] {
            return DupOrDrop::Dup(i);
        }
        seen[r] = true;
    }
    match seen.iter().position(|&s| !s) {
        Some(missing) => DupOrDrop::Drop(missing),
        None => DupOrDrop::Permutation,
    }
}
