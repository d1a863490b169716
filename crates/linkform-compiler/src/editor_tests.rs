use std::sync::Arc;

use linkform_core::{BasicType, Ty};

use crate::context::FormContext;
use crate::error::FormError;
use crate::form::{FormBuilder, FormKind};
use crate::test_utils::{call_f, mt, passthrough};

use BasicType::{I, J, L, V};

#[test]
fn bind_argument_reads_new_carrier_field() {
    let ctx = FormContext::new();
    let base = call_f();
    let bound = ctx.editor(&base).bind_argument_form(1, L).unwrap();

    assert_eq!(bound.arity(), 2);
    assert_eq!(bound.parameter_constraint(0).unwrap().key(), "L");
    assert_eq!(
        bound.signature_line(),
        "(a0:L/L,a1:L)=>{t2:L=BoundField[L.0](a0);t3:L=f(t2,a1);}t3"
    );
}

#[test]
fn bind_twice_retargets_existing_field_reads() {
    let ctx = FormContext::new();
    let once = ctx.editor(&call_f()).bind_argument_form(1, L).unwrap();
    let twice = ctx.editor(&once).bind_argument_form(1, L).unwrap();

    assert_eq!(twice.arity(), 1);
    assert_eq!(
        twice.signature_line(),
        "(a0:L/LL)=>{t1:L=BoundField[LL.1](a0);t2:L=BoundField[LL.0](a0);t3:L=f(t2,t1);}t3"
    );
}

#[test]
fn bind_position_zero_wraps_the_handle() {
    let ctx = FormContext::new();
    let bound = ctx.editor(&call_f()).bind_argument_form(0, L).unwrap();

    assert_eq!(bound.arity(), 3);
    assert_eq!(
        bound.signature_line(),
        "(a0:L/L,a1:L,a2:L)=>{t3:L=BoundField[L.0](a0);t4:L=f(a1,a2);}t4"
    );
}

#[test]
fn bind_rejects_mismatched_type() {
    let ctx = FormContext::new();
    let base = call_f();
    let err = ctx.editor(&base).bind_argument_form(2, I).unwrap_err();
    assert_eq!(
        err,
        FormError::TypeMismatch {
            position: 2,
            expected: L,
            found: I
        }
    );
    assert_eq!(base.transform_count(), 0);
}

#[test]
fn repeated_edit_hits_the_cache() {
    let ctx = FormContext::new();
    let base = call_f();
    let first = ctx.editor(&base).bind_argument_form(1, L).unwrap();
    let second = ctx.editor(&base).bind_argument_form(1, L).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(base.transform_count(), 1);
    let stats = ctx.stats().snapshot();
    assert_eq!(stats.lookups, 2);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.published, 1);
}

#[test]
fn distinct_edits_get_distinct_entries() {
    let ctx = FormContext::new();
    let base = call_f();
    let editor = ctx.editor(&base);
    let a = editor.bind_argument_form(1, L).unwrap();
    let b = editor.bind_argument_form(2, L).unwrap();
    let c = editor.add_argument_form(1, I).unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(base.transform_count(), 3);
    assert!(Arc::ptr_eq(&c, &editor.add_argument_form(1, I).unwrap()));
}

#[test]
fn add_argument_inserts_ignored_parameter() {
    let ctx = FormContext::new();
    let added = ctx.editor(&call_f()).add_argument_form(1, I).unwrap();
    assert_eq!(
        added.signature_line(),
        "(a0:L,a1:I,a2:L,a3:L)=>{t4:L=f(a2,a3);}t4"
    );
}

#[test]
fn add_argument_respects_slot_limit() {
    let ctx = FormContext::new();
    let wide = FormBuilder::new(&[L; 255]).build(Some(0), FormKind::Generic);
    let err = ctx.editor(&wide).add_argument_form(1, L).unwrap_err();
    assert_eq!(
        err,
        FormError::TooManyArguments {
            slots: 256,
            limit: 255
        }
    );

    // 1 + 126 * 2 = 253 slots; one more long fits exactly.
    let base = passthrough(&[J; 126]);
    let full = ctx.editor(&base).add_argument_form(1, J).unwrap();
    let err = ctx.editor(&full).add_argument_form(1, I).unwrap_err();
    assert_eq!(
        err,
        FormError::TooManyArguments {
            slots: 256,
            limit: 255
        }
    );
}

#[test]
fn dup_argument_merges_uses() {
    let ctx = FormContext::new();
    let dup = ctx.editor(&call_f()).dup_argument_form(1, 2).unwrap();
    assert_eq!(dup.signature_line(), "(a0:L,a1:L)=>{t2:L=f(a1,a1);}t2");
}

#[test]
fn dup_argument_requires_same_type() {
    let ctx = FormContext::new();
    let base = passthrough(&[L, I]);
    let err = ctx.editor(&base).dup_argument_form(1, 2).unwrap_err();
    assert!(matches!(err, FormError::TypeMismatch { position: 2, .. }));
}

#[test]
fn spread_loads_elements_after_length_check() {
    let ctx = FormContext::new();
    let spread = ctx
        .editor(&call_f())
        .spread_arguments_form(1, &Ty::array_of(Ty::object()), 2)
        .unwrap();
    assert_eq!(
        spread.signature_line(),
        "(a0:L,a1:L)=>{t2:V=CheckSpreadLength(a1,2);t3:L=ArrayLoad[Object](a1,0);t4:L=ArrayLoad[Object](a1,1);t5:L=f(t3,t4);}t5"
    );
}

#[test]
fn spread_distinguishes_subword_arrays() {
    let ctx = FormContext::new();
    let base = passthrough(&[I]);
    let editor = ctx.editor(&base);
    let ints = editor.spread_arguments_form(1, &Ty::array_of(Ty::Int), 1).unwrap();
    let shorts = editor.spread_arguments_form(1, &Ty::array_of(Ty::Short), 1).unwrap();
    assert!(!Arc::ptr_eq(&ints, &shorts));
    assert_eq!(base.transform_count(), 2);
    assert!(shorts.signature_line().contains("ArrayLoad[short]"));
}

#[test]
fn spread_rejects_non_array() {
    let ctx = FormContext::new();
    let err = ctx
        .editor(&call_f())
        .spread_arguments_form(1, &Ty::Int, 1)
        .unwrap_err();
    assert_eq!(err, FormError::NotAnArray { ty: Ty::Int });
}

#[test]
fn spread_of_zero_elements_only_checks_length() {
    let ctx = FormContext::new();
    let spread = ctx
        .editor(&call_f())
        .spread_arguments_form(3, &Ty::array_of(Ty::object()), 0)
        .unwrap();
    assert_eq!(
        spread.signature_line(),
        "(a0:L,a1:L,a2:L,a3:L)=>{t4:V=CheckSpreadLength(a3,0);t5:L=f(a1,a2);}t5"
    );
}

#[test]
fn filter_argument_calls_filter_from_carrier() {
    let ctx = FormContext::new();
    let filtered = ctx.editor(&call_f()).filter_argument_form(1, I).unwrap();
    assert_eq!(
        filtered.signature_line(),
        "(a0:L/L,a1:I,a2:L)=>{t3:L=BoundField[L.0](a0);t4:L=InvokeBasic[(I)L](t3,a1);t5:L=f(t4,a2);}t5"
    );
}

#[test]
fn filter_after_bind_extends_species() {
    let ctx = FormContext::new();
    let bound = ctx.editor(&call_f()).bind_argument_form(2, L).unwrap();
    let filtered = ctx.editor(&bound).filter_argument_form(1, I).unwrap();
    assert_eq!(filtered.parameter_constraint(0).unwrap().key(), "LL");
    assert_eq!(
        filtered.signature_line(),
        "(a0:L/LL,a1:I)=>{t2:L=BoundField[LL.1](a0);t3:L=InvokeBasic[(I)L](t2,a1);t4:L=BoundField[LL.0](a0);t5:L=f(t3,t4);}t5"
    );
}

#[test]
fn collect_arguments_replaces_parameter() {
    let ctx = FormContext::new();
    let collected = ctx
        .editor(&call_f())
        .collect_arguments_form(1, &mt("(II)L"))
        .unwrap();
    assert_eq!(
        collected.signature_line(),
        "(a0:L/L,a1:I,a2:I,a3:L)=>{t4:L=BoundField[L.0](a0);t5:L=InvokeBasic[(II)L](t4,a1,a2);t6:L=f(t5,a3);}t6"
    );
}

#[test]
fn collect_of_one_argument_is_a_filter() {
    let ctx = FormContext::new();
    let base = call_f();
    let editor = ctx.editor(&base);
    let collected = editor.collect_arguments_form(1, &mt("(I)L")).unwrap();
    let filtered = editor.filter_argument_form(1, I).unwrap();
    assert!(Arc::ptr_eq(&collected, &filtered));
}

#[test]
fn collect_to_void_without_arguments_runs_first() {
    let ctx = FormContext::new();
    let base = call_f();
    let collected = ctx
        .editor(&base)
        .collect_arguments_form(2, &mt("()V"))
        .unwrap();
    assert_eq!(
        collected.signature_line(),
        "(a0:L/L,a1:L,a2:L)=>{t3:L=BoundField[L.0](a0);t4:V=InvokeBasic[()V](t3);t5:L=f(a1,a2);}t5"
    );
    let same = ctx
        .editor(&base)
        .collect_arguments_form(1, &mt("()V"))
        .unwrap();
    assert!(Arc::ptr_eq(&collected, &same));
}

#[test]
fn collect_checks_result_type() {
    let ctx = FormContext::new();
    let err = ctx
        .editor(&call_f())
        .collect_arguments_form(1, &mt("(II)I"))
        .unwrap_err();
    assert!(matches!(err, FormError::TypeMismatch { position: 1, .. }));
}

#[test]
fn filter_return_calls_filter_on_result() {
    let ctx = FormContext::new();
    let filtered = ctx.editor(&call_f()).filter_return_form(I, false).unwrap();
    assert_eq!(filtered.return_type(), I);
    assert_eq!(
        filtered.signature_line(),
        "(a0:L/L,a1:L,a2:L)=>{t3:L=f(a1,a2);t4:L=BoundField[L.0](a0);t5:I=InvokeBasic[(L)I](t4,t3);}t5"
    );
}

#[test]
fn filter_return_to_zero() {
    let ctx = FormContext::new();
    let base = call_f();
    let zero = ctx.editor(&base).filter_return_form(I, true).unwrap();
    assert_eq!(
        zero.signature_line(),
        "(a0:L,a1:L,a2:L)=>{t3:L=f(a1,a2);t4:I=Zero[I]();}t4"
    );
    let void = ctx.editor(&base).filter_return_form(V, true).unwrap();
    assert_eq!(void.signature_line(), "(a0:L,a1:L,a2:L)=>{t3:L=f(a1,a2);}void");
    assert_eq!(void.return_type(), V);
}

#[test]
fn fold_arguments_keeps_combined_parameters() {
    let ctx = FormContext::new();
    let folded = ctx
        .editor(&call_f())
        .fold_arguments_form(1, false, &mt("(L)L"))
        .unwrap();
    assert_eq!(
        folded.signature_line(),
        "(a0:L/L,a1:L)=>{t2:L=BoundField[L.0](a0);t3:L=InvokeBasic[(L)L](t2,a1);t4:L=f(t3,a1);}t4"
    );
}

#[test]
fn fold_to_void_keeps_arity() {
    let ctx = FormContext::new();
    let folded = ctx
        .editor(&call_f())
        .fold_arguments_form(1, true, &mt("(LL)V"))
        .unwrap();
    assert_eq!(folded.arity(), 3);
    assert_eq!(
        folded.signature_line(),
        "(a0:L/L,a1:L,a2:L)=>{t3:L=BoundField[L.0](a0);t4:V=InvokeBasic[(LL)V](t3,a1,a2);t5:L=f(a1,a2);}t5"
    );
}

#[test]
fn fold_rejects_incompatible_combiner() {
    let ctx = FormContext::new();
    let base = call_f();
    let editor = ctx.editor(&base);
    let err = editor.fold_arguments_form(1, false, &mt("(I)L")).unwrap_err();
    assert!(matches!(err, FormError::TypeMismatch { position: 2, .. }));
    let err = editor.fold_arguments_form(1, true, &mt("(L)L")).unwrap_err();
    assert!(matches!(err, FormError::IncompatibleCombiner { .. }));
}

#[test]
fn permute_renames_parameters() {
    let ctx = FormContext::new();
    let permuted = ctx
        .editor(&call_f())
        .permute_arguments_form(1, &[1, 0])
        .unwrap();
    assert_eq!(permuted.signature_line(), "(a0:L,a1:L,a2:L)=>{t3:L=f(a2,a1);}t3");
}

#[test]
fn permute_moves_types_with_arguments() {
    let ctx = FormContext::new();
    let base = passthrough(&[I, L, J]);
    let permuted = ctx.editor(&base).permute_arguments_form(1, &[2, 0, 1]).unwrap();
    assert_eq!(permuted.parameter_types(), &[L, L, J, I]);
    assert_eq!(permuted.result(), Some(3));
    assert_eq!(permuted.return_type(), I);
}

#[test]
fn identity_permutation_returns_base() {
    let ctx = FormContext::new();
    let base = call_f();
    let same = ctx.editor(&base).permute_arguments_form(1, &[0, 1]).unwrap();
    assert!(Arc::ptr_eq(&base, &same));
    assert_eq!(base.transform_count(), 0);
    assert_eq!(ctx.stats().snapshot().lookups, 0);
}

#[test]
fn concurrent_derivations_agree() {
    let ctx = FormContext::new();
    let base = call_f();
    let forms: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                s.spawn(|| {
                    ctx.editor(&base)
                        .spread_arguments_form(1, &Ty::array_of(Ty::object()), 2)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect()
    });
    for form in &forms[1..] {
        assert!(Arc::ptr_eq(&forms[0], form));
    }
    assert_eq!(base.transform_count(), 1);
    let stats = ctx.stats().snapshot();
    assert_eq!(stats.published, 1);
}

#[test]
fn unreferenced_derived_form_is_rebuilt() {
    let ctx = FormContext::with_config(crate::CacheConfig::new().form_retention(0));
    let base = call_f();
    let first = ctx.editor(&base).add_argument_form(1, I).unwrap();
    let signature = first.signature_line();
    drop(first);
    assert_eq!(base.transform_count(), 0);

    let again = ctx.editor(&base).add_argument_form(1, I).unwrap();
    assert_eq!(again.signature_line(), signature);
    assert_eq!(base.transform_count(), 1);
}

#[test]
fn chained_edits_replay_from_the_cache() {
    let ctx = FormContext::new();
    let base = call_f();
    let chain = || {
        let swapped = ctx.editor(&base).permute_arguments_form(1, &[1, 0]).unwrap();
        let bound = ctx.editor(&swapped).bind_argument_form(1, L).unwrap();
        let widened = ctx.editor(&bound).add_argument_form(2, L).unwrap();
        (swapped, bound, widened)
    };

    let (swapped, bound, widened) = chain();
    assert_eq!(widened.arity(), 3);
    assert_eq!(widened.parameter_types(), &[L, L, L]);
    assert_eq!(widened.return_type(), L);
    assert_eq!(widened.parameter_constraint(0).unwrap().key(), "L");
    for form in [&base, &swapped, &bound] {
        assert_eq!(form.transform_count(), 1);
    }
    let first_run = ctx.stats().snapshot();
    assert_eq!((first_run.lookups, first_run.hits, first_run.published), (3, 0, 3));

    let (again_swapped, again_bound, again_widened) = chain();
    assert!(Arc::ptr_eq(&swapped, &again_swapped));
    assert!(Arc::ptr_eq(&bound, &again_bound));
    assert!(Arc::ptr_eq(&widened, &again_widened));
    let second_run = ctx.stats().snapshot();
    assert_eq!((second_run.lookups, second_run.hits, second_run.published), (6, 3, 3));
}
