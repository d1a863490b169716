use std::fmt::Write as _;
use std::sync::Arc;

use linkform_compiler::{FormBuilder, FormContext, FormKind, LambdaForm, NamedFunction};
use linkform_core::{BasicType, MAX_MH_ARITY, MethodType, TypeError};

use super::edit::Edit;
use super::{CliError, finish, parse_signature};

pub struct DumpArgs {
    pub signature: String,
    pub edits: Vec<String>,
    pub last: bool,
    pub stats: bool,
}

pub fn run(args: DumpArgs) {
    finish(render(&args));
}

pub fn render(args: &DumpArgs) -> Result<String, CliError> {
    let ty = parse_signature(&args.signature)?;
    let edits = args
        .edits
        .iter()
        .map(|e| e.parse::<Edit>())
        .collect::<Result<Vec<_>, _>>()?;

    let ctx = FormContext::new();
    let mut form = base_form(&ty)?;
    let mut steps = vec![(format!("base {ty}"), Arc::clone(&form))];
    for edit in &edits {
        form = edit.apply(&ctx, &form)?;
        steps.push((edit.to_string(), Arc::clone(&form)));
    }

    let shown = if args.last {
        &steps[steps.len() - 1..]
    } else {
        &steps[..]
    };
    let mut out = String::new();
    for (i, (title, form)) in shown.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{title} [{}]", form.kind());
        let _ = writeln!(out, "{form}");
    }
    if args.stats {
        let s = ctx.stats().snapshot();
        let _ = writeln!(
            out,
            "\nlookups={} hits={} published={} lost_races={}",
            s.lookups, s.hits, s.published, s.lost_races
        );
    }
    Ok(out)
}

/// `(a0:L, args...) => target(args...)`: a handle form calling an external
/// `target` with every argument.
pub fn base_form(ty: &MethodType) -> Result<Arc<LambdaForm>, CliError> {
    let slots = ty.parameter_slot_count();
    if slots > MAX_MH_ARITY {
        return Err(TypeError::TooManyArguments {
            slots,
            limit: MAX_MH_ARITY,
        }
        .into());
    }
    let basic = ty.basic_type();
    let mut params = vec![BasicType::L];
    params.extend(basic.basic_parameter_types());
    let mut fb = FormBuilder::new(&params);
    let args = fb.args(1, params.len());
    let call = fb.push(NamedFunction::external("target", &basic), args);
    let result = (basic.basic_return_type() != BasicType::V).then_some(call);
    Ok(fb.build(result, FormKind::External))
}
