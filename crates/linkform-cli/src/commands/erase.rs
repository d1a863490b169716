use std::fmt::Write as _;

use linkform_compiler::FormContext;

use super::{CliError, finish, parse_signature};

pub struct EraseArgs {
    pub signature: String,
}

pub fn run(args: EraseArgs) {
    finish(render(&args));
}

pub fn render(args: &EraseArgs) -> Result<String, CliError> {
    let ty = parse_signature(&args.signature)?;
    let ctx = FormContext::new();
    let tf = ctx.type_form(&ty);
    let c = tf.counts();

    let mut out = String::new();
    let _ = writeln!(out, "type:       {ty}");
    let _ = writeln!(out, "erased:     {}", tf.erased_type());
    let _ = writeln!(out, "basic:      {}", tf.basic_type());
    let _ = writeln!(out, "descriptor: {}", tf.basic_type().basic_type_chars());
    let _ = writeln!(
        out,
        "parameters: {} ({} slots, {} primitive, {} long)",
        c.parameters, c.parameter_slots, c.primitive_parameters, c.long_parameters
    );
    let _ = writeln!(
        out,
        "returns:    {} ({} slots, {} primitive, {} long)",
        c.returns, c.return_slots, c.primitive_returns, c.long_returns
    );
    Ok(out)
}
