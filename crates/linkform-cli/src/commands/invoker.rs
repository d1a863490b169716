use std::fmt::Write as _;

use linkform_vm::{Runtime, SimpleHost};

use super::{CliError, finish, parse_signature};

pub struct InvokerArgs {
    pub signature: String,
    pub generic: bool,
    pub linker: bool,
}

pub fn run(args: InvokerArgs) {
    finish(render(&args));
}

pub fn render(args: &InvokerArgs) -> Result<String, CliError> {
    let ty = parse_signature(&args.signature)?;
    let rt = Runtime::new(SimpleHost::builder().build());
    let invokers = rt.invokers(&ty);

    let mut out = String::new();
    let form = if args.linker {
        invokers.linker_form(&rt, args.generic)?
    } else {
        let handle = if args.generic {
            invokers.generic_invoker(&rt)?
        } else {
            invokers.exact_invoker(&rt)?
        };
        let _ = writeln!(out, "handle {}", handle.ty());
        handle.form()
    };
    let _ = writeln!(out, "{} for {ty}", form.kind());
    let _ = writeln!(out, "{form}");
    Ok(out)
}
