use std::fmt::Write as _;

use linkform_compiler::DispatchKind;
use linkform_vm::{DirectMethodHandle, Runtime, SimpleHost};

use super::{CliError, finish, parse_signature};

pub struct DirectArgs {
    pub signature: String,
    pub kind: String,
    pub init: bool,
}

pub fn run(args: DirectArgs) {
    finish(render(&args));
}

pub fn render(args: &DirectArgs) -> Result<String, CliError> {
    let ty = parse_signature(&args.signature)?;
    let kind = parse_kind(&args.kind)?;
    match kind {
        DispatchKind::NewSpecial if !ty.return_type().is_reference() => {
            return Err(CliError::Unsupported(format!(
                "a constructor handle returns its instance, not {}",
                ty.return_type()
            )));
        }
        DispatchKind::Virtual | DispatchKind::Special | DispatchKind::Interface
            if ty.parameter_types().first().is_none_or(|t| !t.is_reference()) =>
        {
            return Err(CliError::Unsupported(format!(
                "{} handles take the receiver as their first parameter",
                args.kind
            )));
        }
        _ => {}
    }

    let rt = Runtime::new(SimpleHost::builder().build());
    let form = DirectMethodHandle::prepared_form(&rt, &ty, kind, args.init)?;
    let mut out = String::new();
    let _ = writeln!(out, "{} for {ty}", form.kind());
    let _ = writeln!(out, "{form}");
    Ok(out)
}

fn parse_kind(kind: &str) -> Result<DispatchKind, CliError> {
    Ok(match kind {
        "virtual" => DispatchKind::Virtual,
        "static" => DispatchKind::Static,
        "special" => DispatchKind::Special,
        "interface" => DispatchKind::Interface,
        "constructor" => DispatchKind::NewSpecial,
        other => return Err(CliError::Unsupported(format!("unknown dispatch kind `{other}`"))),
    })
}
