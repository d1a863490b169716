//! Command builders for the CLI.

use clap::Command;

use super::args::*;

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("linkform")
        .about("Inspect lambda forms, their transformations and the invoker forms built on them")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(dump_command())
        .subcommand(invoker_command())
        .subcommand(direct_command())
        .subcommand(erase_command())
}

/// Apply form edits to a signature's base form and print each step.
pub fn dump_command() -> Command {
    Command::new("dump")
        .about("Derive forms from a base form and print each one")
        .after_help(
            r#"EXAMPLES:
  linkform dump '(Object,Object)Object'
  linkform dump '(LL)L' -e bind:1:L
  linkform dump '(LIL)L' -e permute:2,1,0 -e bind:1:L --stats
  linkform dump '(LL)L' -e fold-void:1:(L)V --last

EDITS:
  bind:POS:T         bind parameter POS (of basic type T) into the carrier
  add:POS:T          insert an ignored parameter of type T
  dup:SRC:DST        feed parameter DST from parameter SRC
  spread:POS:T:N     spread an array of T over N parameters
  filter:POS:T       filter parameter POS, now of type T
  collect:POS:SIG    collect parameters with a collector of type SIG
  fold:POS:SIG       fold parameters into POS with a combiner of type SIG
  fold-void:POS:SIG  run a void combiner before the target
  ret:T              filter the result into type T
  zero:T             replace the result by the zero of type T
  permute:I,J,...    reorder the arguments after the handle"#,
        )
        .arg(signature_arg())
        .arg(edit_arg())
        .arg(last_arg())
        .arg(stats_arg())
}

/// Print the invoker or linker form of a signature.
pub fn invoker_command() -> Command {
    Command::new("invoker")
        .about("Print the invoker form for a signature")
        .after_help(
            r#"EXAMPLES:
  linkform invoker '(Object,int)Object'
  linkform invoker '(String)void' --generic
  linkform invoker '(LL)L' --linker"#,
        )
        .arg(signature_arg())
        .arg(generic_arg())
        .arg(linker_arg())
}

/// Print the prepared form of a direct handle.
pub fn direct_command() -> Command {
    Command::new("direct")
        .about("Print the prepared form of a direct member handle")
        .after_help(
            r#"EXAMPLES:
  linkform direct '(Point)int' --kind virtual
  linkform direct '(int)int' --kind static --init
  linkform direct '(int,int)Point' --kind constructor"#,
        )
        .arg(signature_arg())
        .arg(kind_arg())
        .arg(init_arg())
}

/// Print the erasure of a signature.
pub fn erase_command() -> Command {
    Command::new("erase")
        .about("Print the erased and basic types of a signature")
        .after_help(
            r#"EXAMPLES:
  linkform erase '(String,byte[],long)short'"#,
        )
        .arg(signature_arg())
}
