//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` so commands can compose the same
//! definitions.

use clap::{Arg, ArgAction};

/// Method signature (positional).
pub fn signature_arg() -> Arg {
    Arg::new("signature")
        .value_name("SIGNATURE")
        .required(true)
        .help("Method signature, e.g. '(Object,int)void' or '(LI)V'")
}

/// Form edit, repeatable (-e/--edit).
pub fn edit_arg() -> Arg {
    Arg::new("edit")
        .short('e')
        .long("edit")
        .value_name("EDIT")
        .action(ArgAction::Append)
        .help("Edit to apply, in order (e.g. bind:1:L, permute:1,0)")
}

/// Print only the final form (--last).
pub fn last_arg() -> Arg {
    Arg::new("last")
        .long("last")
        .action(ArgAction::SetTrue)
        .help("Print only the final form")
}

/// Print transform cache counters (--stats).
pub fn stats_arg() -> Arg {
    Arg::new("stats")
        .long("stats")
        .action(ArgAction::SetTrue)
        .help("Print transform cache counters after the forms")
}

/// Adapt the target instead of checking it (--generic).
pub fn generic_arg() -> Arg {
    Arg::new("generic")
        .long("generic")
        .action(ArgAction::SetTrue)
        .help("Adapt the target to the type instead of requiring it exactly")
}

/// Call-site linker instead of an invoker handle (--linker).
pub fn linker_arg() -> Arg {
    Arg::new("linker")
        .long("linker")
        .action(ArgAction::SetTrue)
        .help("Show the call-site linker form (type passed as trailing argument)")
}

/// Dispatch kind of a direct member (-k/--kind).
pub fn kind_arg() -> Arg {
    Arg::new("kind")
        .short('k')
        .long("kind")
        .value_name("KIND")
        .required(true)
        .value_parser(["virtual", "static", "special", "interface", "constructor"])
        .help("Dispatch kind of the member")
}

/// Include the class-initialization barrier (--init).
pub fn init_arg() -> Arg {
    Arg::new("init")
        .long("init")
        .action(ArgAction::SetTrue)
        .help("Show the variant that initializes the class first")
}
