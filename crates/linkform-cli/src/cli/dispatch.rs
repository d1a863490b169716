//! Conversion from clap matches to command arguments.
//!
//! Each command gets a `*Params` struct read from `ArgMatches`, converted
//! into the `*Args` struct its `run` function takes.

use clap::ArgMatches;

use crate::commands::direct::DirectArgs;
use crate::commands::dump::DumpArgs;
use crate::commands::erase::EraseArgs;
use crate::commands::invoker::InvokerArgs;

fn signature(m: &ArgMatches) -> String {
    m.get_one::<String>("signature").cloned().unwrap_or_default()
}

pub struct DumpParams {
    pub signature: String,
    pub edits: Vec<String>,
    pub last: bool,
    pub stats: bool,
}

impl DumpParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            signature: signature(m),
            edits: m
                .get_many::<String>("edit")
                .map(|v| v.cloned().collect())
                .unwrap_or_default(),
            last: m.get_flag("last"),
            stats: m.get_flag("stats"),
        }
    }
}

impl From<DumpParams> for DumpArgs {
    fn from(p: DumpParams) -> Self {
        Self {
            signature: p.signature,
            edits: p.edits,
            last: p.last,
            stats: p.stats,
        }
    }
}

pub struct InvokerParams {
    pub signature: String,
    pub generic: bool,
    pub linker: bool,
}

impl InvokerParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            signature: signature(m),
            generic: m.get_flag("generic"),
            linker: m.get_flag("linker"),
        }
    }
}

impl From<InvokerParams> for InvokerArgs {
    fn from(p: InvokerParams) -> Self {
        Self {
            signature: p.signature,
            generic: p.generic,
            linker: p.linker,
        }
    }
}

pub struct DirectParams {
    pub signature: String,
    pub kind: String,
    pub init: bool,
}

impl DirectParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            signature: signature(m),
            kind: m.get_one::<String>("kind").cloned().unwrap_or_default(),
            init: m.get_flag("init"),
        }
    }
}

impl From<DirectParams> for DirectArgs {
    fn from(p: DirectParams) -> Self {
        Self {
            signature: p.signature,
            kind: p.kind,
            init: p.init,
        }
    }
}

pub struct EraseParams {
    pub signature: String,
}

impl EraseParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            signature: signature(m),
        }
    }
}

impl From<EraseParams> for EraseArgs {
    fn from(p: EraseParams) -> Self {
        Self {
            signature: p.signature,
        }
    }
}
