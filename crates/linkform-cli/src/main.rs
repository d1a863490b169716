mod cli;
mod commands;

use cli::{DirectParams, DumpParams, EraseParams, InvokerParams, build_cli};

fn main() {
    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("dump", m)) => {
            let params = DumpParams::from_matches(m);
            commands::dump::run(params.into());
        }
        Some(("invoker", m)) => {
            let params = InvokerParams::from_matches(m);
            commands::invoker::run(params.into());
        }
        Some(("direct", m)) => {
            let params = DirectParams::from_matches(m);
            commands::direct::run(params.into());
        }
        Some(("erase", m)) => {
            let params = EraseParams::from_matches(m);
            commands::erase::run(params.into());
        }
        _ => unreachable!("clap should have caught this"),
    }
}
