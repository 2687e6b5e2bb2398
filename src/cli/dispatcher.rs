// src/cli/dispatcher.rs

use crate::cli::handlers::{self, commons::AppContext};
use crate::cli::{Cli, Command};
use anyhow::Result;

/// Routes a parsed command line to its handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    log::debug!("Dispatching: {:?}", cli);

    // Commands that need neither configuration nor discovery.
    match &cli.command {
        Some(Command::Version) => {
            print_version();
            return Ok(());
        }
        Some(Command::Kill { sessions }) => return handlers::kill::handle(sessions),
        Some(Command::KillAll) => return handlers::kill::handle_all(),
        _ => {}
    }

    let ctx = AppContext::load(cli.global)?;
    match cli.command {
        None => handlers::launch::handle(&ctx, &cli.modules),
        Some(Command::Preview { id }) => handlers::preview::handle(&ctx, &id),
        Some(Command::Export(args)) => handlers::export::handle(&ctx, &args),
        Some(Command::Version | Command::Kill { .. } | Command::KillAll) => Ok(()),
    }
}

fn print_version() {
    println!("{:<14}{}", "Version:", env!("CARGO_PKG_VERSION"));
    println!("{:<14}{}/{}", "Platform:", std::env::consts::OS, std::env::consts::ARCH);
}
