// src/cli/handlers/kill.rs

use crate::backend::tmux::TmuxCli;
use crate::core::reconciler::Multiplexer;
use anyhow::Result;
use colored::Colorize;

/// Kills the tmux sessions whose names are listed. Unknown names are ignored.
pub fn handle(names: &[String]) -> Result<()> {
    kill_matching(&TmuxCli, |session| names.iter().any(|n| n == session))
}

/// Kills every tmux session.
pub fn handle_all() -> Result<()> {
    kill_matching(&TmuxCli, |_| true)
}

/// Kills each session accepted by `filter`; individual failures are warnings.
pub fn kill_matching(mux: &dyn Multiplexer, filter: impl Fn(&str) -> bool) -> Result<()> {
    for session in mux.list_sessions()? {
        if !filter(&session.name) {
            continue;
        }
        match mux.kill_session(&session.name) {
            Ok(()) => println!("{} {}", "Killed".green(), session.name.bold()),
            Err(e) => log::warn!("Failed to kill session '{}': {}", session.name, e),
        }
    }
    Ok(())
}
