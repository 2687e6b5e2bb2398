// src/bin/muxpick.rs

use clap::Parser;
use colored::*;
use muxpick::backend::BackendError;
use muxpick::cli::{Cli, dispatcher};

/// The main entry point of the `muxpick` application.
/// It sets up logging, parses arguments, dispatches to the correct handler,
/// and performs centralized error handling.
fn main() {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(filter) = cli.global.log_level.as_deref() {
        logger.parse_filters(filter);
    }
    logger.init();

    if let Err(e) = dispatcher::dispatch(cli) {
        // --- Centralized Error Handling ---
        // Having nothing to launch with is reported, not treated as a failure.
        if let Some(BackendError::NoBackendAvailable(_)) = e.downcast_ref::<BackendError>() {
            eprintln!("{}", e.to_string().yellow());
            std::process::exit(0);
        }

        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}
