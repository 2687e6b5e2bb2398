// src/cli/handlers/mod.rs

// One module per CLI command.

pub mod commons;
pub mod export;
pub mod kill;
pub mod launch;
pub mod preview;
