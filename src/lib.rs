pub mod backend;
pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod recon;
pub mod system;
