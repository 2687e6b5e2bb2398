// src/core/mod.rs

pub mod cache;
pub mod config_loader;
pub mod export;
pub mod finder;
pub mod layout_resolver;
pub mod paths;
pub mod placeholder;
pub mod reconciler;
pub mod rules;
