// src/cli/handlers/commons.rs

// Shared state and helpers used by multiple handlers.

use crate::backend::AppendMode;
use crate::cli::args::GlobalArgs;
use crate::core::cache::{FileStore, MemoryStore, OptionStore};
use crate::core::config_loader;
use crate::models::{Config, Target};
use crate::recon::{self, Discovery, ReconError, ReconModule};
use anyhow::{Context, Result};
use std::fmt;
use std::time::Duration;

/// Everything a handler needs, built once at startup.
pub struct AppContext {
    pub config: Config,
    pub store: Box<dyn OptionStore>,
    pub settings: GlobalArgs,
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Loads the configuration and opens the option cache.
    ///
    /// Without a usable state directory the cache lives in memory for this run only.
    pub fn load(settings: GlobalArgs) -> Result<Self> {
        let config = config_loader::load().context("Failed to load configuration")?;
        let store: Box<dyn OptionStore> = match FileStore::from_state_dir() {
            Ok(store) => Box::new(store),
            Err(e) => {
                log::warn!("Option cache disabled: {}", e);
                Box::new(MemoryStore::new())
            }
        };
        Ok(Self::new(config, store, settings))
    }

    pub fn new(config: Config, store: Box<dyn OptionStore>, settings: GlobalArgs) -> Self {
        Self {
            config,
            store,
            settings,
        }
    }

    pub fn cache_age(&self) -> Duration {
        Duration::from_secs(self.settings.cache_age)
    }

    pub fn append_mode(&self) -> AppendMode {
        if self.settings.append {
            AppendMode::Append
        } else {
            AppendMode::CreateOrAttach
        }
    }

    /// Configured modules, restricted to `only` when it is not empty.
    pub fn modules(&self, only: &[String]) -> Vec<ReconModule> {
        recon::modules_from_config(&self.config.modules, only)
    }

    /// Collects and tag-filters options across `modules`.
    pub fn gather(&self, modules: &[ReconModule]) -> Result<Vec<Target>, ReconError> {
        let options = recon::gather(
            modules,
            self.store.as_ref(),
            self.cache_age(),
            &self.settings.show_tags,
            &self.settings.hide_tags,
        )?;
        if options.is_empty() {
            return Err(ReconError::NoOptions);
        }
        Ok(options)
    }
}

/// Runs the owning module's selection hook on a copy of `target`.
pub fn select(modules: &[ReconModule], target: &Target) -> Result<Target, ReconError> {
    let module = recon::find_module(modules, &target.provider_name)?;
    let mut selected = target.clone();
    module.select_option(&mut selected)?;
    log::debug!(
        "Selected '{}' (name '{}', directory '{}')",
        selected.display_name,
        selected.name,
        selected.start_directory
    );
    Ok(selected)
}
