// src/recon/mod.rs

//! # Discovery Modules
//!
//! Each configured module produces [`Target`]s. The aggregator in this file
//! runs them in configuration order, merges the results and applies the
//! show/hide tag filters before anything reaches the finder.
//!
//! ## Modules
//!
//! - **`project`**: scans source directories for project roots.
//! - **`ssh`**: lists the concrete hosts of an ssh client configuration.
//! - **`static_entries`**: entries written directly in the configuration file.

pub mod project;
pub mod ssh;
pub mod static_entries;

use crate::constants::HIDDEN_TAG;
use crate::core::cache::{self, OptionStore};
use crate::core::paths::PathError;
use crate::models::{Column, ModuleConfig, Target};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

pub use project::ProjectModule;
pub use ssh::SshModule;
pub use static_entries::StaticModule;

#[derive(Error, Debug)]
pub enum ReconError {
    #[error("Failed to scan '{root}': {source}")]
    Scan {
        root: String,
        #[source]
        source: walkdir::Error,
    },
    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidExclude {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Failed to read ssh config '{path}': {source}")]
    SshConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Include in '{path}' is missing a file path")]
    SshIncludeMissingPath { path: String },
    #[error("Failed to create start directory '{path}': {source}")]
    StartDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Module '{module}' failed: {source}")]
    Module {
        module: String,
        #[source]
        source: Box<ReconError>,
    },
    #[error("Every discovery module failed:\n{0}")]
    AllModulesFailed(String),
    #[error("No options found. Check the `modules` section of your configuration.")]
    NoOptions,
    #[error("No option with id '{0}'")]
    OptionNotFound(String),
    #[error("No discovery module named '{0}'")]
    ModuleNotFound(String),
}

/// The interface every discovery module implements.
pub trait Discovery {
    /// Configured name; drives cache file names and `PROVIDER_NAME`.
    fn name(&self) -> &str;

    fn module_type(&self) -> &'static str;

    /// Runs live discovery.
    fn options(&self) -> Result<Vec<Target>, ReconError>;

    /// Returns cached options when fresh, live ones otherwise.
    fn options_or_cache(
        &self,
        store: &dyn OptionStore,
        max_age: Duration,
    ) -> Result<Vec<Target>, ReconError> {
        cache::options_or_cache(store, self.name(), max_age, || self.options())
    }

    /// Hook run after the user picked `target`, before its layout is resolved.
    fn select_option(&self, _target: &mut Target) -> Result<(), ReconError> {
        Ok(())
    }

    /// Columns for the tabular export.
    fn columns(&self) -> Vec<Column> {
        Column::defaults()
    }
}

/// A configured module. The set is closed; adding a kind means adding a variant here.
#[derive(Debug, Clone)]
pub enum ReconModule {
    Project(ProjectModule),
    Ssh(SshModule),
    Static(StaticModule),
}

impl ReconModule {
    pub fn from_config(config: &ModuleConfig) -> Self {
        match config {
            ModuleConfig::Project(cfg) => Self::Project(ProjectModule::new(cfg.clone())),
            ModuleConfig::Ssh(cfg) => Self::Ssh(SshModule::new(cfg.clone())),
            ModuleConfig::Static(cfg) => Self::Static(StaticModule::new(cfg.clone())),
        }
    }

    fn inner(&self) -> &dyn Discovery {
        match self {
            Self::Project(m) => m,
            Self::Ssh(m) => m,
            Self::Static(m) => m,
        }
    }
}

impl Discovery for ReconModule {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn module_type(&self) -> &'static str {
        self.inner().module_type()
    }

    fn options(&self) -> Result<Vec<Target>, ReconError> {
        self.inner().options()
    }

    fn options_or_cache(
        &self,
        store: &dyn OptionStore,
        max_age: Duration,
    ) -> Result<Vec<Target>, ReconError> {
        self.inner().options_or_cache(store, max_age)
    }

    fn select_option(&self, target: &mut Target) -> Result<(), ReconError> {
        self.inner().select_option(target)
    }

    fn columns(&self) -> Vec<Column> {
        self.inner().columns()
    }
}

/// Builds the modules from configuration, optionally restricted to the given names.
///
/// Requested names that match no configured module are reported as warnings.
pub fn modules_from_config(configs: &[ModuleConfig], only: &[String]) -> Vec<ReconModule> {
    let modules: Vec<ReconModule> = configs
        .iter()
        .map(ReconModule::from_config)
        .filter(|m| only.is_empty() || only.iter().any(|n| n == m.name()))
        .collect();

    for name in unknown_module_names(&modules, only) {
        log::warn!("No configured module is named '{}'", name);
    }
    modules
}

/// Requested names with no matching module, in request order.
fn unknown_module_names<'a>(modules: &[ReconModule], only: &'a [String]) -> Vec<&'a str> {
    only.iter()
        .filter(|n| !modules.iter().any(|m| m.name() == n.as_str()))
        .map(String::as_str)
        .collect()
}

pub fn find_module<'a>(modules: &'a [ReconModule], name: &str) -> Result<&'a ReconModule, ReconError> {
    modules
        .iter()
        .find(|m| m.name() == name)
        .ok_or_else(|| ReconError::ModuleNotFound(name.to_string()))
}

/// Runs every module in order. Failures are returned next to whatever did succeed.
///
/// Duplicate ids keep their first occurrence.
pub fn collect_options(
    modules: &[ReconModule],
    store: &dyn OptionStore,
    max_age: Duration,
) -> (Vec<Target>, Vec<ReconError>) {
    let mut options = Vec::new();
    let mut errors = Vec::new();
    let mut seen_ids = HashSet::new();

    for module in modules {
        match module.options_or_cache(store, max_age) {
            Ok(found) => {
                log::debug!("Module '{}' returned {} options", module.name(), found.len());
                for option in found {
                    if seen_ids.insert(option.id.clone()) {
                        options.push(option);
                    } else {
                        log::debug!("Dropping duplicate option id '{}'", option.id);
                    }
                }
            }
            Err(e) => errors.push(ReconError::Module {
                module: module.name().to_string(),
                source: Box::new(e),
            }),
        }
    }

    (options, errors)
}

/// Applies show/hide tags.
///
/// With `show_tags`, an option needs at least one of them. Any hide tag excludes it.
/// The `hidden` tag always hides unless it is explicitly listed in `show_tags`.
pub fn filter_options(options: Vec<Target>, show_tags: &[String], hide_tags: &[String]) -> Vec<Target> {
    let mut hide: Vec<&str> = hide_tags.iter().map(String::as_str).collect();
    if !show_tags.iter().any(|t| t == HIDDEN_TAG) {
        hide.push(HIDDEN_TAG);
    }

    options
        .into_iter()
        .filter(|o| {
            let shown = show_tags.is_empty() || show_tags.iter().any(|t| o.tags.contains(t));
            let hidden = hide.iter().any(|t| o.tags.iter().any(|tag| tag == t));
            shown && !hidden
        })
        .collect()
}

/// Collects and filters options across `modules`.
///
/// Errors only when every module failed and nothing was found.
pub fn gather(
    modules: &[ReconModule],
    store: &dyn OptionStore,
    max_age: Duration,
    show_tags: &[String],
    hide_tags: &[String],
) -> Result<Vec<Target>, ReconError> {
    let (options, errors) = collect_options(modules, store, max_age);

    if options.is_empty() && !errors.is_empty() {
        let messages: Vec<String> = errors.iter().map(|e| format!("  - {}", e)).collect();
        return Err(ReconError::AllModulesFailed(messages.join("\n")));
    }
    for error in &errors {
        log::warn!("{}", error);
    }

    Ok(filter_options(options, show_tags, hide_tags))
}

pub fn find_option<'a>(options: &'a [Target], id: &str) -> Result<&'a Target, ReconError> {
    options
        .iter()
        .find(|o| o.id == id)
        .ok_or_else(|| ReconError::OptionNotFound(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::MemoryStore;
    use crate::models::{SshModuleConfig, StaticEntry, StaticModuleConfig};

    fn tagged(id: &str, tags: &[&str]) -> Target {
        Target {
            id: id.into(),
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            ..Default::default()
        }
    }

    fn strings(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    fn ids(options: &[Target]) -> Vec<&str> {
        options.iter().map(|o| o.id.as_str()).collect()
    }

    #[test]
    fn test_hidden_tag_is_always_hidden() {
        let options = vec![tagged("a", &[]), tagged("b", &["hidden"])];
        assert_eq!(ids(&filter_options(options, &[], &[])), vec!["a"]);
    }

    #[test]
    fn test_hidden_can_be_shown_explicitly() {
        let options = vec![tagged("a", &[]), tagged("b", &["hidden"])];
        let shown = filter_options(options, &strings(&["hidden"]), &[]);
        assert_eq!(ids(&shown), vec!["b"]);
    }

    #[test]
    fn test_show_and_hide_tags() {
        let options = vec![
            tagged("work", &["work"]),
            tagged("work-old", &["work", "archived"]),
            tagged("home", &["home"]),
        ];
        let filtered = filter_options(options, &strings(&["work"]), &strings(&["archived"]));
        assert_eq!(ids(&filtered), vec!["work"]);
    }

    fn static_module(name: &str, ids: &[&str]) -> ModuleConfig {
        ModuleConfig::Static(StaticModuleConfig {
            name: Some(name.into()),
            options: ids
                .iter()
                .map(|id| StaticEntry {
                    id: (*id).into(),
                    ..Default::default()
                })
                .collect(),
        })
    }

    #[test]
    fn test_gather_tolerates_partial_failure() {
        // --- Setup ---
        let configs = vec![
            ModuleConfig::Ssh(SshModuleConfig {
                file: Some("/nonexistent/muxpick/ssh_config".into()),
                ..Default::default()
            }),
            static_module("notes", &["todo"]),
        ];
        let modules = modules_from_config(&configs, &[]);

        // --- Execute ---
        let options = gather(&modules, &MemoryStore::new(), Duration::from_secs(300), &[], &[]).unwrap();

        // --- Assert ---
        assert_eq!(ids(&options), vec!["todo"]);
    }

    #[test]
    fn test_gather_fails_when_everything_failed() {
        let configs = vec![ModuleConfig::Ssh(SshModuleConfig {
            file: Some("/nonexistent/muxpick/ssh_config".into()),
            ..Default::default()
        })];
        let modules = modules_from_config(&configs, &[]);
        let err = gather(&modules, &MemoryStore::new(), Duration::from_secs(300), &[], &[]).unwrap_err();
        assert!(matches!(err, ReconError::AllModulesFailed(_)));
    }

    #[test]
    fn test_modules_can_be_restricted_by_name() {
        let configs = vec![static_module("a", &["1"]), static_module("b", &["2"])];
        let modules = modules_from_config(&configs, &strings(&["b"]));
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].name(), "b");
    }

    #[test]
    fn test_unknown_requested_modules_are_reported() {
        let configs = vec![static_module("a", &["1"]), static_module("b", &["2"])];
        let modules = modules_from_config(&configs, &strings(&["b", "typo", "c"]));

        assert_eq!(modules.len(), 1);
        assert_eq!(unknown_module_names(&modules, &strings(&["b", "typo", "c"])), vec!["typo", "c"]);
        assert!(unknown_module_names(&modules, &[]).is_empty());
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let configs = vec![static_module("a", &["same"]), static_module("b", &["same"])];
        let modules = modules_from_config(&configs, &[]);
        let (options, errors) = collect_options(&modules, &MemoryStore::new(), Duration::from_secs(300));
        assert!(errors.is_empty());
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].provider_name, "a");
    }
}
