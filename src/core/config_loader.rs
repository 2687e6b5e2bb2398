// src/core/config_loader.rs

//! # Config Loader
//!
//! Reads `muxpick.yaml` from the configuration directory, merges the optional
//! `muxpick.user.yaml` on top, and fills in the built-in layouts the user did not
//! define. Any failure here is fatal before an external system is touched.

use crate::constants::{CONFIG_FILENAME, USER_CONFIG_FILENAME};
use crate::core::paths::{self, PathError};
use crate::models::Config;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const BUILTIN_LAYOUTS: &str = include_str!("layouts.yaml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Failed to parse built-in layouts: {0}")]
    Builtin(#[source] serde_yaml::Error),
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Loads and resolves the configuration from the standard configuration directory.
pub fn load() -> Result<Config, ConfigError> {
    load_from_dir(&paths::get_config_dir()?)
}

/// Loads `muxpick.yaml` and `muxpick.user.yaml` from `dir`.
///
/// A missing main file yields an empty configuration; the built-in layouts are
/// added either way.
pub fn load_from_dir(dir: &Path) -> Result<Config, ConfigError> {
    let mut config = read_optional(&dir.join(CONFIG_FILENAME))?.unwrap_or_default();

    if let Some(user) = read_optional(&dir.join(USER_CONFIG_FILENAME))? {
        log::debug!("Merging {}", USER_CONFIG_FILENAME);
        config = merge(config, user);
    }

    add_builtin_layouts(&mut config)?;
    log::debug!(
        "Resolved config: {} modules, layouts {:?}",
        config.modules.len(),
        config.layouts.keys().collect::<Vec<_>>()
    );
    Ok(config)
}

fn read_optional(path: &Path) -> Result<Option<Config>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("No config file at '{}'", path.display());
            return Ok(None);
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    parse(&content, path).map(Some)
}

fn parse(content: &str, path: &Path) -> Result<Config, ConfigError> {
    // An empty document is a valid, empty configuration.
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Overlays `user` on `base`: modules are appended, layouts replace by name.
pub fn merge(mut base: Config, user: Config) -> Config {
    base.modules.extend(user.modules);
    base.layouts.extend(user.layouts);
    base
}

fn add_builtin_layouts(config: &mut Config) -> Result<(), ConfigError> {
    let builtin: Config = serde_yaml::from_str(BUILTIN_LAYOUTS).map_err(ConfigError::Builtin)?;
    for (name, layout) in builtin.layouts {
        config.layouts.entry(name).or_insert(layout);
    }
    Ok(())
}
