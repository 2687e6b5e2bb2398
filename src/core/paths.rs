// src/core/paths.rs

use crate::constants::{APP_DIR_NAME, CACHE_FILE_PREFIX};
use lazy_static::lazy_static;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

lazy_static! {
    static ref CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

/// Environment variable that overrides the configuration directory.
pub const CONFIG_DIR_ENV: &str = "MUXPICK_CONFIG_DIR";

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not find a state or local data directory.")]
    StateDirNotFound,
    #[error("Could not create directory at '{path}': {source}")]
    DirCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to expand path '{template}': {reason}")]
    Expansion { template: String, reason: String },
}

/// Returns the configuration directory (`~/.config/muxpick`, or `$MUXPICK_CONFIG_DIR`).
///
/// The directory is not created; a missing directory simply means "no configuration".
/// Memoized after the first call.
pub fn get_config_dir() -> Result<PathBuf, PathError> {
    let mut cached = CONFIG_DIR.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    let path = match std::env::var_os(CONFIG_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::config_dir()
            .ok_or(PathError::ConfigDirNotFound)?
            .join(APP_DIR_NAME),
    };

    *cached = Some(path.clone());
    Ok(path)
}

/// Returns the state directory holding the option caches, creating it if needed.
///
/// `$XDG_STATE_HOME/muxpick` where the platform has one, the local data directory otherwise.
pub fn get_state_dir() -> Result<PathBuf, PathError> {
    let base = dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .ok_or(PathError::StateDirNotFound)?;
    let path = base.join(APP_DIR_NAME);
    ensure_dir(&path)?;
    Ok(path)
}

pub fn ensure_dir(path: &Path) -> Result<(), PathError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| PathError::DirCreation {
            path: path.display().to_string(),
            source: e,
        })?;
    }
    Ok(())
}

/// Path of the cache document for a discovery module.
pub fn cache_file_path(dir: &Path, module_name: &str) -> PathBuf {
    dir.join(format!("{}{}.json", CACHE_FILE_PREFIX, module_name))
}

/// Expands `~` and `$VAR` in a user-supplied path.
pub fn expand_path(template: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(template).map_err(|e| PathError::Expansion {
        template: template.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}
