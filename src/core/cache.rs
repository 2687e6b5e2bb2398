// src/core/cache.rs

//! # Option Cache
//!
//! Discovery modules that are slow to run (filesystem scans, config parsing)
//! persist their results as one JSON document per module. A cache entry older
//! than the caller's maximum age, or one that cannot be read, is a miss.

use crate::core::paths::{self, PathError};
use crate::models::Target;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to read cache file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write cache file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Cache file '{path}' is corrupted: {source}")]
    Corrupted {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Path(#[from] PathError),
}

/// One module's cached discovery result.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub provider_name: String,
    pub options: Vec<Target>,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(provider_name: &str, options: Vec<Target>) -> Self {
        Self {
            provider_name: provider_name.to_string(),
            options,
            created_at: Utc::now(),
        }
    }

    /// An entry is fresh while it is younger than `max_age`, in whole seconds.
    pub fn is_fresh(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        let age_secs = now.signed_duration_since(self.created_at).num_seconds();
        let max_secs = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        age_secs < max_secs
    }
}

/// Storage backend for cache entries, keyed by module name.
pub trait OptionStore: Send + Sync {
    /// `Ok(None)` when nothing has been stored for `module` yet.
    fn get(&self, module: &str) -> Result<Option<CacheEntry>, CacheError>;
    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError>;
}

/// Stores each entry as `recon-<module>.json` inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// A store rooted at the user's state directory.
    pub fn from_state_dir() -> Result<Self, CacheError> {
        Ok(Self::new(paths::get_state_dir()?))
    }
}

impl OptionStore for FileStore {
    fn get(&self, module: &str) -> Result<Option<CacheEntry>, CacheError> {
        let path = paths::cache_file_path(&self.dir, module);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| CacheError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let entry = serde_json::from_str(&content).map_err(|e| CacheError::Corrupted {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Some(entry))
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        paths::ensure_dir(&self.dir)?;
        let path = paths::cache_file_path(&self.dir, &entry.provider_name);
        let write_err = |e: std::io::Error| CacheError::Write {
            path: path.display().to_string(),
            source: e,
        };

        let json = serde_json::to_string_pretty(entry)
            .map_err(|e| write_err(std::io::Error::other(e)))?;
        fs::write(&path, json).map_err(write_err)?;
        log::debug!("Cached {} options at '{}'", entry.options.len(), path.display());
        Ok(())
    }
}

/// Process-local store, used by tests and when no state directory is available.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OptionStore for MemoryStore {
    fn get(&self, module: &str) -> Result<Option<CacheEntry>, CacheError> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        Ok(entries.get(module).cloned())
    }

    fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.insert(entry.provider_name.clone(), entry.clone());
        Ok(())
    }
}

/// Returns the cached options for `module` when fresh, otherwise runs `live` and caches its result.
///
/// Cache read problems are debug-logged misses; write problems are warnings. Only `live` can fail.
pub fn options_or_cache<S, F, E>(
    store: &S,
    module: &str,
    max_age: Duration,
    live: F,
) -> Result<Vec<Target>, E>
where
    S: OptionStore + ?Sized,
    F: FnOnce() -> Result<Vec<Target>, E>,
{
    // 1. Try the cache
    match store.get(module) {
        Ok(Some(entry)) if entry.is_fresh(max_age, Utc::now()) => {
            log::debug!("Using {} cached options for '{}'", entry.options.len(), module);
            return Ok(entry.options);
        }
        Ok(Some(_)) => log::debug!("Cache for '{}' is stale", module),
        Ok(None) => log::debug!("No cache for '{}'", module),
        Err(e) => log::debug!("Ignoring unreadable cache for '{}': {}", module, e),
    }

    // 2. Live discovery
    let options = live()?;

    // 3. Refresh the cache
    if let Err(e) = store.put(&CacheEntry::new(module, options.clone())) {
        log::warn!("Could not write cache for '{}': {}", module, e);
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn target(id: &str) -> Target {
        Target {
            provider_name: "project".into(),
            provider_type: "project".into(),
            id: id.into(),
            name: id.into(),
            display_name: id.into(),
            start_directory: "{{name}}".into(),
            ..Default::default()
        }
    }

    fn aged_entry(secs: i64, options: Vec<Target>) -> CacheEntry {
        CacheEntry {
            provider_name: "project".into(),
            options,
            created_at: Utc::now() - chrono::Duration::seconds(secs),
        }
    }

    #[test]
    fn test_freshness_boundaries() {
        let now = Utc::now();
        let entry = CacheEntry {
            created_at: now - chrono::Duration::seconds(299),
            ..aged_entry(0, vec![])
        };
        assert!(entry.is_fresh(Duration::from_secs(300), now));
        assert!(!entry.is_fresh(Duration::from_secs(299), now));
        assert!(!entry.is_fresh(Duration::ZERO, now));
    }

    #[test]
    fn test_file_store_round_trip_keeps_templates() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let entry = CacheEntry::new("project", vec![target("/src/api")]);

        // --- Execute ---
        store.put(&entry).unwrap();
        let loaded = store.get("project").unwrap().unwrap();

        // --- Assert ---
        assert!(dir.path().join("recon-project.json").exists());
        assert_eq!(loaded, entry);
        assert_eq!(loaded.options[0].start_directory, "{{name}}");
    }

    #[test]
    fn test_file_store_missing_is_none() {
        let dir = tempdir().unwrap();
        assert!(FileStore::new(dir.path()).get("ssh").unwrap().is_none());
    }

    #[test]
    fn test_corrupted_cache_is_a_miss() {
        // --- Setup ---
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("recon-project.json"), "{ not json").unwrap();
        let store = FileStore::new(dir.path());

        // --- Execute ---
        let mut ran = false;
        let options = options_or_cache(&store, "project", Duration::from_secs(300), || {
            ran = true;
            Ok::<_, std::io::Error>(vec![target("/live")])
        })
        .unwrap();

        // --- Assert ---
        assert!(ran);
        assert_eq!(options[0].id, "/live");
        // The live result replaced the broken file
        assert_eq!(store.get("project").unwrap().unwrap().options[0].id, "/live");
    }

    #[test]
    fn test_fresh_cache_skips_live_discovery() {
        let store = MemoryStore::new();
        store.put(&aged_entry(10, vec![target("/cached")])).unwrap();

        let options = options_or_cache(&store, "project", Duration::from_secs(300), || {
            Err::<Vec<Target>, _>("live discovery must not run")
        })
        .unwrap();
        assert_eq!(options[0].id, "/cached");
    }

    #[test]
    fn test_stale_cache_runs_live_discovery() {
        let store = MemoryStore::new();
        store.put(&aged_entry(1000, vec![target("/cached")])).unwrap();

        let options = options_or_cache(&store, "project", Duration::from_secs(300), || {
            Ok::<_, String>(vec![target("/live")])
        })
        .unwrap();
        assert_eq!(options[0].id, "/live");
    }

    #[test]
    fn test_live_error_propagates_and_keeps_cache() {
        let store = MemoryStore::new();
        store.put(&aged_entry(1000, vec![target("/cached")])).unwrap();

        let result = options_or_cache(&store, "project", Duration::from_secs(300), || {
            Err::<Vec<Target>, _>("scan failed".to_string())
        });
        assert_eq!(result.unwrap_err(), "scan failed");
        assert_eq!(store.get("project").unwrap().unwrap().options[0].id, "/cached");
    }
}
