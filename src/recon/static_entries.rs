// src/recon/static_entries.rs

use super::{Discovery, ReconError};
use crate::core::cache::OptionStore;
use crate::models::{StaticEntry, StaticModuleConfig, Target};
use std::time::Duration;

/// Entries declared inline in the configuration. Never cached.
#[derive(Debug, Clone)]
pub struct StaticModule {
    name: String,
    config: StaticModuleConfig,
}

impl StaticModule {
    pub fn new(config: StaticModuleConfig) -> Self {
        let name = config.name.clone().unwrap_or_else(|| "static".to_string());
        Self { name, config }
    }

    fn to_target(&self, entry: &StaticEntry) -> Target {
        let name = if entry.name.is_empty() {
            entry.id.clone()
        } else {
            entry.name.clone()
        };
        let display_name = if entry.display_name.is_empty() {
            name.clone()
        } else {
            entry.display_name.clone()
        };

        let mut context = entry.context.clone();
        if !entry.preview.is_empty() {
            context.insert("preview".to_string(), entry.preview.clone());
        }
        if !entry.layout.is_empty() {
            context.insert("layout".to_string(), entry.layout.clone());
        }

        Target {
            provider_name: self.name.clone(),
            provider_type: self.module_type().to_string(),
            id: entry.id.clone(),
            display_name,
            name,
            description: entry.description.clone(),
            web: entry.web.clone(),
            start_directory: entry.start_directory.clone(),
            tags: entry.tags.clone(),
            context,
            ..Default::default()
        }
    }
}

impl Discovery for StaticModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn module_type(&self) -> &'static str {
        "static"
    }

    fn options(&self) -> Result<Vec<Target>, ReconError> {
        Ok(self.config.options.iter().map(|e| self.to_target(e)).collect())
    }

    fn options_or_cache(
        &self,
        _store: &dyn OptionStore,
        _max_age: Duration,
    ) -> Result<Vec<Target>, ReconError> {
        self.options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::MemoryStore;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn module() -> StaticModule {
        StaticModule::new(StaticModuleConfig {
            name: None,
            options: vec![
                StaticEntry {
                    id: "1".into(),
                    name: "custom-option".into(),
                    display_name: "Custom Option".into(),
                    description: "This is a custom option".into(),
                    web: "https://example.com".into(),
                    layout: "notes".into(),
                    preview: "Remember the milk".into(),
                    context: BTreeMap::from([("owner".to_string(), "me".to_string())]),
                    ..Default::default()
                },
                StaticEntry {
                    id: "bare".into(),
                    ..Default::default()
                },
            ],
        })
    }

    #[test]
    fn test_entries_become_targets() {
        let options = module().options().unwrap();
        let first = &options[0];
        assert_eq!(first.provider_name, "static");
        assert_eq!(first.id, "1");
        assert_eq!(first.name, "custom-option");
        assert_eq!(first.display_name, "Custom Option");
        assert_eq!(first.description, "This is a custom option");
        assert_eq!(first.web, "https://example.com");
        assert_eq!(first.context.get("layout").map(String::as_str), Some("notes"));
        assert_eq!(first.context.get("preview").map(String::as_str), Some("Remember the milk"));
        assert_eq!(first.context.get("owner").map(String::as_str), Some("me"));
    }

    #[test]
    fn test_missing_names_fall_back_to_id() {
        let options = module().options().unwrap();
        assert_eq!(options[1].name, "bare");
        assert_eq!(options[1].display_name, "bare");
        assert!(options[1].context.is_empty());
    }

    #[test]
    fn test_never_touches_the_cache() {
        let store = MemoryStore::new();
        module().options_or_cache(&store, Duration::from_secs(300)).unwrap();
        assert!(store.get("static").unwrap().is_none());
    }
}
