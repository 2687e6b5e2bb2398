// src/core/layout_resolver.rs

//! # Layout Resolver
//!
//! Picks the layout for a selected target and narrows it down to the apps and
//! commands whose rules match that target.

use crate::constants::DEFAULT_LAYOUT_NAME;
use crate::core::rules::{self, RuleContext};
use crate::models::{App, Command, Config, Layout, Target};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Layout '{0}' not found. Check the `layouts` section of your configuration.")]
    LayoutNotFound(String),
}

/// The layout used when no template is requested and no rule matches.
///
/// `context.layout` wins; then a layout named after the provider or its type; then `default`.
pub fn default_layout_name(config: &Config, target: &Target) -> String {
    if let Some(layout) = target.context.get("layout").filter(|l| !l.is_empty()) {
        return layout.clone();
    }

    [&target.provider_name, &target.provider_type]
        .into_iter()
        .find(|name| config.layouts.contains_key(name.as_str()))
        .cloned()
        .unwrap_or_else(|| DEFAULT_LAYOUT_NAME.to_string())
}

/// Resolves the layout for `target`.
///
/// 1. An empty `requested` name auto-detects: the first layout (by name) with matching rules.
/// 2. No match, or an unknown `requested` name, falls back to `default_name`.
/// 3. The chosen layout has its apps and commands filtered by their rules.
pub fn resolve(
    config: &Config,
    target: &Target,
    requested: &str,
    default_name: &str,
) -> Result<Layout, LayoutError> {
    let context = RuleContext::from_target(target);

    // 1. Auto-detect
    let mut name = requested.to_string();
    if name.is_empty() {
        log::debug!("No layout requested for '{}', auto-detecting", target.id);
        if let Some((key, _)) = config
            .layouts
            .iter()
            .find(|(_, layout)| !layout.rules.is_empty() && rules::evaluate(&layout.rules, &context) > 0)
        {
            log::debug!("Layout '{}' matched '{}'", key, target.id);
            name = key.clone();
        }
    }

    // 2. Fallback
    if name.is_empty() {
        name = default_name.to_string();
    } else if !config.layouts.contains_key(&name) {
        log::warn!(
            "Layout '{}' not found, falling back to '{}'. Check your configuration.",
            name,
            default_name
        );
        name = default_name.to_string();
    }

    let layout = config
        .layouts
        .get(&name)
        .ok_or_else(|| LayoutError::LayoutNotFound(name.clone()))?;

    // 3. Filter
    Ok(Layout {
        apps: filter_apps(&layout.apps, &context),
        ..layout.clone()
    })
}

/// Keeps apps whose rules pass, at most one per non-empty group, in declaration order.
pub fn filter_apps(apps: &[App], context: &RuleContext) -> Vec<App> {
    let mut seen_groups: Vec<&str> = Vec::new();
    let mut result = Vec::new();

    for app in apps {
        if !rules::passes(&app.rules, context) {
            continue;
        }
        if !app.group.is_empty() {
            if seen_groups.contains(&app.group.as_str()) {
                log::debug!("Skipping app '{}': group '{}' already taken", app.name, app.group);
                continue;
            }
            seen_groups.push(&app.group);
        }

        result.push(App {
            commands: filter_commands(&app.commands, context),
            ..app.clone()
        });
    }

    result
}

pub fn filter_commands(commands: &[Command], context: &RuleContext) -> Vec<Command> {
    commands
        .iter()
        .filter(|c| rules::passes(&c.rules, context))
        .cloned()
        .collect()
}
