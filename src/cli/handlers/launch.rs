// src/cli/handlers/launch.rs

use super::commons::{self, AppContext};
use crate::backend::{self, Backend, RunOptions};
use crate::core::{finder, layout_resolver};
use crate::models::{Config, Target};
use crate::recon;
use anyhow::{Context, Result};

/// The root command: discover, pick, resolve the layout, hand it to a backend.
pub fn handle(ctx: &AppContext, only_modules: &[String]) -> Result<()> {
    // 1. Discovery
    let modules = ctx.modules(only_modules);
    let options = ctx.gather(&modules)?;

    // 2. External finder mode
    if let Some(mode) = ctx.settings.mode.as_deref() {
        println!("{}", finder::render_for_mode(mode, &options)?);
        return Ok(());
    }

    // 3. Selection
    let picked = match ctx.settings.select.as_deref() {
        Some(id) => recon::find_option(&options, id)?.clone(),
        None => finder::pick(&options, &ctx.config.finder)?,
    };
    let selected = commons::select(&modules, &picked)
        .with_context(|| format!("Failed to prepare '{}'", picked.display_name))?;

    // 4. Backend
    let backend = backend::choose_backend(
        backend::default_backends(&ctx.config.tmux),
        ctx.settings.backend.as_deref(),
    )?;

    // 5. Layout + run
    let opts = run_options(
        &ctx.config,
        &selected,
        ctx.settings.template.as_deref().unwrap_or(""),
        ctx.append_mode(),
    )?;
    run(backend.as_ref(), &selected, &opts)
}

/// Resolves the layout for `target` and packages it for a backend.
pub fn run_options(
    config: &Config,
    target: &Target,
    requested_layout: &str,
    append_mode: backend::AppendMode,
) -> Result<RunOptions> {
    let default_name = layout_resolver::default_layout_name(config, target);
    log::debug!("Default layout for '{}' is '{}'", target.id, default_name);
    let layout = layout_resolver::resolve(config, target, requested_layout, &default_name)?;

    Ok(RunOptions {
        session_name: target.name.clone(),
        layout,
        append_mode,
    })
}

fn run(backend: &dyn Backend, target: &Target, opts: &RunOptions) -> Result<()> {
    log::debug!(
        "Running '{}' with backend '{}' ({} apps)",
        opts.session_name,
        backend.name(),
        opts.layout.apps.len()
    );
    backend.run(target, opts)?;
    Ok(())
}
