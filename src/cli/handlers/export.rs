// src/cli/handlers/export.rs

use super::commons::AppContext;
use crate::cli::args::ExportArgs;
use crate::core::export;
use anyhow::{Context, Result};

pub fn handle(ctx: &AppContext, args: &ExportArgs) -> Result<()> {
    let modules = ctx.modules(&args.modules);
    let options = ctx.gather(&modules)?;

    let columns = export::columns(&modules, &args.columns);
    log::debug!(
        "Exporting {} options as {:?} with columns {:?}",
        options.len(),
        args.format,
        columns.iter().map(|c| c.key.as_str()).collect::<Vec<_>>()
    );

    let rendered = export::render(&options, &columns, args.format)?;
    export::write_output(&rendered, args.output.as_deref()).context("Failed to write export")?;
    Ok(())
}
