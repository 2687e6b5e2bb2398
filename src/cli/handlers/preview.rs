// src/cli/handlers/preview.rs

use super::commons::{self, AppContext};
use crate::core::finder;
use crate::recon;
use anyhow::Result;
use std::env;
use std::time::Duration;

/// Maximum cache age when looking up an option to preview.
const PREVIEW_CACHE_AGE: Duration = Duration::from_secs(3600);

/// Prints the detail view of one option.
pub fn handle(ctx: &AppContext, raw_id: &str) -> Result<()> {
    // fzf passes the whole line; the id is everything before the delimiter.
    let id = if env::var_os("FZF_PREVIEW_TOP").is_some() {
        finder::id_from_line(raw_id, &ctx.config.finder.fzf_delimiter)
    } else {
        raw_id
    };

    let modules = ctx.modules(&[]);
    let (options, errors) = recon::collect_options(&modules, ctx.store.as_ref(), PREVIEW_CACHE_AGE);
    for error in &errors {
        log::debug!("{}", error);
    }

    let option = recon::find_option(&options, id)?;
    let selected = commons::select(&modules, option)?;
    println!("{}", selected.render_preview());
    Ok(())
}
