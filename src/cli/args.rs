// src/cli/args.rs

use crate::constants::DEFAULT_CACHE_AGE_SECS;
use crate::core::export::ExportFormat;
use clap::Args;
use std::path::PathBuf;

/// Flags accepted by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Backend to launch with (tmux, hyprland, sway, i3, shell). Auto-detected if not set.
    #[arg(long = "launcher", visible_alias = "backend", global = true)]
    pub backend: Option<String>,

    /// Layout to use instead of the auto-detected one.
    #[arg(long, short = 't', global = true)]
    pub template: Option<String>,

    /// Only show options carrying one of these tags.
    #[arg(long, value_delimiter = ',', global = true)]
    pub show_tags: Vec<String>,

    /// Hide options carrying any of these tags.
    #[arg(long, value_delimiter = ',', global = true)]
    pub hide_tags: Vec<String>,

    /// Maximum age of the option cache, in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_AGE_SECS, global = true)]
    pub cache_age: u64,

    /// Skip the finder and select the option with this id.
    #[arg(long, global = true)]
    pub select: Option<String>,

    /// Print the options for an external finder and exit (valid: telescope).
    #[arg(long, global = true)]
    pub mode: Option<String>,

    /// Add missing windows to an existing session instead of only attaching to it.
    #[arg(long, global = true)]
    pub append: bool,

    /// Log filter, e.g. `debug` or `muxpick=trace`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ExportArgs {
    /// Modules to collect options from; all when empty.
    #[arg(long = "module", short = 'm')]
    pub modules: Vec<String>,

    /// Output format.
    #[arg(long, short = 'f', value_enum, default_value_t = ExportFormat::Table)]
    pub format: ExportFormat,

    /// Columns to include, by key or name.
    #[arg(long = "columns", short = 'c', value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Output file; stdout when not set.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}
