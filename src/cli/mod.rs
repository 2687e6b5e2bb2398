// src/cli/mod.rs

use clap::{Parser, Subcommand};

pub mod args;
pub mod dispatcher;
pub mod handlers;

use args::{ExportArgs, GlobalArgs};

/// muxpick: fuzzy-find a project, host or entry and open a session for it.
///
/// Without a subcommand, options are collected from every configured module
/// (or only the modules named as arguments), one is picked, and the matching
/// layout is started with the best available backend.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
#[command(subcommand_precedence_over_arg = true)]
#[command(
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Restrict discovery to these modules.
    pub modules: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the detail view of an option (used by the fzf preview window).
    Preview {
        /// Option id, or a full fzf line when FZF_PREVIEW_TOP is set.
        id: String,
    },
    /// Export option details.
    Export(ExportArgs),
    /// Kill the named tmux sessions.
    #[command(visible_alias = "k")]
    Kill {
        #[arg(required = true)]
        sessions: Vec<String>,
    },
    /// Kill every tmux session.
    KillAll,
    /// Print version information.
    Version,
}
