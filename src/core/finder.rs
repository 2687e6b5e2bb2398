// src/core/finder.rs

//! # Finder
//!
//! Lets the user pick one target: through `fzf` when available, through an
//! embedded `dialoguer` fuzzy picker otherwise, or not at all when an external
//! tool (e.g. telescope) asks for the raw option list.

use crate::models::{FinderConfig, FinderKind, Target};
use crate::system::executor::{self, ExecutionError};
use dialoguer::{FuzzySelect, theme::ColorfulTheme};
use serde::Serialize;
use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    #[error("No option selected.")]
    NothingSelected,
    #[error("fzf failed: {0}")]
    Fzf(#[source] ExecutionError),
    #[error("The selected entry '{0}' is not in the option list.")]
    UnknownSelection(String),
    #[error("Interactive picker failed: {0}")]
    Prompt(#[from] dialoguer::Error),
    #[error("Could not determine the path of the running executable: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("Output mode '{0}' is not supported (valid: telescope).")]
    UnsupportedMode(String),
    #[error("Failed to serialize options: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Settles `auto` to a concrete finder.
pub fn effective_kind(kind: &FinderKind) -> FinderKind {
    match kind {
        FinderKind::Auto if executor::is_executable_in_path("fzf") => FinderKind::Fzf,
        FinderKind::Auto => FinderKind::Embedded,
        other => other.clone(),
    }
}

/// Shows the picker and returns the chosen target.
pub fn pick(options: &[Target], config: &FinderConfig) -> Result<Target, FinderError> {
    let kind = effective_kind(&config.executable);
    log::debug!("Picking from {} options with {:?}", options.len(), kind);
    match kind {
        FinderKind::Fzf => pick_with_fzf(options, config),
        _ => pick_embedded(options),
    }
}

/// One fzf input line per option: `<id><delim><display name>`.
pub fn fzf_input(options: &[Target], delimiter: &str) -> String {
    options
        .iter()
        .map(|o| format!("{}{}{}\n", o.id, delimiter, o.display_name))
        .collect()
}

/// The id part of an fzf output (or preview argument) line.
pub fn id_from_line<'a>(line: &'a str, delimiter: &str) -> &'a str {
    let line = line.trim_end_matches(['\r', '\n']);
    line.split(delimiter).next().unwrap_or(line)
}

/// Arguments for fzf; the preview re-invokes `exe preview {}`.
pub fn fzf_args(config: &FinderConfig, exe: &str, highlight: bool) -> Vec<String> {
    let mut args = vec![
        "-d".to_string(),
        config.fzf_delimiter.clone(),
        "--with-nth=2".to_string(),
    ];
    if config.preview {
        let quoted_exe = shlex::try_quote(exe).map_or_else(|_| exe.to_string(), |q| q.into_owned());
        let mut preview = format!("{} preview {{}}", quoted_exe);
        if highlight {
            preview.push_str(" | bat --color=always -l markdown --style=plain");
        }
        args.push(format!("--preview={}", preview));
    }
    args
}

fn pick_with_fzf(options: &[Target], config: &FinderConfig) -> Result<Target, FinderError> {
    let exe = env::current_exe().map_err(FinderError::CurrentExe)?;
    let args = fzf_args(
        config,
        &exe.to_string_lossy(),
        executor::is_executable_in_path("bat"),
    );
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = match executor::run_with_input("fzf", &args, &fzf_input(options, &config.fzf_delimiter)) {
        Ok(output) => output,
        // fzf exits non-zero on Esc/Ctrl-C or when nothing matched.
        Err(ExecutionError::NonZeroExitStatus { .. }) => return Err(FinderError::NothingSelected),
        Err(e) => return Err(FinderError::Fzf(e)),
    };

    let id = id_from_line(&output, &config.fzf_delimiter);
    if id.is_empty() {
        return Err(FinderError::NothingSelected);
    }
    options
        .iter()
        .find(|o| o.id == id)
        .cloned()
        .ok_or_else(|| FinderError::UnknownSelection(id.to_string()))
}

fn pick_embedded(options: &[Target]) -> Result<Target, FinderError> {
    let names: Vec<&str> = options.iter().map(|o| o.display_name.as_str()).collect();
    let selection = FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Select")
        .items(&names)
        .default(0)
        .interact_opt()?
        .ok_or(FinderError::NothingSelected)?;

    options
        .get(selection)
        .cloned()
        .ok_or_else(|| FinderError::UnknownSelection(selection.to_string()))
}

#[derive(Serialize, Debug, PartialEq, Eq)]
struct TelescopeEntry<'a> {
    ordinal: &'a str,
    display: &'a str,
    value: &'a str,
}

/// Renders the option list for an external finder instead of picking.
pub fn render_for_mode(mode: &str, options: &[Target]) -> Result<String, FinderError> {
    match mode {
        "telescope" => {
            let entries: Vec<TelescopeEntry<'_>> = options
                .iter()
                .map(|o| TelescopeEntry {
                    ordinal: &o.id,
                    display: &o.display_name,
                    value: &o.id,
                })
                .collect();
            Ok(serde_json::to_string(&entries)?)
        }
        other => Err(FinderError::UnsupportedMode(other.to_string())),
    }
}
