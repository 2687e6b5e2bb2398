// src/backend/compositor.rs

//! Pieces shared by the window-manager backends: the focused-workspace tree
//! walk and the launch line planner.

use super::BackendError;
use crate::core::placeholder;
use crate::models::{App, Target};
use serde::Deserialize;
use std::path::Path;

/// A node of an i3/sway layout tree. Only the fields the walk needs.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct TreeNode {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub node_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nodes: Vec<TreeNode>,
    /// Child ids, most recently focused first.
    #[serde(default)]
    pub focus: Vec<i64>,
}

/// Follows the focus chain from `root` down to the first workspace node.
pub fn focused_workspace(root: &TreeNode) -> Option<&TreeNode> {
    let mut node = root;
    loop {
        let target = *node.focus.first()?;
        let child = node.nodes.iter().find(|n| n.id == target)?;
        if child.node_type == "workspace" {
            return Some(child);
        }
        node = child;
    }
}

/// Direct tiled windows (`con` nodes) of a workspace.
pub fn workspace_windows(workspace: &TreeNode) -> Vec<i64> {
    workspace
        .nodes
        .iter()
        .filter(|n| n.node_type == "con")
        .map(|n| n.id)
        .collect()
}

/// The shell line that starts one app: `cd "<dir>" && <command>`.
///
/// A GUI app with exactly one command runs it bare. Everything else runs
/// inside the terminal named by `term`, executing the commands joined by `; `
/// (or an interactive `$SHELL` when there are none).
pub fn launch_line(app: &App, target: &Target, start_directory: &Path, term: &str) -> Result<String, BackendError> {
    let directory = start_directory.display().to_string();

    let command = match app.commands.as_slice() {
        [only] if app.gui => target.resolve_placeholders(&only.command),
        commands => {
            let script = if commands.is_empty() {
                "${SHELL}".to_string()
            } else {
                commands
                    .iter()
                    .map(|c| target.resolve_placeholders(&c.command))
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            terminal_command(term, &directory, &script)?
        }
    };

    Ok(format!("cd \"{}\" && {}", placeholder::escape(&directory), command))
}

fn quote(value: &str) -> Result<String, BackendError> {
    shlex::try_quote(value)
        .map(|q| q.into_owned())
        .map_err(|_| BackendError::Quote(value.to_string()))
}

/// Wraps `script` in the terminal emulator named by `$TERM`.
pub fn terminal_command(term: &str, directory: &str, script: &str) -> Result<String, BackendError> {
    let dir = quote(directory)?;
    let script = quote(script)?;

    let command = match term {
        "alacritty" => format!("alacritty --working-directory {} -e bash -c {}", dir, script),
        "foot" => format!("foot --working-directory {} -e bash -c {}", dir, script),
        "kitty" | "xterm-kitty" => format!("kitty -d {} bash -c {}", dir, script),
        "gnome-terminal" => format!("gnome-terminal --working-directory={} -- bash -c {}", dir, script),
        "xfce4-terminal" => format!(
            "xfce4-terminal --working-directory={} --command={}",
            dir,
            quote(&format!("bash -c {}", script))?
        ),
        "konsole" => format!("konsole --workdir {} -e bash -c {}", dir, script),
        "xterm" => format!("xterm -e bash -c {}", quote(&format!("cd {}; bash -c {}", dir, script))?),
        other => return Err(BackendError::UnsupportedTerminal(other.to_string())),
    };
    Ok(command)
}
