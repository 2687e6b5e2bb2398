// src/backend/mod.rs

//! # Backend Adapters
//!
//! A backend turns a resolved layout into running programs: a tmux session,
//! windows on the focused compositor workspace, or a plain shell.
//!
//! ## Modules
//!
//! - **`tmux`**: drives the `tmux` CLI; the heaviest user of the session reconciler.
//! - **`compositor`**: helpers shared by the window-manager backends (tree walk, launch lines).
//! - **`i3`**: i3 and sway over the i3 IPC protocol.
//! - **`hyprland`**: Hyprland over its request socket.
//! - **`shell`**: the always-available fallback.

pub mod compositor;
#[cfg(unix)]
pub mod hyprland;
#[cfg(unix)]
pub mod i3;
pub mod shell;
pub mod tmux;

use crate::models::{Layout, TmuxConfig, Target};
use crate::system::executor::ExecutionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("No usable backend found{}", requested_suffix(.0))]
    NoBackendAvailable(Option<String>),
    #[error("{backend}: session '{session}', window '{window}': '{command}' failed: {source}")]
    Step {
        backend: &'static str,
        session: String,
        window: String,
        command: String,
        #[source]
        source: Box<BackendError>,
    },
    #[error("{backend}: failed to launch app '{app}': {source}")]
    Launch {
        backend: &'static str,
        app: String,
        #[source]
        source: Box<BackendError>,
    },
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("{backend} IPC request timed out")]
    IpcTimeout { backend: &'static str },
    #[error("{backend} IPC I/O error: {source}")]
    IpcIo {
        backend: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{backend} IPC returned an unexpected reply: {message}")]
    IpcReply { backend: &'static str, message: String },
    #[error("{backend}: no focused workspace found")]
    NoFocusedWorkspace { backend: &'static str },
    #[error("Unsupported terminal '{0}'. Set $TERM to one of: alacritty, foot, kitty, gnome-terminal, xfce4-terminal, konsole, xterm.")]
    UnsupportedTerminal(String),
    #[error("Command contains characters that cannot be quoted: {0}")]
    Quote(String),
    #[error("Failed to start shell '{shell}': {source}")]
    Shell {
        shell: String,
        #[source]
        source: std::io::Error,
    },
}

fn requested_suffix(requested: &Option<String>) -> String {
    match requested {
        Some(name) => format!(" (requested '{}')", name),
        None => String::new(),
    }
}

/// How the reconciler treats a session that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppendMode {
    /// Attach to an existing session as-is; create it otherwise.
    #[default]
    CreateOrAttach,
    /// Add any missing windows to an existing session, then attach.
    Append,
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub session_name: String,
    pub layout: Layout,
    pub append_mode: AppendMode,
}

/// A session manager the launcher can hand a resolved layout to.
pub trait Backend {
    fn name(&self) -> &'static str;
    /// Whether this backend can be used in the current environment.
    fn check(&self) -> bool;
    /// Higher wins during auto-selection.
    fn order(&self) -> i32;
    fn run(&self, target: &Target, opts: &RunOptions) -> Result<(), BackendError>;
}

/// All built-in backends, in registry order.
pub fn default_backends(tmux: &TmuxConfig) -> Vec<Box<dyn Backend>> {
    let mut backends: Vec<Box<dyn Backend>> = vec![Box::new(tmux::TmuxBackend::new(tmux.base_index))];
    #[cfg(unix)]
    {
        backends.push(Box::new(hyprland::HyprlandBackend));
        backends.push(Box::new(i3::I3Backend::sway()));
        backends.push(Box::new(i3::I3Backend::i3()));
    }
    backends.push(Box::new(shell::ShellBackend::default()));
    backends
}

/// Picks a backend.
///
/// An explicit name must exist and pass its check. Otherwise the highest
/// `order` whose check passes wins; registry order breaks ties.
pub fn choose_backend(
    mut backends: Vec<Box<dyn Backend>>,
    requested: Option<&str>,
) -> Result<Box<dyn Backend>, BackendError> {
    if let Some(name) = requested.filter(|n| !n.is_empty()) {
        let position = backends
            .iter()
            .position(|b| b.name() == name && b.check())
            .ok_or_else(|| BackendError::NoBackendAvailable(Some(name.to_string())))?;
        log::debug!("Using requested backend '{}'", name);
        return Ok(backends.swap_remove(position));
    }

    // Stable sort keeps registry order between equal orders.
    backends.sort_by_key(|b| std::cmp::Reverse(b.order()));
    let position = backends
        .iter()
        .position(|b| b.check())
        .ok_or(BackendError::NoBackendAvailable(None))?;
    let chosen = backends.swap_remove(position);
    log::debug!("Selected backend '{}' (order {})", chosen.name(), chosen.order());
    Ok(chosen)
}
