// src/core/reconciler.rs

//! # Session Reconciler
//!
//! Diffs a resolved [`Layout`] against what a session manager already has and
//! mutates only what is missing:
//!
//! `Lookup -> {Attach | Create} -> Populate -> Select -> Attach`
//!
//! Multiplexers (tmux) go through [`Multiplexer`]; window managers go through
//! [`WorkspaceIpc`]. Both seams are small so tests can swap in fakes.

use crate::backend::compositor;
use crate::backend::{AppendMode, BackendError, RunOptions};
use crate::models::{App, Target};
use std::path::PathBuf;

/// A session as reported by the multiplexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub name: String,
    pub attached: bool,
}

/// A window as reported by the multiplexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub index: u32,
    pub name: String,
}

/// A window the reconciler wants to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSpec {
    pub index: u32,
    pub name: String,
    pub start_directory: PathBuf,
}

/// Terminal multiplexer operations used by [`reconcile_session`].
pub trait Multiplexer {
    fn backend_name(&self) -> &'static str;
    fn list_sessions(&self) -> Result<Vec<SessionInfo>, BackendError>;
    fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, BackendError>;
    /// Creates a detached session whose first window is `first`.
    fn create_session(&self, session: &str, first: &WindowSpec) -> Result<(), BackendError>;
    fn create_window(&self, session: &str, window: &WindowSpec) -> Result<(), BackendError>;
    /// Pane ids of a window, in order.
    fn list_panes(&self, session: &str, window: u32) -> Result<Vec<String>, BackendError>;
    fn send_command(&self, pane: &str, command: &str) -> Result<(), BackendError>;
    fn select_window(&self, session: &str, window: u32) -> Result<(), BackendError>;
    /// Attaches the terminal, or switches the current client when already inside the multiplexer.
    fn attach(&self, session: &str) -> Result<(), BackendError>;
    fn kill_session(&self, session: &str) -> Result<(), BackendError>;

    /// Exact-name lookup.
    fn find_session(&self, name: &str) -> Result<Option<SessionInfo>, BackendError> {
        Ok(self.list_sessions()?.into_iter().find(|s| s.name == name))
    }
}

/// One planned window: where an app lives and whether it must be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedWindow {
    pub index: u32,
    pub name: String,
    pub is_new: bool,
    pub is_default: bool,
    pub commands: Vec<String>,
}

/// Matches apps to existing windows by name and assigns indices to the missing ones.
///
/// A fresh session numbers its windows from `base_index`; windows appended to an
/// existing session continue after its highest index. Apps sharing a name map to one window.
pub fn plan_windows(apps: &[App], existing: &[WindowInfo], base_index: u32) -> Vec<PlannedWindow> {
    let mut next_index = existing
        .iter()
        .map(|w| w.index)
        .max()
        .map_or(base_index, |max| max.saturating_add(1));

    let mut plan: Vec<PlannedWindow> = Vec::new();
    for app in apps {
        if plan.iter().any(|p| p.name == app.name) {
            log::debug!("App '{}' listed twice, keeping the first", app.name);
            continue;
        }

        let (index, is_new) = match existing.iter().find(|w| w.name == app.name) {
            Some(window) => (window.index, false),
            None => {
                let index = next_index;
                next_index = next_index.saturating_add(1);
                (index, true)
            }
        };

        plan.push(PlannedWindow {
            index,
            name: app.name.clone(),
            is_new,
            is_default: app.default,
            commands: app.command_templates().map(str::to_string).collect(),
        });
    }
    plan
}

/// The default app's window; otherwise `base_index` when such a window exists,
/// else the first planned window.
pub fn window_to_select(plan: &[PlannedWindow], existing: &[WindowInfo], base_index: u32) -> u32 {
    if let Some(window) = plan.iter().find(|w| w.is_default) {
        return window.index;
    }
    let has_base = existing.iter().any(|w| w.index == base_index)
        || plan.iter().any(|w| w.index == base_index);
    if has_base || existing.is_empty() {
        return base_index;
    }
    plan.first().map_or(base_index, |w| w.index)
}

/// The directory windows start in; the home directory when the target's does not exist.
pub fn start_directory_or_home(target: &Target) -> PathBuf {
    let dir = target.resolve_start_directory();
    if dir.is_dir() {
        return dir;
    }
    log::debug!("Start directory '{}' does not exist, using home", dir.display());
    dirs::home_dir().unwrap_or(dir)
}

/// Brings a multiplexer session in line with `opts.layout`, then attaches to it.
pub fn reconcile_session(
    mux: &dyn Multiplexer,
    target: &Target,
    opts: &RunOptions,
    base_index: u32,
) -> Result<(), BackendError> {
    let session = opts.session_name.as_str();
    let backend = mux.backend_name();
    let step = |window: &str, command: &str, source: BackendError| BackendError::Step {
        backend,
        session: session.to_string(),
        window: window.to_string(),
        command: command.to_string(),
        source: Box::new(source),
    };

    // 1. Lookup
    let existing = mux.find_session(session)?;
    log::debug!("Session '{}' exists: {}", session, existing.is_some());

    // 2. Attach fast path
    if existing.is_some() && opts.append_mode == AppendMode::CreateOrAttach {
        log::debug!("Attaching to existing session '{}'", session);
        return mux.attach(session);
    }

    // 3. Create
    let current = match existing {
        Some(_) => mux.list_windows(session)?,
        None => Vec::new(),
    };
    let plan = plan_windows(&opts.layout.apps, &current, base_index);
    let start_directory = start_directory_or_home(target);
    let spec = |window: &PlannedWindow| WindowSpec {
        index: window.index,
        name: window.name.clone(),
        start_directory: start_directory.clone(),
    };

    let mut created: Vec<&PlannedWindow> = Vec::new();
    for window in plan.iter().filter(|w| w.is_new) {
        let session_exists = existing.is_some() || !created.is_empty();
        if session_exists {
            mux.create_window(session, &spec(window))
                .map_err(|e| step(&window.name, "new-window", e))?;
        } else {
            mux.create_session(session, &spec(window))
                .map_err(|e| step(&window.name, "new-session", e))?;
        }
        created.push(window);
    }
    if existing.is_none() && created.is_empty() {
        // A layout without apps still gets a session with one plain window.
        let bare = WindowSpec {
            index: base_index,
            name: String::new(),
            start_directory: start_directory.clone(),
        };
        mux.create_session(session, &bare)
            .map_err(|e| step("", "new-session", e))?;
    }

    // 4. Populate
    for window in created.iter().filter(|w| !w.commands.is_empty()) {
        let panes = mux
            .list_panes(session, window.index)
            .map_err(|e| step(&window.name, "list-panes", e))?;
        for pane in &panes {
            for template in &window.commands {
                let command = target.resolve_placeholders(template);
                log::debug!("Sending '{}' to {}:{} ({})", command, session, window.name, pane);
                mux.send_command(pane, &command)
                    .map_err(|e| step(&window.name, &command, e))?;
            }
        }
    }

    // 5. Select
    let selected = window_to_select(&plan, &current, base_index);
    mux.select_window(session, selected)
        .map_err(|e| step(&selected.to_string(), "select-window", e))?;

    // 6. Attach
    mux.attach(session)
}

/// Window-manager operations used by [`reconcile_workspace`].
pub trait WorkspaceIpc {
    fn backend_name(&self) -> &'static str;
    /// Handles of the windows on the focused workspace.
    fn focused_workspace_windows(&self) -> Result<Vec<String>, BackendError>;
    fn kill_window(&self, window: &str) -> Result<(), BackendError>;
    /// Runs a shell command line detached from the launcher.
    fn exec(&self, command_line: &str) -> Result<(), BackendError>;
}

/// Launches every app of `opts.layout` on the focused workspace.
///
/// With `clear-workspace`, existing windows are closed first; individual close
/// failures are only logged. Any launch failure aborts.
pub fn reconcile_workspace(
    ipc: &dyn WorkspaceIpc,
    target: &Target,
    opts: &RunOptions,
    term: &str,
) -> Result<(), BackendError> {
    let backend = ipc.backend_name();
    let start_directory = target.resolve_start_directory();

    // 1. Clear
    if opts.layout.clear_workspace {
        let windows = ipc.focused_workspace_windows()?;
        log::debug!("Clearing {} windows from the focused workspace", windows.len());
        for window in windows {
            if let Err(e) = ipc.kill_window(&window) {
                log::warn!("{}: failed to close window {}: {}", backend, window, e);
            }
        }
    }

    // 2. Launch
    for app in &opts.layout.apps {
        let launch = |app: &App| -> Result<(), BackendError> {
            let line = compositor::launch_line(app, target, &start_directory, term)?;
            log::debug!("{}: starting '{}' with: {}", backend, app.name, line);
            ipc.exec(&line)
        };
        launch(app).map_err(|e| BackendError::Launch {
            backend,
            app: app.name.clone(),
            source: Box::new(e),
        })?;
    }

    Ok(())
}
