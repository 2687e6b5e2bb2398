// src/backend/tmux.rs

use super::{Backend, BackendError, RunOptions};
use crate::core::reconciler::{self, Multiplexer, SessionInfo, WindowInfo, WindowSpec};
use crate::models::Target;
use crate::system::executor;
use std::env;

const TMUX: &str = "tmux";

/// `true` when running inside a tmux client.
pub fn inside_tmux() -> bool {
    env::var_os("TMUX").is_some_and(|v| !v.is_empty())
}

/// tmux silently rewrites `.` and `:` in session names; do it up front so lookups match.
pub fn sanitize_session_name(name: &str) -> String {
    name.replace(['.', ':'], "_")
}

fn exact_session(session: &str) -> String {
    format!("={}", session)
}

fn exact_window(session: &str, window: u32) -> String {
    format!("={}:{}", session, window)
}

/// [`Multiplexer`] backed by the `tmux` command line client.
#[derive(Debug, Clone, Default)]
pub struct TmuxCli;

impl TmuxCli {
    fn run(&self, args: &[&str]) -> Result<String, BackendError> {
        Ok(executor::run_and_capture(TMUX, args)?)
    }
}

impl Multiplexer for TmuxCli {
    fn backend_name(&self) -> &'static str {
        TMUX
    }

    fn list_sessions(&self) -> Result<Vec<SessionInfo>, BackendError> {
        // Without a running server there are simply no sessions.
        let output = match executor::run_and_capture(
            TMUX,
            &["list-sessions", "-F", "#{session_name}\t#{session_attached}"],
        ) {
            Ok(output) => output,
            Err(e) => {
                log::debug!("tmux list-sessions failed, assuming no server: {}", e);
                return Ok(Vec::new());
            }
        };

        Ok(output
            .lines()
            .filter_map(|line| {
                let (name, attached) = line.split_once('\t')?;
                Some(SessionInfo {
                    name: name.to_string(),
                    attached: attached.trim() != "0",
                })
            })
            .collect())
    }

    fn list_windows(&self, session: &str) -> Result<Vec<WindowInfo>, BackendError> {
        let output = self.run(&[
            "list-windows",
            "-t",
            &exact_session(session),
            "-F",
            "#{window_index}\t#{window_name}",
        ])?;
        Ok(parse_windows(&output))
    }

    fn create_session(&self, session: &str, first: &WindowSpec) -> Result<(), BackendError> {
        let dir = first.start_directory.display().to_string();
        let mut args = vec!["new-session", "-d", "-P", "-F", "#{window_index}", "-s", session, "-c", &dir];
        if !first.name.is_empty() {
            args.extend(["-n", first.name.as_str()]);
        }
        let created = self.run(&args)?;

        // new-session ignores the index we want; move the window if the server's base-index differs.
        let actual = created.trim();
        if actual != first.index.to_string() {
            log::debug!("Moving window {} of '{}' to index {}", actual, session, first.index);
            self.run(&[
                "move-window",
                "-s",
                &format!("={}:{}", session, actual),
                "-t",
                &exact_window(session, first.index),
            ])?;
        }
        Ok(())
    }

    fn create_window(&self, session: &str, window: &WindowSpec) -> Result<(), BackendError> {
        let dir = window.start_directory.display().to_string();
        self.run(&[
            "new-window",
            "-d",
            "-t",
            &exact_window(session, window.index),
            "-n",
            &window.name,
            "-c",
            &dir,
        ])?;
        Ok(())
    }

    fn list_panes(&self, session: &str, window: u32) -> Result<Vec<String>, BackendError> {
        let output = self.run(&["list-panes", "-t", &exact_window(session, window), "-F", "#{pane_id}"])?;
        Ok(output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn send_command(&self, pane: &str, command: &str) -> Result<(), BackendError> {
        self.run(&["send-keys", "-t", pane, command, "Enter"])?;
        Ok(())
    }

    fn select_window(&self, session: &str, window: u32) -> Result<(), BackendError> {
        self.run(&["select-window", "-t", &exact_window(session, window)])?;
        Ok(())
    }

    fn attach(&self, session: &str) -> Result<(), BackendError> {
        let target = exact_session(session);
        if inside_tmux() {
            self.run(&["switch-client", "-t", &target])?;
        } else {
            executor::run_interactive(TMUX, &["attach-session", "-t", &target], None)?;
        }
        Ok(())
    }

    fn kill_session(&self, session: &str) -> Result<(), BackendError> {
        self.run(&["kill-session", "-t", &exact_session(session)])?;
        Ok(())
    }
}

fn parse_windows(output: &str) -> Vec<WindowInfo> {
    output
        .lines()
        .filter_map(|line| {
            let (index, name) = line.split_once('\t')?;
            let index = index.trim().parse().ok()?;
            Some(WindowInfo {
                index,
                name: name.to_string(),
            })
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct TmuxBackend {
    base_index: u32,
    client: TmuxCli,
}

impl TmuxBackend {
    pub fn new(base_index: u32) -> Self {
        Self {
            base_index,
            client: TmuxCli,
        }
    }
}

impl Backend for TmuxBackend {
    fn name(&self) -> &'static str {
        TMUX
    }

    fn check(&self) -> bool {
        inside_tmux() || executor::probe(TMUX, &["list-sessions"])
    }

    fn order(&self) -> i32 {
        if inside_tmux() { 1000 } else { 100 }
    }

    fn run(&self, target: &Target, opts: &RunOptions) -> Result<(), BackendError> {
        let opts = RunOptions {
            session_name: sanitize_session_name(&opts.session_name),
            ..opts.clone()
        };
        reconciler::reconcile_session(&self.client, target, &opts, self.base_index)
    }
}
