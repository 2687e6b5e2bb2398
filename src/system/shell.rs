// src/system/shell.rs

use crate::models::{Layout, Target};
use std::env;
use std::io;
use std::path::PathBuf;
use std::process::Command;

/// How the launcher hands the terminal over to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStrategy {
    /// Replace the launcher process (unix `exec`).
    Replace,
    /// Spawn the shell, wait for it, and return its exit status.
    SpawnAndWait,
}

impl Default for ExecStrategy {
    fn default() -> Self {
        if cfg!(unix) {
            ExecStrategy::Replace
        } else {
            ExecStrategy::SpawnAndWait
        }
    }
}

/// A fully resolved shell invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellPlan {
    pub directory: PathBuf,
    pub program: String,
    pub args: Vec<String>,
}

/// The user's shell, `/bin/sh` when `$SHELL` is unset.
pub fn user_shell() -> String {
    env::var("SHELL")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "/bin/sh".to_string())
}

impl ShellPlan {
    /// Runs the commands of every default app with `$SHELL -c`, or opens an interactive shell.
    pub fn new(target: &Target, layout: &Layout, directory: PathBuf, shell: String) -> Self {
        let commands: Vec<String> = layout
            .apps
            .iter()
            .filter(|app| app.default)
            .flat_map(|app| app.command_templates())
            .map(|c| target.resolve_placeholders(c))
            .collect();

        let args = if commands.is_empty() {
            Vec::new()
        } else {
            vec!["-c".to_string(), commands.join(" && ")]
        };

        Self {
            directory,
            program: shell,
            args,
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).current_dir(&self.directory);
        command
    }

    /// Hands the terminal to the shell. With [`ExecStrategy::Replace`] this only returns on error.
    pub fn execute(&self, strategy: ExecStrategy) -> io::Result<()> {
        log::debug!(
            "Starting '{}' {:?} in '{}' ({:?})",
            self.program,
            self.args,
            self.directory.display(),
            strategy
        );
        match strategy {
            #[cfg(unix)]
            ExecStrategy::Replace => {
                use std::os::unix::process::CommandExt;
                Err(self.command().exec())
            }
            #[cfg(not(unix))]
            ExecStrategy::Replace => self.spawn_and_wait(),
            ExecStrategy::SpawnAndWait => self.spawn_and_wait(),
        }
    }

    fn spawn_and_wait(&self) -> io::Result<()> {
        let status = self.command().status()?;
        if !status.success() {
            log::warn!("Shell exited with code: {:?}", status.code());
        }
        Ok(())
    }
}
