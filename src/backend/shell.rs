// src/backend/shell.rs

use super::{Backend, BackendError, RunOptions};
use crate::core::reconciler;
use crate::models::Target;
use crate::system::shell::{self, ExecStrategy, ShellPlan};

/// The fallback backend: drop into `$SHELL` in the target's directory.
#[derive(Debug, Clone, Default)]
pub struct ShellBackend {
    pub strategy: ExecStrategy,
}

impl Backend for ShellBackend {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn check(&self) -> bool {
        true
    }

    fn order(&self) -> i32 {
        0
    }

    fn run(&self, target: &Target, opts: &RunOptions) -> Result<(), BackendError> {
        let plan = ShellPlan::new(
            target,
            &opts.layout,
            reconciler::start_directory_or_home(target),
            shell::user_shell(),
        );
        plan.execute(self.strategy).map_err(|source| BackendError::Shell {
            shell: plan.program.clone(),
            source,
        })
    }
}
