// src/system/executor.rs

use std::env;
use std::io::Write;
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    #[error("Command '{command}' exited with a non-zero error code.{}", format_stderr(.stderr))]
    NonZeroExitStatus { command: String, stderr: String },
    #[error("Command '{command}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(" ({})", trimmed)
    }
}

fn display(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Runs a program to completion and captures its standard output.
///
/// Standard error is captured too and folded into the error on failure.
pub fn run_and_capture(program: &str, args: &[&str]) -> Result<String, ExecutionError> {
    let command_line = display(program, args);
    log::trace!("Running '{}'", command_line);

    let output = StdCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| ExecutionError::CommandFailed(command_line.clone(), e))?;

    if !output.status.success() {
        return Err(ExecutionError::NonZeroExitStatus {
            command: command_line,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    String::from_utf8(output.stdout).map_err(|e| ExecutionError::InvalidUtf8Output {
        command: command_line,
        source: e,
    })
}

/// `true` when the program ran and exited successfully.
pub fn probe(program: &str, args: &[&str]) -> bool {
    StdCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

/// Runs a program attached to the user's terminal and waits for it.
pub fn run_interactive(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<(), ExecutionError> {
    let command_line = display(program, args);
    log::debug!("Running interactively: '{}'", command_line);

    let mut command = StdCommand::new(program);
    command
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    if let Some(dir) = cwd {
        command.current_dir(dunce::simplified(dir));
    }

    let status = command
        .status()
        .map_err(|e| ExecutionError::CommandFailed(command_line.clone(), e))?;
    if !status.success() {
        return Err(ExecutionError::NonZeroExitStatus {
            command: command_line,
            stderr: String::new(),
        });
    }
    Ok(())
}

/// Runs a program, feeding `input` on stdin and capturing stdout.
///
/// Standard error stays attached to the terminal, which is where interactive
/// filters such as fzf draw their interface.
pub fn run_with_input(program: &str, args: &[&str], input: &str) -> Result<String, ExecutionError> {
    let command_line = display(program, args);
    log::trace!("Running '{}' with {} bytes of input", command_line, input.len());

    let mut child = StdCommand::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|e| ExecutionError::CommandFailed(command_line.clone(), e))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .map_err(|e| ExecutionError::CommandFailed(command_line.clone(), e))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| ExecutionError::CommandFailed(command_line.clone(), e))?;
    if !output.status.success() {
        return Err(ExecutionError::NonZeroExitStatus {
            command: command_line,
            stderr: String::new(),
        });
    }

    String::from_utf8(output.stdout).map_err(|e| ExecutionError::InvalidUtf8Output {
        command: command_line,
        source: e,
    })
}

pub fn is_executable_in_path(executable_name: &str) -> bool {
    if let Ok(path_var) = env::var("PATH") {
        for path in env::split_paths(&path_var) {
            if path.join(executable_name).is_file() {
                return true;
            }
        }
    }
    false
}
