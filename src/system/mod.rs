//! # System Interaction Layer
//!
//! The boundary between the launcher and the operating system's processes.
//!
//! ## Modules
//!
//! - **`executor`**: spawns external programs (tmux, fzf, bat) and captures their output,
//!   folding stderr into errors when they fail.
//! - **`shell`**: hands the terminal over to the user's `$SHELL` in a target's directory,
//!   either replacing the launcher process or waiting for the shell to exit.

pub mod executor;
pub mod shell;
