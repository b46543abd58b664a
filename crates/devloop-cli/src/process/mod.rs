//! Running and restarting the watched command.
//!
//! - [`CommandSpec`] resolves what the user typed into a program and arguments
//! - [`Supervisor`] owns the live child and its process group

mod command;
mod supervisor;

pub use command::{is_shell_syntax, CommandSpec};
pub use supervisor::{LaunchOptions, Supervisor, SupervisorState};
