//! Line-oriented operator shell over [`crate::core::LedgerManager`].

pub mod commands;
pub mod core;
mod help;
pub mod output;
mod shell;

pub use self::core::{CliError, CliMode, CommandError, ShellContext};
pub use shell::run_cli;
