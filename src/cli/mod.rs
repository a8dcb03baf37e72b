//! Command-line interface for coffer

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::run_command;
pub use errors::{CliError, CliErrorCode, CliResult};
