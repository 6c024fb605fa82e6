//! CLI module for enrollcheck
//!
//! Provides command-line interface for:
//! - check: Load three JSON datasets and run validation checks
//! - schema: Print the declared collection schemas

mod args;
mod commands;
mod errors;
mod io;

pub use args::{CheckArg, Cli, Command};
pub use commands::{check_command, run, run_command, schema, CheckRequest};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_rows, read_rows, write_error, write_response};
