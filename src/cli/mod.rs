//! CLI module for the analytics core
//!
//! Provides command-line interface for:
//! - check: Validate a config and print the wired sequence
//! - replay: Drive the sequence from a file of timestamped readings

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, LogLevel};
pub use commands::{check, replay, replay_from, run, run_command, wire, Monitor, MonitoredPoint};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_lines, write_error, write_response};
