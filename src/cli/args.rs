//! CLI argument definitions using clap
//!
//! Commands:
//! - afdd check --config <path>
//! - afdd replay --config <path> --input <path>
//!
//! `--log-level` applies to every command.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::observability::Severity;

/// afdd - fault detection over sampled building-automation points
#[derive(Parser, Debug)]
#[command(name = "afdd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Drop log lines below this severity
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Trace)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Info,
    Warn,
    Error,
    Fatal,
}

impl From<LogLevel> for Severity {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Severity::Trace,
            LogLevel::Info => Severity::Info,
            LogLevel::Warn => Severity::Warn,
            LogLevel::Error => Severity::Error,
            LogLevel::Fatal => Severity::Fatal,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a config and print the wired nodes
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./afdd.json")]
        config: PathBuf,
    },

    /// Replay a JSON-lines file of readings through the wired monitor
    Replay {
        /// Path to configuration file
        #[arg(long, default_value = "./afdd.json")]
        config: PathBuf,

        /// Readings, one JSON object per line
        #[arg(long)]
        input: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_requires_input() {
        assert!(Cli::try_parse_from(["afdd", "replay"]).is_err());
        let cli = Cli::try_parse_from(["afdd", "replay", "--input", "r.jsonl"]).unwrap();
        match cli.command {
            Command::Replay { config, input } => {
                assert_eq!(config, PathBuf::from("./afdd.json"));
                assert_eq!(input, PathBuf::from("r.jsonl"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_log_level_flag() {
        let cli = Cli::try_parse_from(["afdd", "check"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Trace);
        let cli = Cli::try_parse_from(["afdd", "replay", "--input", "r.jsonl", "--log-level", "warn"]).unwrap();
        assert_eq!(Severity::from(cli.log_level), Severity::Warn);
        assert!(Cli::try_parse_from(["afdd", "check", "--log-level", "loud"]).is_err());
    }
}
