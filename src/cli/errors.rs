//! CLI-specific error types
//!
//! Every CLI error ends the command; `main` prints it and exits non-zero.

use std::fmt;
use std::io;

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file missing, malformed or out of range
    ConfigError,
    /// Reading input or writing output failed
    IoError,
    /// A reading line could not be understood
    InputError,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "AFDD_CLI_CONFIG_ERROR",
            Self::IoError => "AFDD_CLI_IO_ERROR",
            Self::InputError => "AFDD_CLI_INPUT_ERROR",
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Reading line `line` (1-based) was rejected.
    pub fn input_error(line: usize, msg: impl fmt::Display) -> Self {
        Self::new(CliErrorCode::InputError, format!("line {}: {}", line, msg))
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_code() {
        let e = CliError::input_error(4, "unknown point 'oat'");
        assert_eq!(e.code_str(), "AFDD_CLI_INPUT_ERROR");
        assert_eq!(e.to_string(), "AFDD_CLI_INPUT_ERROR: line 4: unknown point 'oat'");
    }

    #[test]
    fn test_config_error_converts() {
        let e: CliError = ConfigError::Invalid("secs_per_trigger must be > 0".into()).into();
        assert_eq!(e.code(), &CliErrorCode::ConfigError);
    }
}
