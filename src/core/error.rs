//! Core Error Types
//!
//! Runtime conditions a caller can recover from. Wiring defects panic instead.

use thiserror::Error;

/// Core module result type. `Ok(())` is the "all done" reply.
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Requested statistics span is deeper than any rainfall can hold
    #[error("Statistic span of {requested} cycles is outside 1..={max}")]
    StatisticBeyondDepthLimit { requested: usize, max: usize },

    /// Requested data log size is outside the fixed bounds
    #[error("Data logging size of {requested} is outside {min}..={max}")]
    DataLoggingSizeNotWithinBounds { requested: i64, min: i64, max: i64 },

    /// Setter input outside the knob's range
    #[error("Value {value} is outside {min}..={max}")]
    ValueOutOfRange { value: f64, min: f64, max: f64 },

    /// Trap span outside one snapshot window up to the deepest rainfall span
    #[error("Trap span of {requested} cycles is outside {min}..={max}")]
    TrapSpanOutOfBounds { requested: usize, min: usize, max: usize },

    /// Clock reading repeats the previous timestamp
    #[error("Timestamp {0} is the same as the previous reading")]
    TimestampSameAsPrevious(i64),

    /// Key does not name anything that accepts the request
    #[error("Key not valid: {0}")]
    KeyNotValid(String),
}

impl CoreError {
    /// Create a key-not-valid error
    pub fn key_not_valid(msg: impl Into<String>) -> Self {
        Self::KeyNotValid(msg.into())
    }

    /// Get error code for replies
    pub fn code(&self) -> &'static str {
        match self {
            Self::StatisticBeyondDepthLimit { .. } => "AFDD_FAIL_STATISTIC_BEYOND_DEPTH_LIMIT",
            Self::DataLoggingSizeNotWithinBounds { .. } => "AFDD_FAIL_DATALOG_SIZE_NOT_WITHIN_BOUNDS",
            Self::ValueOutOfRange { .. } => "AFDD_FAIL_VALUE_OUT_OF_RANGE",
            Self::TrapSpanOutOfBounds { .. } => "AFDD_FAIL_TRAP_SPAN_OUT_OF_BOUNDS",
            Self::TimestampSameAsPrevious(_) => "AFDD_FAIL_TIMESTAMP_SAME_AS_PREVIOUS",
            Self::KeyNotValid(_) => "AFDD_FAIL_KEY_NOT_VALID",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_prefixed() {
        let errors = [
            CoreError::StatisticBeyondDepthLimit { requested: 400, max: 360 },
            CoreError::ValueOutOfRange { value: 9.0, min: 0.0, max: 5.0 },
            CoreError::TimestampSameAsPrevious(10),
            CoreError::key_not_valid("zPass on a fact"),
        ];
        for e in errors {
            assert!(e.code().starts_with("AFDD_FAIL_"));
        }
    }

    #[test]
    fn test_display_names_bounds() {
        let e = CoreError::TrapSpanOutOfBounds { requested: 3, min: 15, max: 360 };
        assert_eq!(e.to_string(), "Trap span of 3 cycles is outside 15..=360");
    }
}
