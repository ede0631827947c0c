//! Supported analog value ranges.

use serde::{Deserialize, Serialize};

/// Value range of an analog source. Each range has one bin table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataRange {
    /// 0 to 100
    Percent,
    /// 0 to 1
    ZeroToOne,
    /// 0 to 3
    ZeroToThree,
    /// 0 to 120, e.g. degrees F
    #[serde(rename = "zero_to_120")]
    ZeroTo120,
    /// 0 to 3000, e.g. fan speed or flow
    #[serde(rename = "zero_to_3k")]
    ZeroTo3k,
}

impl DataRange {
    pub const ALL: [DataRange; 5] = [
        DataRange::Percent,
        DataRange::ZeroToOne,
        DataRange::ZeroToThree,
        DataRange::ZeroTo120,
        DataRange::ZeroTo3k,
    ];

    pub fn min(&self) -> f64 {
        0.0
    }

    pub fn max(&self) -> f64 {
        match self {
            DataRange::Percent => 100.0,
            DataRange::ZeroToOne => 1.0,
            DataRange::ZeroToThree => 3.0,
            DataRange::ZeroTo120 => 120.0,
            DataRange::ZeroTo3k => 3000.0,
        }
    }

    /// Position in `ALL`
    pub(crate) fn ordinal(&self) -> usize {
        match self {
            DataRange::Percent => 0,
            DataRange::ZeroToOne => 1,
            DataRange::ZeroToThree => 2,
            DataRange::ZeroTo120 => 3,
            DataRange::ZeroTo3k => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DataRange::Percent => "percent",
            DataRange::ZeroToOne => "zero_to_one",
            DataRange::ZeroToThree => "zero_to_three",
            DataRange::ZeroTo120 => "zero_to_120",
            DataRange::ZeroTo3k => "zero_to_3k",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_match_all() {
        for (i, r) in DataRange::ALL.iter().enumerate() {
            assert_eq!(r.ordinal(), i);
        }
    }

    #[test]
    fn test_serde_names() {
        let r: DataRange = serde_json::from_str("\"zero_to_120\"").unwrap();
        assert_eq!(r, DataRange::ZeroTo120);
        assert_eq!(serde_json::to_string(&DataRange::Percent).unwrap(), "\"percent\"");
    }
}
