//! Closed state enumerations logged by rainfalls.

use serde::Serialize;

/// Validity of one logged analog sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum AnalogState {
    Invalid = 0,
    Valid = 1,
    /// Backfill before the first sample
    Unavailable = 2,
}

impl AnalogState {
    pub const BINS: usize = 3;

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// One logged fact claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum FactBin {
    False = 0,
    True = 1,
    Invalid = 2,
    /// Backfill before the first claim
    Unavailable = 3,
}

impl FactBin {
    pub const BINS: usize = 4;

    pub fn from_claim(claim: bool, valid: bool) -> Self {
        match (valid, claim) {
            (false, _) => FactBin::Invalid,
            (true, true) => FactBin::True,
            (true, false) => FactBin::False,
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// One logged rule result, by mode.
///
/// Auto results start at 0, case results at 4, idle results at 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum RuleBin {
    AutoFail = 0,
    AutoPass = 1,
    AutoSkip = 2,
    Invalid = 3,
    CaseFail = 4,
    CasePass = 5,
    CaseSkip = 6,
    IdleFail = 7,
    IdlePass = 8,
    IdleSkip = 9,
    Unavailable = 10,
}

impl RuleBin {
    pub const BINS: usize = 11;

    const ALL: [RuleBin; 11] = [
        RuleBin::AutoFail,
        RuleBin::AutoPass,
        RuleBin::AutoSkip,
        RuleBin::Invalid,
        RuleBin::CaseFail,
        RuleBin::CasePass,
        RuleBin::CaseSkip,
        RuleBin::IdleFail,
        RuleBin::IdlePass,
        RuleBin::IdleSkip,
        RuleBin::Unavailable,
    ];

    pub fn from_index(i: u8) -> Option<Self> {
        Self::ALL.get(i as usize).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn is_failed_in_any_mode(&self) -> bool {
        matches!(self, RuleBin::AutoFail | RuleBin::CaseFail | RuleBin::IdleFail)
    }

    pub fn is_auto_fail(&self) -> bool {
        *self == RuleBin::AutoFail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fact_bin_from_claim() {
        assert_eq!(FactBin::from_claim(true, true), FactBin::True);
        assert_eq!(FactBin::from_claim(false, true), FactBin::False);
        assert_eq!(FactBin::from_claim(true, false), FactBin::Invalid);
    }

    #[test]
    fn test_rule_bin_indices() {
        for i in 0..RuleBin::BINS as u8 {
            assert_eq!(RuleBin::from_index(i).unwrap().index(), i as usize);
        }
        assert!(RuleBin::from_index(11).is_none());
    }

    #[test]
    fn test_failed_in_any_mode() {
        let failed: Vec<_> = (0..11u8)
            .filter_map(RuleBin::from_index)
            .filter(|b| b.is_failed_in_any_mode())
            .map(|b| b.index())
            .collect();
        assert_eq!(failed, vec![0, 4, 7]);
    }
}
