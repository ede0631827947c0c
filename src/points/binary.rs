//! Binary data channel.

/// On/off status arriving as a number. No rainfall of its own; a fact logs it.
#[derive(Debug, Clone, Default)]
pub struct BinaryPoint {
    posted: f64,
    valid: bool,
    claim: bool,
}

impl BinaryPoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post(&mut self, raw: f64) {
        self.posted = raw;
    }

    /// Anything at or above 2 (or not a number) is not a binary status.
    pub(crate) fn cycle(&mut self) {
        self.valid = self.posted.is_finite() && self.posted.floor() < 1.1;
        self.claim = self.posted > 0.5;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn claim(&self) -> bool {
        self.claim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        let mut p = BinaryPoint::new();
        p.post(0.9);
        p.cycle();
        assert!(p.is_valid() && p.claim());
        p.post(0.2);
        p.cycle();
        assert!(p.is_valid() && !p.claim());
        p.post(2.0);
        p.cycle();
        assert!(!p.is_valid());
    }
}
