//! Tunable parameters.
//!
//! Every setter input is vetted against a `KnobRange` and either accepted or
//! rejected with `ValueOutOfRange`. Nothing is clamped or coerced.

use serde::Serialize;

use crate::bins::DataRange;
use crate::core::{CoreError, CoreResult};
use crate::rule::RuleId;

/// Inclusive range and default of one knob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KnobRange {
    pub min: f64,
    pub default: f64,
    pub max: f64,
}

impl KnobRange {
    pub const fn new(min: f64, default: f64, max: f64) -> Self {
        Self { min, default, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// `Ok(value)` inside the range, `ValueOutOfRange` otherwise (NaN included).
    pub fn vet(&self, value: f64) -> CoreResult<f64> {
        if self.contains(value) {
            Ok(value)
        } else {
            Err(CoreError::ValueOutOfRange {
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

pub const SHEWHART_Z_PASS: KnobRange = KnobRange::new(0.0, 3.0, 5.0);
pub const SHEWHART_TRIP_FREE_MARGIN: KnobRange = KnobRange::new(0.0, 3.0, 5.0);
pub const TRACKING_APPS_BETWEEN_RESETS: KnobRange = KnobRange::new(0.0, 5.0, 10.0);
pub const TRACKING_LAG_FRAC: KnobRange = KnobRange::new(0.2, 0.5, 1.0);
pub const TRACKING_STALE_FRAC: KnobRange = KnobRange::new(0.2, 0.5, 1.0);
pub const SUSTAINED_MIN_CYCLES: KnobRange = KnobRange::new(1.0, 3.0, 60.0);

/// Half-width of the tracking chart's non-counting band, in units of the range.
pub fn tracking_half_band(range: DataRange) -> KnobRange {
    match range {
        DataRange::ZeroTo120 => KnobRange::new(0.5, 0.5, 3.0),
        DataRange::ZeroToOne => KnobRange::new(0.01, 0.02, 0.03),
        DataRange::Percent => KnobRange::new(1.0, 2.0, 3.0),
        DataRange::ZeroToThree => KnobRange::new(0.1, 0.3, 0.6),
        DataRange::ZeroTo3k => KnobRange::new(10.0, 50.0, 90.0),
    }
}

/// Saturation level of the tracking registers, in units-of-range minutes.
pub fn tracking_warn(range: DataRange) -> KnobRange {
    match range {
        DataRange::ZeroTo120 => KnobRange::new(0.0, 5.0, 30.0),
        DataRange::ZeroToOne => KnobRange::new(0.0, 1.0, 5.0),
        DataRange::Percent => KnobRange::new(0.0, 100.0, 500.0),
        DataRange::ZeroToThree => KnobRange::new(0.0, 1.0, 5.0),
        DataRange::ZeroTo3k => KnobRange::new(0.0, 300.0, 1000.0),
    }
}

/// A setter request addressed to one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KnobSetting {
    ShewhartZPass(f64),
    ShewhartTripFreeMargin(u32),
    /// Span of the observed rainfall the chart takes statistics over
    ShewhartWindowSecs(i64),
    TrackingHalfBand(f64),
    TrackingWarn(f64),
    TrackingLagFrac(f64),
    TrackingStaleFrac(f64),
    TrackingAppsBetweenResets(u32),
    SustainedMinCycles(u32),
    RuleKitTrapSecs(i64),
    RuleKitIdleAll(bool),
    RuleIdle { rule: RuleId, idle: bool },
}

impl KnobSetting {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnobSetting::ShewhartZPass(_) => "shewhart_z_pass",
            KnobSetting::ShewhartTripFreeMargin(_) => "shewhart_trip_free_margin",
            KnobSetting::ShewhartWindowSecs(_) => "shewhart_window_secs",
            KnobSetting::TrackingHalfBand(_) => "tracking_half_band",
            KnobSetting::TrackingWarn(_) => "tracking_warn",
            KnobSetting::TrackingLagFrac(_) => "tracking_lag_frac",
            KnobSetting::TrackingStaleFrac(_) => "tracking_stale_frac",
            KnobSetting::TrackingAppsBetweenResets(_) => "tracking_apps_between_resets",
            KnobSetting::SustainedMinCycles(_) => "sustained_min_cycles",
            KnobSetting::RuleKitTrapSecs(_) => "rule_kit_trap_secs",
            KnobSetting::RuleKitIdleAll(_) => "rule_kit_idle_all",
            KnobSetting::RuleIdle { .. } => "rule_idle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vet_accepts_bounds() {
        assert_eq!(SHEWHART_Z_PASS.vet(0.0), Ok(0.0));
        assert_eq!(SHEWHART_Z_PASS.vet(5.0), Ok(5.0));
    }

    #[test]
    fn test_vet_rejects_without_clamping() {
        let err = SHEWHART_Z_PASS.vet(5.5).unwrap_err();
        assert_eq!(
            err,
            CoreError::ValueOutOfRange { value: 5.5, min: 0.0, max: 5.0 }
        );
        assert!(TRACKING_LAG_FRAC.vet(f64::NAN).is_err());
    }

    #[test]
    fn test_defaults_inside_ranges() {
        for r in DataRange::ALL {
            let hb = tracking_half_band(r);
            assert!(hb.contains(hb.default));
            let w = tracking_warn(r);
            assert!(w.contains(w.default));
        }
        for k in [
            SHEWHART_Z_PASS,
            SHEWHART_TRIP_FREE_MARGIN,
            TRACKING_APPS_BETWEEN_RESETS,
            TRACKING_LAG_FRAC,
            TRACKING_STALE_FRAC,
            SUSTAINED_MIN_CYCLES,
        ] {
            assert!(k.contains(k.default));
        }
    }
}
