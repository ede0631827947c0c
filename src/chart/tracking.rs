//! Tracking chart: CUSUM-like drift and hunt detection.

use serde::Serialize;

use crate::bins::DataRange;
use crate::core::{Cadence, CoreResult};
use crate::knob::{
    tracking_half_band, tracking_warn, KnobRange, TRACKING_APPS_BETWEEN_RESETS,
    TRACKING_LAG_FRAC, TRACKING_STALE_FRAC,
};
use crate::sequence::{Antecedents, NodeId};

/// What the observed value is tracked against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Guide {
    /// The observed value's own mean over its Shewhart window
    Autoregressive,
    /// Another analog source, optionally gated by its own Shewhart chart
    Data {
        source: NodeId,
        shewhart: Option<NodeId>,
    },
}

/// Tracker parameters. Units are those of the observed range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackingParams {
    pub half_band: f64,
    pub warn: f64,
    pub lag_frac: f64,
    pub stale_frac: f64,
    pub apps_between_resets: u32,
}

impl TrackingParams {
    pub fn for_range(range: DataRange) -> Self {
        Self {
            half_band: tracking_half_band(range).default,
            warn: tracking_warn(range).default,
            lag_frac: TRACKING_LAG_FRAC.default,
            stale_frac: TRACKING_STALE_FRAC.default,
            apps_between_resets: TRACKING_APPS_BETWEEN_RESETS.default as u32,
        }
    }
}

/// The two saturating registers and the signals read from them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tracker {
    params: TrackingParams,
    register_p: f64,
    register_n: f64,
    apps_since_reset: u32,
    rising: bool,
    falling: bool,
    hunting: bool,
}

impl Tracker {
    pub fn new(params: TrackingParams) -> Self {
        Self {
            params,
            register_p: 0.0,
            register_n: 0.0,
            apps_since_reset: 0,
            rising: false,
            falling: false,
            hunting: false,
        }
    }

    /// Accumulate one cycle of area beyond the band around `guide`.
    pub fn apply(&mut self, observed: f64, guide: f64, secs_per_cycle: i64) {
        let p = &self.params;

        self.apps_since_reset += 1;
        if self.apps_since_reset > p.apps_between_resets {
            self.register_p = 0.0;
            self.register_n = 0.0;
            self.apps_since_reset = 0;
        }

        let minutes = secs_per_cycle as f64 / 60.0;
        let area_past_top = (observed - (guide + p.half_band)) * minutes;
        let area_past_btm = (observed - (guide - p.half_band)) * minutes;

        let (fresh_p, stale_p) = if area_past_top > 0.0 {
            (area_past_top, 0.0)
        } else {
            (0.0, self.register_p * p.stale_frac)
        };
        let (fresh_n, stale_n) = if area_past_btm < 0.0 {
            (area_past_btm, 0.0)
        } else {
            (0.0, self.register_n * p.stale_frac)
        };

        self.register_p = (self.register_p + fresh_p - stale_p).min(p.warn).max(0.0);
        self.register_n = (self.register_n + fresh_n - stale_n).max(-p.warn).min(0.0);

        let p_full = self.register_p == p.warn;
        let n_full = self.register_n == -p.warn;
        self.rising = p_full && !(self.register_n < -p.lag_frac * p.warn);
        self.falling = n_full && !(self.register_p > p.lag_frac * p.warn);
        self.hunting = p_full && n_full;
    }

    pub fn params(&self) -> &TrackingParams {
        &self.params
    }

    pub fn register_p(&self) -> f64 {
        self.register_p
    }

    pub fn register_n(&self) -> f64 {
        self.register_n
    }

    pub fn is_rising(&self) -> bool {
        self.rising
    }

    pub fn is_falling(&self) -> bool {
        self.falling
    }

    pub fn is_hunting(&self) -> bool {
        self.hunting
    }
}

/// Tracking chart over an analog source and its Shewhart chart.
///
/// Holds its outputs while invalid and freezes while any associated
/// Shewhart chart is unsteady.
#[derive(Debug, Clone, Serialize)]
pub struct TrackingChart {
    observed: NodeId,
    observed_shewhart: NodeId,
    guide: Guide,
    range: DataRange,
    cadence: Cadence,
    tracker: Tracker,
    valid: bool,
    tracker_on: bool,
    x_observed: f64,
    x_guide: f64,
}

impl TrackingChart {
    pub(crate) fn new(
        observed: NodeId,
        observed_shewhart: NodeId,
        guide: Guide,
        range: DataRange,
    ) -> Self {
        Self {
            observed,
            observed_shewhart,
            guide,
            range,
            cadence: Cadence::default(),
            tracker: Tracker::new(TrackingParams::for_range(range)),
            valid: false,
            tracker_on: false,
            x_observed: f64::NAN,
            x_guide: f64::NAN,
        }
    }

    pub(crate) fn bind(&mut self, cadence: Cadence) {
        self.cadence = cadence;
    }

    pub(crate) fn inputs(&self) -> Vec<NodeId> {
        let mut ids = vec![self.observed, self.observed_shewhart];
        if let Guide::Data { source, shewhart } = self.guide {
            ids.push(source);
            ids.extend(shewhart);
        }
        ids
    }

    pub(crate) fn cycle(&mut self, nodes: Antecedents<'_>) {
        let observed_shewhart = nodes.shewhart(self.observed_shewhart);
        let guide_shewhart = match self.guide {
            Guide::Data { shewhart: Some(id), .. } => Some(nodes.shewhart(id)),
            _ => None,
        };

        self.valid = observed_shewhart.is_valid() && guide_shewhart.map_or(true, |s| s.is_valid());
        if let Guide::Data { source, .. } = self.guide {
            self.valid &= nodes.node(source).is_valid();
        }
        if !self.valid {
            return;
        }

        self.tracker_on =
            observed_shewhart.is_steady() && guide_shewhart.map_or(true, |s| s.is_steady());
        if !self.tracker_on {
            return;
        }

        let rain = nodes.analog(self.observed);
        self.x_observed = rain.now_y();
        self.x_guide = match self.guide {
            Guide::Autoregressive => rain.mean_to_depth(observed_shewhart.window()),
            Guide::Data { source, .. } => nodes.analog(source).now_y(),
        };
        self.tracker
            .apply(self.x_observed, self.x_guide, self.cadence.secs_per_cycle());
    }

    pub fn set_half_band(&mut self, v: f64) -> CoreResult<()> {
        self.tracker.params.half_band = tracking_half_band(self.range).vet(v)?;
        Ok(())
    }

    pub fn set_warn(&mut self, v: f64) -> CoreResult<()> {
        self.tracker.params.warn = tracking_warn(self.range).vet(v)?;
        Ok(())
    }

    pub fn set_lag_frac(&mut self, v: f64) -> CoreResult<()> {
        self.tracker.params.lag_frac = TRACKING_LAG_FRAC.vet(v)?;
        Ok(())
    }

    pub fn set_stale_frac(&mut self, v: f64) -> CoreResult<()> {
        self.tracker.params.stale_frac = TRACKING_STALE_FRAC.vet(v)?;
        Ok(())
    }

    pub fn set_apps_between_resets(&mut self, v: u32) -> CoreResult<()> {
        TRACKING_APPS_BETWEEN_RESETS.vet(v as f64)?;
        self.tracker.params.apps_between_resets = v;
        Ok(())
    }

    pub fn half_band_range(&self) -> KnobRange {
        tracking_half_band(self.range)
    }

    pub fn warn_range(&self) -> KnobRange {
        tracking_warn(self.range)
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    pub fn guide(&self) -> Guide {
        self.guide
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// False while frozen by an unsteady Shewhart chart.
    pub fn is_tracking(&self) -> bool {
        self.tracker_on
    }

    pub fn is_rising(&self) -> bool {
        self.tracker.is_rising()
    }

    pub fn is_falling(&self) -> bool {
        self.tracker.is_falling()
    }

    pub fn is_hunting(&self) -> bool {
        self.tracker.is_hunting()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TrackingParams {
        TrackingParams {
            half_band: 0.5,
            warn: 5.0,
            lag_frac: 0.5,
            stale_frac: 0.5,
            apps_between_resets: 100,
        }
    }

    #[test]
    fn test_rising_after_sustained_excursion() {
        let mut t = Tracker::new(params());
        // 2.5 degF-minutes past the top edge per cycle
        t.apply(73.0, 70.0, 60);
        assert_eq!(t.register_p(), 2.5);
        assert!(!t.is_rising());
        t.apply(73.0, 70.0, 60);
        assert_eq!(t.register_p(), 5.0);
        assert!(t.is_rising());
        assert!(!t.is_falling());
        assert!(!t.is_hunting());
    }

    #[test]
    fn test_inside_band_stales_off() {
        let mut t = Tracker::new(params());
        t.apply(73.0, 70.0, 60);
        t.apply(70.0, 70.0, 60);
        assert_eq!(t.register_p(), 1.25);
        assert_eq!(t.register_n(), 0.0);
    }

    #[test]
    fn test_lagging_register_blocks_falling() {
        let mut t = Tracker::new(TrackingParams { stale_frac: 0.2, ..params() });
        t.apply(80.0, 70.0, 60);
        assert!(t.is_rising());
        t.apply(60.0, 70.0, 60);
        assert_eq!(t.register_n(), -5.0);
        // P only stales by a fifth, still above lag_frac * warn
        assert!(t.register_p() > 2.5);
        assert!(!t.is_falling());
        assert!(!t.is_hunting());
    }

    #[test]
    fn test_hunting_when_both_saturate() {
        let mut t = Tracker::new(TrackingParams { warn: 0.0, ..params() });
        t.apply(70.0, 70.0, 60);
        assert!(t.is_hunting());
    }

    #[test]
    fn test_registers_reset_after_apps_between_resets() {
        let mut t = Tracker::new(TrackingParams { apps_between_resets: 1, ..params() });
        t.apply(73.0, 70.0, 60);
        assert_eq!(t.register_p(), 2.5);
        // second application exceeds the reset count and starts from zero
        t.apply(73.0, 70.0, 60);
        assert_eq!(t.register_p(), 2.5);
        t.apply(73.0, 70.0, 60);
        assert_eq!(t.register_p(), 5.0);
    }

    #[test]
    fn test_registers_never_exceed_warn() {
        let mut t = Tracker::new(params());
        for i in 0..200 {
            let x = if i % 3 == 0 { 120.0 } else { 0.0 };
            t.apply(x, 60.0, 300);
            assert!(t.register_p() <= 5.0 && t.register_p() >= 0.0);
            assert!(t.register_n() >= -5.0 && t.register_n() <= 0.0);
        }
    }

    #[test]
    fn test_params_default_per_range() {
        let p = TrackingParams::for_range(DataRange::ZeroToOne);
        assert_eq!(p.half_band, 0.02);
        assert_eq!(p.warn, 1.0);
    }
}
