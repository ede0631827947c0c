//! Rainfall of an analog source: binned values, their validity, and rolling statistics.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::bins::{AnalogState, BinSpec, DataRange};
use crate::core::constants::{
    cycles_covering, ANALOG_BINS, DATALOG_MAX_CYCLES, DATALOG_MIN_SECS, SNAPSHOT_SIZE,
    STATISTICS_DEPTH_MAX,
};
use crate::core::{Cadence, ClockReading, CoreError, CoreResult, SnapshotSetId};

use super::histogram::Histogram;
use super::log::BindexLog;
use super::snapshot::SnapshotStore;
use super::stats::{recompute, BinCounts, SpanStats};

/// Value bindex logged before the first sample arrives.
pub const BACKFILL_VALUE_BINDEX: u8 = 127;

/// One captured analog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalogSample {
    pub value: u8,
    pub state: AnalogState,
}

#[derive(Debug, Clone)]
pub struct AnalogRainfall {
    spec: &'static BinSpec,
    cadence: Cadence,
    values: BindexLog<u8>,
    states: BindexLog<AnalogState>,
    spans: BTreeMap<usize, SpanStats>,
    scratch: BinCounts,
    snapshots: SnapshotStore<AnalogSample>,
    histogram: Histogram,
    x_now: f64,
    bindex_now: u8,
    state_now: AnalogState,
    first_cycle: bool,
    bin_over_under_seen: bool,
}

impl AnalogRainfall {
    pub fn new(range: DataRange, cadence: Cadence) -> Self {
        let spc = cadence.secs_per_cycle();
        let len = cycles_covering(DATALOG_MIN_SECS, spc).max(SNAPSHOT_SIZE);
        Self {
            spec: BinSpec::for_range(range),
            cadence,
            values: BindexLog::filled(len, BACKFILL_VALUE_BINDEX),
            states: BindexLog::filled(len, AnalogState::Unavailable),
            spans: BTreeMap::new(),
            scratch: BinCounts::default(),
            snapshots: SnapshotStore::new(),
            histogram: Histogram::new(ANALOG_BINS, cycles_covering(3600, spc)),
            x_now: f64::NAN,
            bindex_now: BACKFILL_VALUE_BINDEX,
            state_now: AnalogState::Unavailable,
            first_cycle: true,
            bin_over_under_seen: false,
        }
    }

    /// Log one sample and refresh every span in use.
    ///
    /// An invalid sample repeats the last valid value with an invalid state.
    pub fn push_cycle(&mut self, reading: &ClockReading, x: f64, valid_at_source: bool) {
        if valid_at_source {
            self.x_now = x;
        }
        let binned = self.spec.bindex(self.x_now);
        if binned.out_of_range && valid_at_source {
            self.bin_over_under_seen = true;
        }
        self.bindex_now = binned.bindex;
        self.state_now = if valid_at_source && !binned.out_of_range {
            AnalogState::Valid
        } else {
            AnalogState::Invalid
        };

        if self.first_cycle {
            self.values.fill(self.bindex_now);
            self.histogram.seed(self.bindex_now as usize);
            self.first_cycle = false;
        }

        let leaving = self
            .values
            .at(self.histogram.leaving_depth())
            .unwrap_or(self.bindex_now);
        self.histogram
            .cycle(reading.new_day, self.bindex_now as usize, leaving as usize);

        self.values.push(self.bindex_now);
        self.states.push(self.state_now);
        recompute(&self.values, &mut self.spans, self.spec, &mut self.scratch);
    }

    /// Register one more consumer of statistics over `span` cycles.
    pub fn add_statistics_user(&mut self, span: usize) -> CoreResult<()> {
        if span < 1 || span > STATISTICS_DEPTH_MAX {
            return Err(CoreError::StatisticBeyondDepthLimit {
                requested: span,
                max: STATISTICS_DEPTH_MAX,
            });
        }
        self.grow_logs_to(span);
        self.spans.entry(span).or_insert_with(SpanStats::unused).users += 1;
        if !self.first_cycle {
            recompute(&self.values, &mut self.spans, self.spec, &mut self.scratch);
        }
        Ok(())
    }

    /// Drop one consumer of `span`; the span stops being computed when none remain.
    pub fn remove_statistics_user(&mut self, span: usize) -> CoreResult<()> {
        let stats = self
            .spans
            .get_mut(&span)
            .ok_or_else(|| CoreError::key_not_valid(format!("no statistics over {} cycles", span)))?;
        stats.users -= 1;
        if stats.users == 0 {
            self.spans.remove(&span);
        }
        Ok(())
    }

    /// Move one consumer from `old` to `new`. On failure nothing changes.
    pub fn shift_statistics_span(&mut self, old: usize, new: usize) -> CoreResult<()> {
        if !self.spans.contains_key(&old) {
            return Err(CoreError::key_not_valid(format!("no statistics over {} cycles", old)));
        }
        if old == new {
            return Ok(());
        }
        self.add_statistics_user(new)?;
        self.remove_statistics_user(old)
    }

    /// No invalid sample among the newest `span` entries.
    ///
    /// Backfill entries logged before the first sample do not count as invalid.
    pub fn is_valid_over_cycles(&self, span: usize) -> bool {
        self.states.iter().take(span).all(|s| s != AnalogState::Invalid)
    }

    /// Grow the logs to cover at least `secs`. A request the logs already cover succeeds
    /// without change; only growth is held to the size bounds.
    pub fn resize_logging_to_at_least(&mut self, secs: i64) -> CoreResult<()> {
        let spc = self.cadence.secs_per_cycle();
        let cycles = cycles_covering(secs, spc);
        if cycles <= self.log_len() {
            return Ok(());
        }
        if cycles < SNAPSHOT_SIZE || cycles > DATALOG_MAX_CYCLES {
            return Err(CoreError::DataLoggingSizeNotWithinBounds {
                requested: secs,
                min: SNAPSHOT_SIZE as i64 * spc,
                max: DATALOG_MAX_CYCLES as i64 * spc,
            });
        }
        self.grow_logs_to(cycles);
        Ok(())
    }

    fn grow_logs_to(&mut self, cycles: usize) {
        let oldest = self.values.oldest().unwrap_or(BACKFILL_VALUE_BINDEX);
        self.values.grow_to(cycles, oldest);
        self.states.grow_to(cycles, AnalogState::Unavailable);
    }

    pub fn capture_snapshot(&mut self, id: SnapshotSetId) {
        let samples = self
            .values
            .iter()
            .zip(self.states.iter())
            .map(|(value, state)| AnalogSample { value, state });
        self.snapshots
            .capture(id, samples, self.cadence.triggers_per_cycle as usize);
    }

    pub fn destroy_snapshot(&mut self, id: SnapshotSetId) -> bool {
        self.snapshots.destroy(id)
    }

    pub fn is_snapshot_valid(&self, id: SnapshotSetId) -> bool {
        self.snapshots.contains(id)
    }

    /// Captured entries, newest first.
    pub fn snapshot(&self, id: SnapshotSetId) -> Option<&[AnalogSample]> {
        self.snapshots.get(id)
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    // ==================
    // Accessors
    // ==================

    /// Last value given while valid at source.
    pub fn now_x(&self) -> f64 {
        self.x_now
    }

    /// Label of the newest bindex.
    pub fn now_y(&self) -> f64 {
        self.spec.label(self.bindex_now)
    }

    pub fn old_y_at_depth(&self, depth: usize) -> Option<f64> {
        self.values.at(depth).map(|b| self.spec.label(b))
    }

    pub fn mean_to_depth(&self, span: usize) -> f64 {
        self.spans.get(&span).map_or(f64::NAN, |s| s.mean)
    }

    pub fn variance_to_depth(&self, span: usize) -> f64 {
        self.spans.get(&span).map_or(f64::NAN, |s| s.variance)
    }

    pub fn std_dev_to_depth(&self, span: usize) -> f64 {
        self.spans.get(&span).map_or(f64::NAN, |s| s.std_dev)
    }

    pub fn spans_in_use(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.spans.iter().map(|(&span, s)| (span, s.users))
    }

    pub fn bindex_now(&self) -> u8 {
        self.bindex_now
    }

    pub fn state_now(&self) -> AnalogState {
        self.state_now
    }

    pub fn center_label(&self) -> f64 {
        self.spec.center_label()
    }

    pub fn bin_width(&self) -> f64 {
        self.spec.width()
    }

    pub fn bin_spec(&self) -> &'static BinSpec {
        self.spec
    }

    pub fn bin_over_under_seen(&self) -> bool {
        self.bin_over_under_seen
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn log_len(&self) -> usize {
        self.values.len()
    }

    /// Values newest first.
    pub fn values(&self) -> impl Iterator<Item = u8> + '_ {
        self.values.iter()
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(n: u64) -> ClockReading {
        ClockReading::at(n as i64 * 60, n)
    }

    #[test]
    fn test_first_sample_backfills_values() {
        let mut rain = AnalogRainfall::new(DataRange::Percent, Cadence::default());
        rain.push_cycle(&tick(1), 50.0, true);
        let b = rain.bindex_now();
        assert!(rain.values().all(|v| v == b));
        assert_eq!(rain.log_len(), 60);
        assert_eq!(rain.histogram().moving_hour()[b as usize], 60);
    }

    #[test]
    fn test_invalid_sample_holds_value() {
        let mut rain = AnalogRainfall::new(DataRange::Percent, Cadence::default());
        rain.push_cycle(&tick(1), 40.0, true);
        rain.push_cycle(&tick(2), 90.0, false);
        assert_eq!(rain.now_x(), 40.0);
        assert_eq!(rain.state_now(), AnalogState::Invalid);
        assert!(!rain.is_valid_over_cycles(1));
    }

    #[test]
    fn test_out_of_range_is_sticky_and_invalid() {
        let mut rain = AnalogRainfall::new(DataRange::ZeroToOne, Cadence::default());
        rain.push_cycle(&tick(1), 2.0, true);
        assert_eq!(rain.state_now(), AnalogState::Invalid);
        rain.push_cycle(&tick(2), 0.5, true);
        assert_eq!(rain.state_now(), AnalogState::Valid);
        assert!(rain.bin_over_under_seen());
    }

    #[test]
    fn test_statistics_user_bounds_and_growth() {
        let mut rain = AnalogRainfall::new(DataRange::Percent, Cadence::default());
        assert!(matches!(
            rain.add_statistics_user(361),
            Err(CoreError::StatisticBeyondDepthLimit { .. })
        ));
        assert!(rain.add_statistics_user(0).is_err());
        rain.add_statistics_user(120).unwrap();
        assert_eq!(rain.log_len(), 120);
    }

    #[test]
    fn test_span_unused_reads_nan() {
        let mut rain = AnalogRainfall::new(DataRange::Percent, Cadence::default());
        rain.push_cycle(&tick(1), 10.0, true);
        assert!(rain.mean_to_depth(5).is_nan());
        assert!(rain.std_dev_to_depth(5).is_nan());
    }

    #[test]
    fn test_shared_span_reference_counts() {
        let mut rain = AnalogRainfall::new(DataRange::Percent, Cadence::default());
        rain.add_statistics_user(3).unwrap();
        rain.add_statistics_user(3).unwrap();
        rain.remove_statistics_user(3).unwrap();
        rain.push_cycle(&tick(1), 10.0, true);
        assert!(!rain.mean_to_depth(3).is_nan());
        rain.remove_statistics_user(3).unwrap();
        assert!(rain.mean_to_depth(3).is_nan());
        assert!(rain.remove_statistics_user(3).is_err());
    }

    #[test]
    fn test_shift_span_failure_leaves_old() {
        let mut rain = AnalogRainfall::new(DataRange::Percent, Cadence::default());
        rain.add_statistics_user(3).unwrap();
        assert!(rain.shift_statistics_span(3, 500).is_err());
        assert_eq!(rain.spans_in_use().collect::<Vec<_>>(), vec![(3, 1)]);
        rain.shift_statistics_span(3, 5).unwrap();
        assert_eq!(rain.spans_in_use().collect::<Vec<_>>(), vec![(5, 1)]);
    }

    #[test]
    fn test_slow_source_snapshot_pastes() {
        let mut rain = AnalogRainfall::new(DataRange::Percent, Cadence::new(3, 60));
        for n in 0..10 {
            rain.push_cycle(&tick(n), n as f64 * 10.0, true);
        }
        let id = SnapshotSetId::new(1);
        rain.capture_snapshot(id);
        let snap = rain.snapshot(id).unwrap();
        assert_eq!(snap[0], snap[1]);
        assert_eq!(snap[1], snap[2]);
        assert_ne!(snap[2], snap[3]);
    }

    #[test]
    fn test_snapshot_survives_live_log() {
        let mut rain = AnalogRainfall::new(DataRange::Percent, Cadence::default());
        for n in 0..20 {
            rain.push_cycle(&tick(n), n as f64, true);
        }
        let live: Vec<u8> = rain.values().take(SNAPSHOT_SIZE).collect();
        let id = SnapshotSetId::new(3);
        rain.capture_snapshot(id);
        for n in 20..40 {
            rain.push_cycle(&tick(n), 90.0 - n as f64, true);
        }
        let captured: Vec<u8> = rain.snapshot(id).unwrap().iter().map(|s| s.value).collect();
        assert_eq!(captured, live);
        assert!(rain.snapshot(id).unwrap().iter().all(|s| s.state == AnalogState::Valid));
    }

    #[test]
    fn test_log_length_never_shrinks() {
        let mut rain = AnalogRainfall::new(DataRange::Percent, Cadence::default());
        assert_eq!(rain.log_len(), 60);
        rain.resize_logging_to_at_least(7200).unwrap();
        assert_eq!(rain.log_len(), 120);
        rain.resize_logging_to_at_least(1800).unwrap();
        assert_eq!(rain.log_len(), 120);
        rain.resize_logging_to_at_least(60).unwrap();
        rain.resize_logging_to_at_least(0).unwrap();
        assert_eq!(rain.log_len(), 120);
        assert!(rain.resize_logging_to_at_least(1441 * 60).is_err());
        assert_eq!(rain.log_len(), 120);
    }
}
