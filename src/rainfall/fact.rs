//! Rainfall of a boolean claim.

use crate::bins::FactBin;
use crate::core::constants::{cycles_covering, DATALOG_MAX_CYCLES, DATALOG_MIN_SECS, SNAPSHOT_SIZE};
use crate::core::{Cadence, ClockReading, CoreError, CoreResult, SnapshotSetId};

use super::histogram::Histogram;
use super::log::BindexLog;
use super::snapshot::SnapshotStore;

#[derive(Debug, Clone)]
pub struct FactRainfall {
    cadence: Cadence,
    states: BindexLog<FactBin>,
    snapshots: SnapshotStore<FactBin>,
    histogram: Histogram,
    bindex_now: FactBin,
}

impl FactRainfall {
    pub fn new(cadence: Cadence) -> Self {
        let spc = cadence.secs_per_cycle();
        let len = cycles_covering(DATALOG_MIN_SECS, spc).max(SNAPSHOT_SIZE);
        let mut histogram = Histogram::new(FactBin::BINS, cycles_covering(3600, spc));
        histogram.seed(FactBin::Unavailable.index());
        Self {
            cadence,
            states: BindexLog::filled(len, FactBin::Unavailable),
            snapshots: SnapshotStore::new(),
            histogram,
            bindex_now: FactBin::Unavailable,
        }
    }

    pub fn push_cycle(&mut self, reading: &ClockReading, claim: bool, valid_at_source: bool) {
        self.bindex_now = FactBin::from_claim(claim, valid_at_source);

        let leaving = self
            .states
            .at(self.histogram.leaving_depth())
            .unwrap_or(FactBin::Unavailable);
        self.histogram
            .cycle(reading.new_day, self.bindex_now.index(), leaving.index());
        self.states.push(self.bindex_now);
    }

    pub fn bindex_now(&self) -> FactBin {
        self.bindex_now
    }

    /// State logged `lag` cycles ago; `Unavailable` beyond the log.
    pub fn bindex_was_at_cycles(&self, lag: usize) -> FactBin {
        self.states.at(lag).unwrap_or(FactBin::Unavailable)
    }

    pub fn resize_logging_to_at_least(&mut self, secs: i64) -> CoreResult<()> {
        let spc = self.cadence.secs_per_cycle();
        let cycles = cycles_covering(secs, spc);
        if cycles <= self.states.len() {
            return Ok(());
        }
        if cycles < SNAPSHOT_SIZE || cycles > DATALOG_MAX_CYCLES {
            return Err(CoreError::DataLoggingSizeNotWithinBounds {
                requested: secs,
                min: SNAPSHOT_SIZE as i64 * spc,
                max: DATALOG_MAX_CYCLES as i64 * spc,
            });
        }
        self.states.grow_to(cycles, FactBin::Unavailable);
        Ok(())
    }

    pub fn capture_snapshot(&mut self, id: SnapshotSetId) {
        self.snapshots.capture(
            id,
            self.states.iter(),
            self.cadence.triggers_per_cycle as usize,
        );
    }

    pub fn destroy_snapshot(&mut self, id: SnapshotSetId) -> bool {
        self.snapshots.destroy(id)
    }

    pub fn is_snapshot_valid(&self, id: SnapshotSetId) -> bool {
        self.snapshots.contains(id)
    }

    pub fn snapshot(&self, id: SnapshotSetId) -> Option<&[FactBin]> {
        self.snapshots.get(id)
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn log_len(&self) -> usize {
        self.states.len()
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backfilled_unavailable() {
        let rain = FactRainfall::new(Cadence::default());
        assert_eq!(rain.bindex_was_at_cycles(0), FactBin::Unavailable);
        assert_eq!(rain.bindex_was_at_cycles(59), FactBin::Unavailable);
        assert_eq!(rain.bindex_was_at_cycles(60), FactBin::Unavailable);
    }

    #[test]
    fn test_claims_logged_with_lag() {
        let mut rain = FactRainfall::new(Cadence::default());
        let r = ClockReading::at(60, 1);
        rain.push_cycle(&r, true, true);
        rain.push_cycle(&r, false, true);
        rain.push_cycle(&r, true, false);
        assert_eq!(rain.bindex_was_at_cycles(0), FactBin::Invalid);
        assert_eq!(rain.bindex_was_at_cycles(1), FactBin::False);
        assert_eq!(rain.bindex_was_at_cycles(2), FactBin::True);
    }

    #[test]
    fn test_resize_bounds() {
        let mut rain = FactRainfall::new(Cadence::default());
        assert!(rain.resize_logging_to_at_least(60).is_ok());
        assert!(rain.resize_logging_to_at_least(1441 * 60).is_err());
        assert_eq!(rain.log_len(), 60);
        rain.resize_logging_to_at_least(7200).unwrap();
        assert_eq!(rain.log_len(), 120);
    }
}
