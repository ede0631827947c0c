//! Rule-indexed rainfall held by a rule kit: one result log per rule.

use crate::bins::RuleBin;
use crate::core::constants::{cycles_covering, DATALOG_MAX_CYCLES, DATALOG_MIN_SECS, SNAPSHOT_SIZE};
use crate::core::{Cadence, ClockReading, CoreError, CoreResult, SnapshotSetId};

use super::histogram::Histogram;
use super::log::BindexLog;
use super::snapshot::SnapshotStore;

#[derive(Debug, Clone)]
pub struct RuleKitRainfall {
    cadence: Cadence,
    len: usize,
    logs: Vec<BindexLog<RuleBin>>,
    histograms: Vec<Histogram>,
    snapshots: Vec<SnapshotStore<RuleBin>>,
}

impl RuleKitRainfall {
    pub fn new(cadence: Cadence) -> Self {
        let len = cycles_covering(DATALOG_MIN_SECS, cadence.secs_per_cycle()).max(SNAPSHOT_SIZE);
        Self {
            cadence,
            len,
            logs: Vec::new(),
            histograms: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    /// Open a log column for one more rule; returns its column.
    pub fn add_rule(&mut self) -> usize {
        let mut histogram = Histogram::new(RuleBin::BINS, cycles_covering(3600, self.cadence.secs_per_cycle()));
        histogram.seed(RuleBin::Unavailable.index());
        self.logs.push(BindexLog::filled(self.len, RuleBin::Unavailable));
        self.histograms.push(histogram);
        self.snapshots.push(SnapshotStore::new());
        self.logs.len() - 1
    }

    pub fn rule_count(&self) -> usize {
        self.logs.len()
    }

    /// Log one result per rule, in column order.
    pub fn push_results(&mut self, reading: &ClockReading, results: &[RuleBin]) {
        for ((log, histogram), result) in self
            .logs
            .iter_mut()
            .zip(self.histograms.iter_mut())
            .zip(results.iter())
        {
            let leaving = log
                .at(histogram.leaving_depth())
                .unwrap_or(RuleBin::Unavailable);
            histogram.cycle(reading.new_day, result.index(), leaving.index());
            log.push(*result);
        }
    }

    /// Rows are cycles (newest first) over `span`, columns are rules;
    /// `true` where that rule reported an auto-mode fail.
    pub fn auto_fail_matrix(&self, span: usize) -> Vec<Vec<bool>> {
        (0..span.min(self.len))
            .map(|depth| {
                self.logs
                    .iter()
                    .map(|log| log.at(depth).map_or(false, |b| b.is_auto_fail()))
                    .collect()
            })
            .collect()
    }

    pub fn newest(&self, column: usize) -> RuleBin {
        self.logs
            .get(column)
            .and_then(|l| l.newest())
            .unwrap_or(RuleBin::Unavailable)
    }

    pub fn bindex_was_at_cycles(&self, column: usize, lag: usize) -> RuleBin {
        self.logs
            .get(column)
            .and_then(|l| l.at(lag))
            .unwrap_or(RuleBin::Unavailable)
    }

    pub fn resize_logging_to_at_least(&mut self, secs: i64) -> CoreResult<()> {
        let spc = self.cadence.secs_per_cycle();
        let cycles = cycles_covering(secs, spc);
        if cycles <= self.len {
            return Ok(());
        }
        if cycles < SNAPSHOT_SIZE || cycles > DATALOG_MAX_CYCLES {
            return Err(CoreError::DataLoggingSizeNotWithinBounds {
                requested: secs,
                min: SNAPSHOT_SIZE as i64 * spc,
                max: DATALOG_MAX_CYCLES as i64 * spc,
            });
        }
        self.grow_to(cycles);
        Ok(())
    }

    pub(crate) fn grow_to(&mut self, cycles: usize) {
        if cycles <= self.len {
            return;
        }
        self.len = cycles;
        for log in self.logs.iter_mut() {
            log.grow_to(cycles, RuleBin::Unavailable);
        }
    }

    pub fn log_len(&self) -> usize {
        self.len
    }

    pub fn capture_rule_snapshot(&mut self, column: usize, id: SnapshotSetId) {
        let pastes = self.cadence.triggers_per_cycle as usize;
        if let (Some(log), Some(store)) = (self.logs.get(column), self.snapshots.get_mut(column)) {
            store.capture(id, log.iter(), pastes);
        }
    }

    pub fn destroy_rule_snapshot(&mut self, column: usize, id: SnapshotSetId) -> bool {
        self.snapshots
            .get_mut(column)
            .map_or(false, |store| store.destroy(id))
    }

    pub fn rule_snapshot(&self, column: usize, id: SnapshotSetId) -> Option<&[RuleBin]> {
        self.snapshots.get(column).and_then(|s| s.get(id))
    }

    pub fn histogram(&self, column: usize) -> Option<&Histogram> {
        self.histograms.get(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_marks_auto_fails_only() {
        let mut rain = RuleKitRainfall::new(Cadence::default());
        rain.add_rule();
        rain.add_rule();
        let r = ClockReading::at(60, 1);
        rain.push_results(&r, &[RuleBin::AutoFail, RuleBin::IdleFail]);
        rain.push_results(&r, &[RuleBin::AutoPass, RuleBin::AutoFail]);

        let m = rain.auto_fail_matrix(3);
        assert_eq!(m.len(), 3);
        assert_eq!(m[0], vec![false, true]);
        assert_eq!(m[1], vec![true, false]);
        assert_eq!(m[2], vec![false, false]);
    }

    #[test]
    fn test_new_rule_log_matches_kit_length() {
        let mut rain = RuleKitRainfall::new(Cadence::default());
        rain.grow_to(200);
        let col = rain.add_rule();
        assert_eq!(rain.bindex_was_at_cycles(col, 199), RuleBin::Unavailable);
        assert_eq!(rain.log_len(), 200);
    }

    #[test]
    fn test_resize_within_length_is_noop() {
        let mut rain = RuleKitRainfall::new(Cadence::default());
        rain.add_rule();
        assert!(rain.resize_logging_to_at_least(60).is_ok());
        assert!(rain.resize_logging_to_at_least(0).is_ok());
        assert_eq!(rain.log_len(), 60);
        assert!(rain.resize_logging_to_at_least(1441 * 60).is_err());
    }

    #[test]
    fn test_rule_snapshot_round_trip() {
        let mut rain = RuleKitRainfall::new(Cadence::default());
        let col = rain.add_rule();
        rain.push_results(&ClockReading::at(60, 1), &[RuleBin::AutoFail]);
        let id = SnapshotSetId::new(9);
        rain.capture_rule_snapshot(col, id);
        assert_eq!(rain.rule_snapshot(col, id).unwrap()[0], RuleBin::AutoFail);
        assert!(rain.destroy_rule_snapshot(col, id));
        assert!(rain.rule_snapshot(col, id).is_none());
    }
}
