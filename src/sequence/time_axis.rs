//! Timestamp log parallel to every rainfall, one entry per trigger.

use std::collections::VecDeque;

use crate::core::constants::{cycles_covering, DATALOG_MAX_CYCLES, DATALOG_MIN_SECS, SNAPSHOT_SIZE};
use crate::core::{CoreError, CoreResult, SnapshotSetId};
use crate::rainfall::SnapshotStore;

#[derive(Debug, Clone)]
pub struct TimeAxis {
    secs_per_trigger: i64,
    stamps: VecDeque<i64>,
    capacity: usize,
    snapshots: SnapshotStore<i64>,
}

impl TimeAxis {
    pub fn new(secs_per_trigger: i64) -> Self {
        let capacity = cycles_covering(DATALOG_MIN_SECS, secs_per_trigger).max(SNAPSHOT_SIZE);
        Self {
            secs_per_trigger,
            stamps: VecDeque::with_capacity(capacity),
            capacity,
            snapshots: SnapshotStore::new(),
        }
    }

    /// Log the timestamp of one trigger. The first push backfills the whole
    /// log at the trigger period.
    pub fn push(&mut self, timestamp: i64) {
        if self.stamps.is_empty() {
            self.stamps
                .extend((1..self.capacity as i64).map(|k| timestamp - k * self.secs_per_trigger));
            self.stamps.push_front(timestamp);
            return;
        }
        self.stamps.pop_back();
        self.stamps.push_front(timestamp);
    }

    /// Grow to cover at least `secs`; never shrinks.
    pub fn resize_logging_to_at_least(&mut self, secs: i64) -> CoreResult<()> {
        let wanted = cycles_covering(secs, self.secs_per_trigger);
        if wanted <= self.capacity {
            return Ok(());
        }
        let max = DATALOG_MAX_CYCLES as i64 * self.secs_per_trigger;
        if secs > max {
            return Err(CoreError::DataLoggingSizeNotWithinBounds {
                requested: secs,
                min: 0,
                max,
            });
        }
        self.capacity = wanted;
        if let Some(mut oldest) = self.stamps.back().copied() {
            while self.stamps.len() < self.capacity {
                oldest -= self.secs_per_trigger;
                self.stamps.push_back(oldest);
            }
        }
        Ok(())
    }

    pub fn capture_snapshot(&mut self, id: SnapshotSetId) {
        self.snapshots.capture(id, self.stamps.iter().copied(), 1);
    }

    pub fn destroy_snapshot(&mut self, id: SnapshotSetId) -> bool {
        self.snapshots.destroy(id)
    }

    pub fn is_snapshot_valid(&self, id: SnapshotSetId) -> bool {
        self.snapshots.contains(id)
    }

    /// Captured timestamps, oldest first.
    pub fn snapshot_oldest_first(&self, id: SnapshotSetId) -> Vec<i64> {
        self.snapshots.oldest_first(id)
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn newest(&self) -> Option<i64> {
        self.stamps.front().copied()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.stamps.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_push_backfills() {
        let mut axis = TimeAxis::new(60);
        axis.push(6000);
        let stamps: Vec<i64> = axis.iter().take(3).collect();
        assert_eq!(stamps, vec![6000, 5940, 5880]);
        assert_eq!(axis.iter().count(), axis.capacity());
    }

    #[test]
    fn test_snapshot_is_oldest_first() {
        let mut axis = TimeAxis::new(60);
        axis.push(6000);
        axis.push(6060);
        let id = SnapshotSetId::new(1);
        axis.capture_snapshot(id);
        let snap = axis.snapshot_oldest_first(id);
        assert_eq!(snap.len(), SNAPSHOT_SIZE);
        assert_eq!(snap.last(), Some(&6060));
        assert_eq!(snap[snap.len() - 2], 6000);
        assert!(axis.destroy_snapshot(id));
        assert!(!axis.is_snapshot_valid(id));
    }

    #[test]
    fn test_resize_bounds() {
        let mut axis = TimeAxis::new(60);
        axis.push(6000);
        let before = axis.capacity();
        assert!(axis.resize_logging_to_at_least(600).is_ok());
        assert_eq!(axis.capacity(), before);
        assert!(axis.resize_logging_to_at_least(7200).is_ok());
        assert_eq!(axis.capacity(), 120);
        assert_eq!(axis.iter().count(), 120);
        assert!(axis.resize_logging_to_at_least(0).is_ok());
        assert_eq!(axis.capacity(), 120);
        assert!(axis.resize_logging_to_at_least(1441 * 60).is_err());
    }
}
