//! Engine counters
//!
//! - counters only, monotonic, reset only when the registry is created
//! - atomics so a reader on another thread can sample a live sequence

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct MetricsRegistry {
    ticks: AtomicU64,
    incomplete_ticks: AtomicU64,
    node_cycles: AtomicU64,
    snapshot_sets_captured: AtomicU64,
    snapshot_sets_evicted: AtomicU64,
    rules_trapped: AtomicU64,
    pinned_failures: AtomicU64,
    knob_rejections: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_ticks(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_incomplete_ticks(&self) {
        self.incomplete_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_node_cycles(&self, n: u64) {
        self.node_cycles.fetch_add(n, Ordering::Relaxed);
    }

    pub fn increment_snapshot_sets_captured(&self) {
        self.snapshot_sets_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_snapshot_sets_evicted(&self) {
        self.snapshot_sets_evicted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rules_trapped(&self) {
        self.rules_trapped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_pinned_failures(&self) {
        self.pinned_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_knob_rejections(&self) {
        self.knob_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            incomplete_ticks: self.incomplete_ticks.load(Ordering::Relaxed),
            node_cycles: self.node_cycles.load(Ordering::Relaxed),
            snapshot_sets_captured: self.snapshot_sets_captured.load(Ordering::Relaxed),
            snapshot_sets_evicted: self.snapshot_sets_evicted.load(Ordering::Relaxed),
            rules_trapped: self.rules_trapped.load(Ordering::Relaxed),
            pinned_failures: self.pinned_failures.load(Ordering::Relaxed),
            knob_rejections: self.knob_rejections.load(Ordering::Relaxed),
        }
    }

    pub fn to_json(&self) -> String {
        // a struct of integers always serializes
        serde_json::to_string(&self.snapshot()).unwrap_or_default()
    }
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub ticks: u64,
    pub incomplete_ticks: u64,
    pub node_cycles: u64,
    pub snapshot_sets_captured: u64,
    pub snapshot_sets_evicted: u64,
    pub rules_trapped: u64,
    pub pinned_failures: u64,
    pub knob_rejections: u64,
}
