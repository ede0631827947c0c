//! # Core Module
//!
//! Shared vocabulary for every node in a sequence:
//!
//! - fixed sizes and limits
//! - the recoverable error type and its reply codes
//! - clock readings and the port that derives them
//! - snapshot-set identifiers

mod clock;
pub mod constants;
mod error;

pub use clock::{ClockPort, ClockReading};
pub use error::{CoreError, CoreResult};

use serde::Serialize;

/// Identifier grouping snapshots captured together across several rainfalls.
///
/// Zero is reserved for "no snapshot set".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SnapshotSetId(u64);

impl SnapshotSetId {
    pub const NONE: SnapshotSetId = SnapshotSetId(0);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for SnapshotSetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How often a node computes, relative to the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cadence {
    pub triggers_per_cycle: u32,
    pub secs_per_trigger: i64,
}

impl Cadence {
    pub fn new(triggers_per_cycle: u32, secs_per_trigger: i64) -> Self {
        Self {
            triggers_per_cycle,
            secs_per_trigger,
        }
    }

    pub fn secs_per_cycle(&self) -> i64 {
        self.triggers_per_cycle as i64 * self.secs_per_trigger
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self::new(1, constants::SECS_PER_TRIGGER_DEFAULT)
    }
}

/// Hands out snapshot-set ids in increasing order, never zero.
#[derive(Debug)]
pub struct SnapshotSetIds {
    next: u64,
}

impl Default for SnapshotSetIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl SnapshotSetIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> SnapshotSetId {
        let id = SnapshotSetId(self.next);
        self.next = self.next.checked_add(1).unwrap_or(1);
        id
    }
}
