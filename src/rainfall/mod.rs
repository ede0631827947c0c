//! # Rainfall
//!
//! Time-series store owned by one node: a bounded newest-first log of bindexes,
//! rolling statistics at every span a consumer asked for, a moving-hour
//! histogram, and snapshots captured and destroyed on request.
//!
//! - `AnalogRainfall`: binned values plus validity, with statistics
//! - `FactRainfall`: true / false / invalid / unavailable claims
//! - `RuleKitRainfall`: one rule-result log per rule in a kit
//!
//! Logs grow and never shrink. Each rainfall owns its scratch tallies, so
//! recomputation for one node never touches another node's state.

mod analog;
mod fact;
mod histogram;
mod log;
mod rulekit;
mod snapshot;
mod stats;

pub use analog::{AnalogRainfall, AnalogSample, BACKFILL_VALUE_BINDEX};
pub use fact::FactRainfall;
pub use histogram::Histogram;
pub use log::BindexLog;
pub use rulekit::RuleKitRainfall;
pub use snapshot::SnapshotStore;
pub use stats::SpanStats;
