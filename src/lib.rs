//! afdd-core - real-time analytics for building-automation fault detection
//!
//! A `Sequence` owns every node of a unit: data points, formulas, control
//! charts, facts and rule kits. Each clock tick it cycles them in dependency
//! order, logs their results into bounded histories and lets rule kits trap
//! the rule that fails most.

pub mod bins;
pub mod chart;
pub mod cli;
pub mod config;
pub mod core;
pub mod fact;
pub mod knob;
pub mod observability;
pub mod points;
pub mod rainfall;
pub mod rule;
pub mod sequence;
