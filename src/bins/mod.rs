//! Discretization tables.
//!
//! Analog values are binned through a per-range `BinSpec`; facts and rules log
//! small closed state enumerations.

mod range;
mod spec;
mod states;

pub use range::DataRange;
pub use spec::{BinSpec, Binned};
pub use states::{AnalogState, FactBin, RuleBin};
