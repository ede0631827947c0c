//! Data channels and formulas: the sources every chart and fact reads.

mod analog;
mod binary;
mod formula;

pub use analog::AnalogPoint;
pub use binary::BinaryPoint;
pub use formula::Formula;
