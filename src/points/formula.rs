//! Calculated analog value over other analog sources.

use std::fmt;

use crate::bins::{AnalogState, DataRange};
use crate::core::{Cadence, ClockReading};
use crate::rainfall::AnalogRainfall;
use crate::sequence::{Antecedents, NodeId};

type FormulaFn = Box<dyn Fn(&[f64]) -> f64>;

/// Evaluates a closure over the newest values of its operands and logs the result.
///
/// Valid only when every operand is valid and the result is finite.
pub struct Formula {
    range: DataRange,
    operands: Vec<NodeId>,
    formula: FormulaFn,
    values: Vec<f64>,
    rain: AnalogRainfall,
}

impl Formula {
    pub fn new<F>(range: DataRange, operands: Vec<NodeId>, formula: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + 'static,
    {
        assert!(!operands.is_empty(), "a formula needs at least one operand");
        let n = operands.len();
        Self {
            range,
            operands,
            formula: Box::new(formula),
            values: Vec::with_capacity(n),
            rain: AnalogRainfall::new(range, Cadence::default()),
        }
    }

    pub(crate) fn bind(&mut self, cadence: Cadence) {
        self.rain = AnalogRainfall::new(self.range, cadence);
    }

    pub(crate) fn cycle(&mut self, nodes: Antecedents<'_>, reading: &ClockReading) {
        self.values.clear();
        let mut valid = true;
        for id in &self.operands {
            let rain = nodes.analog(*id);
            valid &= rain.state_now() == AnalogState::Valid;
            self.values.push(rain.now_x());
        }
        let result = (self.formula)(&self.values);
        self.rain
            .push_cycle(reading, result, valid && result.is_finite());
    }

    pub fn operands(&self) -> &[NodeId] {
        &self.operands
    }

    pub fn is_valid(&self) -> bool {
        self.rain.state_now() == AnalogState::Valid
    }

    pub fn range(&self) -> DataRange {
        self.range
    }

    pub fn rainfall(&self) -> &AnalogRainfall {
        &self.rain
    }

    pub(crate) fn rainfall_mut(&mut self) -> &mut AnalogRainfall {
        &mut self.rain
    }
}

impl fmt::Debug for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Formula")
            .field("range", &self.range)
            .field("operands", &self.operands)
            .finish_non_exhaustive()
    }
}
