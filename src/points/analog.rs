//! Analog data channel.

use crate::bins::{AnalogState, DataRange};
use crate::core::{Cadence, ClockReading};
use crate::rainfall::AnalogRainfall;

/// Sampled analog value posted from outside the sequence before each tick.
#[derive(Debug, Clone)]
pub struct AnalogPoint {
    range: DataRange,
    posted: f64,
    posted_valid: bool,
    rain: AnalogRainfall,
}

impl AnalogPoint {
    pub fn new(range: DataRange) -> Self {
        Self {
            range,
            posted: f64::NAN,
            posted_valid: false,
            rain: AnalogRainfall::new(range, Cadence::default()),
        }
    }

    /// Rebuild the rainfall for the cadence chosen at registration.
    pub(crate) fn bind(&mut self, cadence: Cadence) {
        self.rain = AnalogRainfall::new(self.range, cadence);
    }

    /// Post the value the next cycle will log.
    pub fn post(&mut self, value: f64, valid: bool) {
        self.posted = value;
        self.posted_valid = valid && value.is_finite();
    }

    pub(crate) fn cycle(&mut self, reading: &ClockReading) {
        self.rain.push_cycle(reading, self.posted, self.posted_valid);
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
