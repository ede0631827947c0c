//! Shewhart steady-state detector.

use serde::Serialize;

use crate::core::{Cadence, CoreResult};
use crate::knob::{SHEWHART_TRIP_FREE_MARGIN, SHEWHART_Z_PASS};
use crate::sequence::{Antecedents, NodeId};

/// Steady/unsteady state machine over (value, mean, std-dev) triples.
///
/// A trip is a z-score beyond `z_pass`. Any trip while steady flips the state
/// at once; recovery needs `trip_free_margin` consecutive trip-free cycles.
/// The reference std-dev follows the live one only while steady.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shewhart {
    z_pass: f64,
    trip_free_margin: u32,
    trip_free_count: u32,
    steady: bool,
    running: bool,
    std_dev_ref: f64,
    std_dev_ref_new: f64,
    z_now: f64,
}

impl Default for Shewhart {
    fn default() -> Self {
        Self::new(SHEWHART_Z_PASS.default, SHEWHART_TRIP_FREE_MARGIN.default as u32)
    }
}

impl Shewhart {
    pub fn new(z_pass: f64, trip_free_margin: u32) -> Self {
        Self {
            z_pass,
            trip_free_margin,
            trip_free_count: 0,
            steady: true,
            running: false,
            std_dev_ref: f64::NAN,
            std_dev_ref_new: f64::NAN,
            z_now: f64::NAN,
        }
    }

    /// Apply one cycle. Returns whether the sample tripped.
    pub fn apply(&mut self, x: f64, mean: f64, std_dev: f64) -> bool {
        if !self.running {
            self.std_dev_ref_new = std_dev;
            self.running = true;
        }
        self.std_dev_ref = self.std_dev_ref_new;
        self.z_now = (x - mean) / self.std_dev_ref;
        let trip = self.z_now.abs() > self.z_pass;

        if trip {
            self.trip_free_count = self.trip_free_count.saturating_sub(1);
            if self.steady {
                self.steady = false;
                // recovery counts from zero
                self.trip_free_count = 0;
            }
        } else {
            self.trip_free_count = (self.trip_free_count + 1).min(self.trip_free_margin);
            if !self.steady && self.trip_free_count == self.trip_free_margin {
                self.steady = true;
            }
        }

        self.std_dev_ref_new = if self.steady { std_dev } else { self.std_dev_ref };
        trip
    }

    pub fn set_z_pass(&mut self, z_pass: f64) -> CoreResult<()> {
        self.z_pass = SHEWHART_Z_PASS.vet(z_pass)?;
        Ok(())
    }

    pub fn set_trip_free_margin(&mut self, margin: u32) -> CoreResult<()> {
        SHEWHART_TRIP_FREE_MARGIN.vet(margin as f64)?;
        self.trip_free_margin = margin;
        Ok(())
    }

    pub fn is_steady(&self) -> bool {
        self.steady
    }

    pub fn z_pass(&self) -> f64 {
        self.z_pass
    }

    pub fn z_now(&self) -> f64 {
        self.z_now
    }

    pub fn trip_free_count(&self) -> u32 {
        self.trip_free_count
    }

    pub fn trip_free_margin(&self) -> u32 {
        self.trip_free_margin
    }

    /// Reference std-dev used by the last application.
    pub fn std_dev_ref(&self) -> f64 {
        self.std_dev_ref
    }
}

/// Shewhart chart over one analog rainfall.
///
/// Valid while the observed rainfall has no invalid entry within the window;
/// while invalid the state holds.
#[derive(Debug, Clone, Serialize)]
pub struct ShewhartChart {
    observed: NodeId,
    window: usize,
    cadence: Cadence,
    core: Shewhart,
    valid: bool,
    x_now: f64,
    x_mean: f64,
    x_std_dev: f64,
}

impl ShewhartChart {
    pub(crate) fn new(observed: NodeId, window: usize) -> Self {
        Self {
            observed,
            window,
            cadence: Cadence::default(),
            core: Shewhart::default(),
            valid: false,
            x_now: f64::NAN,
            x_mean: f64::NAN,
            x_std_dev: f64::NAN,
        }
    }

    pub(crate) fn bind(&mut self, cadence: Cadence) {
        self.cadence = cadence;
    }

    pub(crate) fn cycle(&mut self, nodes: Antecedents<'_>) {
        let rain = nodes.analog(self.observed);
        self.valid = rain.is_valid_over_cycles(self.window);
        if !self.valid {
            return;
        }
        self.x_now = rain.now_y();
        self.x_mean = rain.mean_to_depth(self.window);
        self.x_std_dev = rain.std_dev_to_depth(self.window);
        self.core.apply(self.x_now, self.x_mean, self.x_std_dev);
    }

    /// Called once the observed rainfall has moved its statistics user.
    pub(crate) fn set_window(&mut self, cycles: usize) {
        self.window = cycles;
    }

    pub(crate) fn core_mut(&mut self) -> &mut Shewhart {
        &mut self.core
    }

    pub fn core(&self) -> &Shewhart {
        &self.core
    }

    pub fn observed(&self) -> NodeId {
        self.observed
    }

    /// Statistics span in cycles.
    pub fn window(&self) -> usize {
        self.window
    }

    pub fn window_secs(&self) -> i64 {
        self.window as i64 * self.cadence.secs_per_cycle()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn is_steady(&self) -> bool {
        self.core.is_steady()
    }

    pub fn x_now(&self) -> f64 {
        self.x_now
    }

    pub fn x_mean(&self) -> f64 {
        self.x_mean
    }

    pub fn x_std_dev(&self) -> f64 {
        self.x_std_dev
    }
}
