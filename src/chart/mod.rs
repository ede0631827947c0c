//! Statistical control charts.
//!
//! Charts turn an analog rainfall into boolean state signals:
//! - `ShewhartChart`: steady or unsteady, from a z-score against a frozen reference
//! - `TrackingChart`: rising, falling or hunting, from two saturating registers
//!
//! A chart cycles at the cadence of its slowest input.

mod shewhart;
mod tracking;

pub use shewhart::{Shewhart, ShewhartChart};
pub use tracking::{Guide, Tracker, TrackingChart, TrackingParams};

use crate::core::Cadence;
use crate::sequence::{Antecedents, NodeId};

/// Closed set of chart kinds.
#[derive(Debug, Clone)]
pub enum Chart {
    Shewhart(ShewhartChart),
    Tracking(TrackingChart),
}

impl Chart {
    pub fn inputs(&self) -> Vec<NodeId> {
        match self {
            Chart::Shewhart(s) => vec![s.observed()],
            Chart::Tracking(t) => t.inputs(),
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            Chart::Shewhart(s) => s.is_valid(),
            Chart::Tracking(t) => t.is_valid(),
        }
    }

    pub(crate) fn bind(&mut self, cadence: Cadence) {
        match self {
            Chart::Shewhart(s) => s.bind(cadence),
            Chart::Tracking(t) => t.bind(cadence),
        }
    }

    pub(crate) fn cycle(&mut self, nodes: Antecedents<'_>) {
        match self {
            Chart::Shewhart(s) => s.cycle(nodes),
            Chart::Tracking(t) => t.cycle(nodes),
        }
    }

    pub fn as_shewhart(&self) -> Option<&ShewhartChart> {
        match self {
            Chart::Shewhart(s) => Some(s),
            Chart::Tracking(_) => None,
        }
    }

    pub fn as_tracking(&self) -> Option<&TrackingChart> {
        match self {
            Chart::Tracking(t) => Some(t),
            Chart::Shewhart(_) => None,
        }
    }

    pub(crate) fn as_shewhart_mut(&mut self) -> Option<&mut ShewhartChart> {
        match self {
            Chart::Shewhart(s) => Some(s),
            Chart::Tracking(_) => None,
        }
    }

    pub(crate) fn as_tracking_mut(&mut self) -> Option<&mut TrackingChart> {
        match self {
            Chart::Tracking(t) => Some(t),
            Chart::Shewhart(_) => None,
        }
    }

    // ==================
    // Getters for chart-derived facts
    // ==================

    /// Shewhart: steady. Tracking: not frozen by an unsteady Shewhart chart.
    pub fn is_steady(&self) -> bool {
        match self {
            Chart::Shewhart(s) => s.is_steady(),
            Chart::Tracking(t) => t.is_tracking(),
        }
    }

    pub fn is_rising(&self) -> bool {
        self.as_tracking().map_or(false, TrackingChart::is_rising)
    }

    pub fn is_falling(&self) -> bool {
        self.as_tracking().map_or(false, TrackingChart::is_falling)
    }

    pub fn is_hunting(&self) -> bool {
        self.as_tracking().map_or(false, TrackingChart::is_hunting)
    }
}
