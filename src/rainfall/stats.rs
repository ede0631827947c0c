//! Rolling statistics over the newest spans of an analog log.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::bins::BinSpec;
use crate::core::constants::ANALOG_BINS;

use super::log::BindexLog;

/// Statistics for one span, shared by every consumer that asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpanStats {
    /// Consumers currently using this span
    pub users: u32,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
}

impl SpanStats {
    pub(crate) fn unused() -> Self {
        Self {
            users: 0,
            mean: f64::NAN,
            variance: f64::NAN,
            std_dev: f64::NAN,
        }
    }
}

/// Per-bin tallies reused across recomputations of one rainfall.
///
/// Holds no state between calls; `recompute` clears it first.
#[derive(Debug, Clone)]
pub struct BinCounts {
    counts: Vec<u32>,
}

impl Default for BinCounts {
    fn default() -> Self {
        Self {
            counts: vec![0; ANALOG_BINS],
        }
    }
}

impl BinCounts {
    fn clear(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
    }
}

/// Recompute every span in `spans` from the newest entries of `log`.
///
/// Spans are visited shortest first so one walk down the log serves all of them.
/// Variance is floored at the bin table's `min_variance`.
pub fn recompute(
    log: &BindexLog<u8>,
    spans: &mut BTreeMap<usize, SpanStats>,
    spec: &BinSpec,
    scratch: &mut BinCounts,
) {
    scratch.clear();
    let mut rows = log.iter();
    let mut counted = 0usize;

    for (&span, stats) in spans.iter_mut() {
        while counted < span {
            match rows.next() {
                Some(b) => scratch.counts[b as usize] += 1,
                None => break,
            }
            counted += 1;
        }
        let n = counted.min(log.len()) as f64;
        if n == 0.0 {
            continue;
        }

        let mean: f64 = scratch
            .counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(i, &c)| (c as f64 / n) * spec.labels()[i])
            .sum();
        let spread: f64 = scratch
            .counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(i, &c)| {
                let d = spec.labels()[i] - mean;
                (c as f64 / n) * d * d
            })
            .sum();
        let variance = spread.max(spec.min_variance());

        stats.mean = mean;
        stats.variance = variance;
        stats.std_dev = variance.sqrt();
    }
}
