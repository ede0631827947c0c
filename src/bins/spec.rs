//! Bin tables for analog ranges.

use std::sync::OnceLock;

use crate::core::constants::ANALOG_BINS;

use super::range::DataRange;

/// Result of discretizing one analog value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binned {
    pub bindex: u8,
    /// The value fell outside the table and was clamped to an end bin
    pub out_of_range: bool,
}

/// Immutable table of `ANALOG_BINS` ordered labels for one range.
///
/// Bin `i` is labeled `min + i * width`, with `width = (max - min) / (ANALOG_BINS - 1)`.
/// `min_variance = (width / 2)^2` is the quantization floor for rolling statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct BinSpec {
    range: DataRange,
    width: f64,
    labels: Vec<f64>,
    min_variance: f64,
}

static TABLES: OnceLock<Vec<BinSpec>> = OnceLock::new();

impl BinSpec {
    pub fn new(range: DataRange) -> Self {
        let width = (range.max() - range.min()) / (ANALOG_BINS - 1) as f64;
        let labels = (0..ANALOG_BINS)
            .map(|i| range.min() + i as f64 * width)
            .collect();
        Self {
            range,
            width,
            labels,
            min_variance: (width / 2.0) * (width / 2.0),
        }
    }

    /// Shared table for a range, built once per process.
    pub fn for_range(range: DataRange) -> &'static BinSpec {
        let tables = TABLES.get_or_init(|| DataRange::ALL.iter().map(|r| BinSpec::new(*r)).collect());
        &tables[range.ordinal()]
    }

    pub fn range(&self) -> DataRange {
        self.range
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn half_width(&self) -> f64 {
        self.width / 2.0
    }

    pub fn min_variance(&self) -> f64 {
        self.min_variance
    }

    pub fn label(&self, bindex: u8) -> f64 {
        self.labels[bindex as usize]
    }

    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    /// Label of the middle bin.
    pub fn center_label(&self) -> f64 {
        self.labels[ANALOG_BINS / 2 - 1]
    }

    /// `floor((x + width/2 - label0) / width)`, clamped to the table.
    ///
    /// Non-finite input is treated as out of range at the low end.
    pub fn bindex(&self, x: f64) -> Binned {
        if !x.is_finite() {
            return Binned { bindex: 0, out_of_range: true };
        }
        let raw = ((x + self.half_width() - self.labels[0]) / self.width).floor();
        let top = (ANALOG_BINS - 1) as f64;
        if raw < 0.0 {
            Binned { bindex: 0, out_of_range: true }
        } else if raw > top {
            Binned { bindex: top as u8, out_of_range: true }
        } else {
            Binned { bindex: raw as u8, out_of_range: false }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_span_range() {
        let spec = BinSpec::new(DataRange::Percent);
        assert_eq!(spec.labels().len(), ANALOG_BINS);
        assert_eq!(spec.label(0), 0.0);
        assert!((spec.label(255) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_round_trip_within_half_width() {
        for range in DataRange::ALL {
            let spec = BinSpec::for_range(range);
            let steps = 1000;
            for i in 0..=steps {
                let v = range.min() + (range.max() - range.min()) * i as f64 / steps as f64;
                let b = spec.bindex(v);
                assert!(!b.out_of_range, "{:?} {}", range, v);
                assert!((spec.label(b.bindex) - v).abs() <= spec.half_width() + 1e-9);
            }
        }
    }

    #[test]
    fn test_clamps_and_flags_out_of_range() {
        let spec = BinSpec::for_range(DataRange::ZeroToOne);
        assert_eq!(spec.bindex(-3.0), Binned { bindex: 0, out_of_range: true });
        assert_eq!(spec.bindex(7.0), Binned { bindex: 255, out_of_range: true });
        assert!(spec.bindex(f64::NAN).out_of_range);
    }

    #[test]
    fn test_min_variance_is_half_width_squared() {
        let spec = BinSpec::for_range(DataRange::ZeroTo120);
        assert!((spec.min_variance() - spec.half_width().powi(2)).abs() < 1e-12);
    }
}
