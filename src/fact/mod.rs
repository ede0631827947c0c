//! Facts: boolean claims about a piece of equipment.
//!
//! A fact reads charts, analog values, binary points or other facts and
//! logs its claim into its own fact rainfall every cycle. While its inputs
//! are invalid a fact holds its last valid claim and logs it as invalid.

mod variant;

pub use variant::{CompareOp, FactVariant, Operand, SustainMode};

use crate::chart::Chart;
use crate::core::{Cadence, ClockReading, CoreResult};
use crate::knob::SUSTAINED_MIN_CYCLES;
use crate::rainfall::FactRainfall;
use crate::sequence::{Antecedents, NodeId};

#[derive(Debug)]
pub struct Fact {
    variant: FactVariant,
    rain: FactRainfall,
    claim_now: bool,
    claim_was: bool,
    flipped: bool,
    valid_now: bool,
    valid_was: bool,
    time_of_claim: Option<i64>,
    first_cycle: bool,
}

impl Fact {
    fn with_variant(variant: FactVariant) -> Self {
        Self {
            variant,
            rain: FactRainfall::new(Cadence::default()),
            claim_now: false,
            claim_was: false,
            flipped: false,
            valid_now: false,
            valid_was: false,
            time_of_claim: None,
            first_cycle: true,
        }
    }

    /// Claim read off a chart, e.g. `Chart::is_steady`.
    pub fn from_chart<G>(chart: NodeId, getter: G) -> Self
    where
        G: Fn(&Chart) -> bool + 'static,
    {
        Self::with_variant(FactVariant::FromChart {
            chart,
            getter: Box::new(getter),
        })
    }

    pub fn compare(left: NodeId, op: CompareOp, right: Operand) -> Self {
        Self::with_variant(FactVariant::Compare { left, op, right })
    }

    /// Closure over the claims of `operands`, in order.
    pub fn from_facts<P>(operands: Vec<NodeId>, predicate: P) -> Self
    where
        P: Fn(&[bool]) -> bool + 'static,
    {
        assert!(!operands.is_empty(), "a fact over facts needs at least one operand");
        let n = operands.len();
        Self::with_variant(FactVariant::FromFacts {
            operands,
            predicate: Box::new(predicate),
            claims: Vec::with_capacity(n),
        })
    }

    pub fn from_point(point: NodeId) -> Self {
        Self::with_variant(FactVariant::FromPoint { point })
    }

    /// True once the watched fact has held its claim for `min_cycles` valid cycles.
    pub fn sustained(watched: NodeId, mode: SustainMode, min_cycles: u32) -> CoreResult<Self> {
        SUSTAINED_MIN_CYCLES.vet(min_cycles as f64)?;
        Ok(Self::with_variant(FactVariant::Sustained {
            watched,
            mode,
            min_cycles,
            cycles_sustained: 0,
            claim_to_watch: false,
        }))
    }

    pub(crate) fn bind(&mut self, cadence: Cadence) {
        self.rain = FactRainfall::new(cadence);
    }

    pub(crate) fn check_wiring(&self, nodes: Antecedents<'_>) {
        self.variant.check_wiring(nodes);
    }

    pub(crate) fn cycle(&mut self, nodes: Antecedents<'_>, reading: &ClockReading) {
        let (claim, valid) = self.variant.evaluate(nodes);
        self.valid_was = self.valid_now;
        self.valid_now = valid;

        if valid {
            self.claim_was = self.claim_now;
            self.claim_now = claim;
            self.flipped = self.claim_now != self.claim_was;
            if self.flipped || !self.valid_was || self.first_cycle {
                self.time_of_claim = Some(reading.timestamp);
            }
        } else {
            self.flipped = false;
        }
        self.first_cycle = false;
        self.rain.push_cycle(reading, self.claim_now, self.valid_now);
    }

    pub(crate) fn set_min_cycles(&mut self, cycles: u32) -> CoreResult<()> {
        self.variant.set_min_cycles(cycles)
    }

    pub fn inputs(&self) -> Vec<NodeId> {
        self.variant.inputs()
    }

    pub fn variant(&self) -> &FactVariant {
        &self.variant
    }

    pub fn kind_str(&self) -> &'static str {
        self.variant.kind_str()
    }

    /// Current claim; the last valid one while invalid.
    pub fn now(&self) -> bool {
        self.claim_now
    }

    pub fn is_valid(&self) -> bool {
        self.valid_now
    }

    /// Claim changed on the last valid cycle.
    pub fn has_flipped(&self) -> bool {
        self.flipped
    }

    /// Timestamp from which the current claim has held.
    pub fn time_of_claim(&self) -> Option<i64> {
        self.time_of_claim
    }

    pub fn rainfall(&self) -> &FactRainfall {
        &self.rain
    }

    pub(crate) fn rainfall_mut(&mut self) -> &mut FactRainfall {
        &mut self.rain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bins::{DataRange, FactBin};
    use crate::core::{ClockReading, CoreError};
    use crate::sequence::Sequence;

    fn tick(seq: &mut Sequence, n: u64) {
        seq.trigger(&ClockReading::at(60 * n as i64, n));
    }

    #[test]
    fn test_sustained_true_waits_out_min_cycles() {
        let mut seq = Sequence::new(60);
        let pt = seq.add_binary_point("fan_status", 1);
        let on = seq.add_fact("fan_on", Fact::from_point(pt));
        let held = seq.add_fact(
            "fan_on_3",
            Fact::sustained(on, SustainMode::True, 3).unwrap(),
        );

        seq.post_binary(pt, 1.0);
        tick(&mut seq, 1);
        tick(&mut seq, 2);
        assert!(!seq.fact(held).now());
        tick(&mut seq, 3);
        assert!(seq.fact(held).now());

        seq.post_binary(pt, 0.0);
        tick(&mut seq, 4);
        assert!(!seq.fact(held).now());
    }

    #[test]
    fn test_sustained_either_claim_restarts_on_change() {
        let mut seq = Sequence::new(60);
        let pt = seq.add_binary_point("pump_status", 1);
        let on = seq.add_fact("pump_on", Fact::from_point(pt));
        let stable = seq.add_fact(
            "pump_stable",
            Fact::sustained(on, SustainMode::TrueXorFalse, 2).unwrap(),
        );

        seq.post_binary(pt, 1.0);
        tick(&mut seq, 1);
        assert!(!seq.fact(stable).now());
        tick(&mut seq, 2);
        assert!(seq.fact(stable).now());

        seq.post_binary(pt, 0.0);
        tick(&mut seq, 3);
        assert!(!seq.fact(stable).now());
        tick(&mut seq, 4);
        assert!(seq.fact(stable).now());
    }

    #[test]
    fn test_invalid_input_holds_claim_and_logs_invalid() {
        let mut seq = Sequence::new(60);
        let pt = seq.add_binary_point("damper_status", 1);
        let open = seq.add_fact("damper_open", Fact::from_point(pt));

        seq.post_binary(pt, 1.0);
        tick(&mut seq, 1);
        assert!(seq.fact(open).now());
        assert_eq!(seq.fact(open).time_of_claim(), Some(60));

        seq.post_binary(pt, 7.0);
        tick(&mut seq, 2);
        let fact = seq.fact(open);
        assert!(!fact.is_valid());
        assert!(fact.now());
        assert_eq!(fact.rainfall().bindex_now(), FactBin::Invalid);
    }

    #[test]
    fn test_compare_equal_within_half_bin() {
        let mut seq = Sequence::new(60);
        let sat = seq.add_analog_point("sat", DataRange::ZeroTo120, 1);
        let at_55 = seq.add_fact(
            "sat_at_55",
            Fact::compare(sat, CompareOp::Equal, Operand::Param(55.0)),
        );
        let width = crate::bins::BinSpec::for_range(DataRange::ZeroTo120).width();

        seq.post_analog(sat, 55.0 + width * 0.4, true);
        tick(&mut seq, 1);
        assert!(seq.fact(at_55).now());

        seq.post_analog(sat, 55.0 + width * 2.0, true);
        tick(&mut seq, 2);
        assert!(!seq.fact(at_55).now());
        assert!(seq.fact(at_55).has_flipped());
        assert_eq!(seq.fact(at_55).time_of_claim(), Some(120));
    }

    #[test]
    fn test_from_facts_predicate() {
        let mut seq = Sequence::new(60);
        let a = seq.add_binary_point("a", 1);
        let b = seq.add_binary_point("b", 1);
        let fa = seq.add_fact("a_on", Fact::from_point(a));
        let fb = seq.add_fact("b_on", Fact::from_point(b));
        let both = seq.add_fact("both_on", Fact::from_facts(vec![fa, fb], |c| c.iter().all(|x| *x)));

        seq.post_binary(a, 1.0);
        seq.post_binary(b, 0.0);
        tick(&mut seq, 1);
        assert!(!seq.fact(both).now());
        seq.post_binary(b, 1.0);
        tick(&mut seq, 2);
        assert!(seq.fact(both).now());
    }

    #[test]
    fn test_min_cycles_vetted() {
        let pt = NodeId::new(0);
        assert!(matches!(
            Fact::sustained(pt, SustainMode::True, 61),
            Err(CoreError::ValueOutOfRange { .. })
        ));
        let mut f = Fact::from_point(pt);
        assert!(matches!(f.set_min_cycles(5), Err(CoreError::KeyNotValid(_))));
    }
}
