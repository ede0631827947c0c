//! How each kind of fact derives its claim.

use std::fmt;

use crate::bins::AnalogState;
use crate::chart::Chart;
use crate::core::{CoreError, CoreResult};
use crate::knob::SUSTAINED_MIN_CYCLES;
use crate::sequence::{Antecedents, NodeId};

pub(crate) type ChartGetter = Box<dyn Fn(&Chart) -> bool>;
pub(crate) type FactPredicate = Box<dyn Fn(&[bool]) -> bool>;

/// Right-hand side of a comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Node(NodeId),
    Param(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Less,
    Greater,
    /// Equal within half a bin width of the left operand
    Equal,
}

/// Which watched claim a sustained fact waits out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SustainMode {
    True,
    False,
    /// Either claim, as long as it does not change
    TrueXorFalse,
}

pub enum FactVariant {
    FromChart {
        chart: NodeId,
        getter: ChartGetter,
    },
    Compare {
        left: NodeId,
        op: CompareOp,
        right: Operand,
    },
    FromFacts {
        operands: Vec<NodeId>,
        predicate: FactPredicate,
        claims: Vec<bool>,
    },
    FromPoint {
        point: NodeId,
    },
    Sustained {
        watched: NodeId,
        mode: SustainMode,
        min_cycles: u32,
        cycles_sustained: u32,
        claim_to_watch: bool,
    },
}

impl FactVariant {
    pub(crate) fn inputs(&self) -> Vec<NodeId> {
        match self {
            FactVariant::FromChart { chart, .. } => vec![*chart],
            FactVariant::Compare { left, right, .. } => match right {
                Operand::Node(r) => vec![*left, *r],
                Operand::Param(_) => vec![*left],
            },
            FactVariant::FromFacts { operands, .. } => operands.clone(),
            FactVariant::FromPoint { point } => vec![*point],
            FactVariant::Sustained { watched, .. } => vec![*watched],
        }
    }

    pub(crate) fn kind_str(&self) -> &'static str {
        match self {
            FactVariant::FromChart { .. } => "from_chart",
            FactVariant::Compare { .. } => "compare",
            FactVariant::FromFacts { .. } => "from_facts",
            FactVariant::FromPoint { .. } => "from_point",
            FactVariant::Sustained { .. } => "sustained",
        }
    }

    /// Panics if an input is not of the kind this variant reads.
    pub(crate) fn check_wiring(&self, nodes: Antecedents<'_>) {
        match self {
            FactVariant::FromChart { chart, .. } => {
                nodes.chart(*chart);
            }
            FactVariant::Compare { left, right, .. } => {
                nodes.analog(*left);
                if let Operand::Node(r) = right {
                    nodes.analog(*r);
                }
            }
            FactVariant::FromFacts { operands, .. } => {
                for id in operands {
                    nodes.fact(*id);
                }
            }
            FactVariant::FromPoint { point } => {
                nodes.binary_point(*point);
            }
            FactVariant::Sustained { watched, .. } => {
                nodes.fact(*watched);
            }
        }
    }

    /// Claim and validity for this cycle.
    pub(crate) fn evaluate(&mut self, nodes: Antecedents<'_>) -> (bool, bool) {
        match self {
            FactVariant::FromChart { chart, getter } => {
                let c = nodes.chart(*chart);
                ((**getter)(c), c.is_valid())
            }
            FactVariant::Compare { left, op, right } => {
                let l = nodes.analog(*left);
                let (r, r_valid) = match right {
                    Operand::Node(id) => {
                        let rain = nodes.analog(*id);
                        (rain.now_x(), rain.state_now() == AnalogState::Valid)
                    }
                    Operand::Param(v) => (*v, true),
                };
                let x = l.now_x();
                let claim = match op {
                    CompareOp::Less => x < r,
                    CompareOp::Greater => x > r,
                    CompareOp::Equal => (x - r).abs() <= l.bin_spec().half_width(),
                };
                (claim, r_valid && l.state_now() == AnalogState::Valid)
            }
            FactVariant::FromFacts {
                operands,
                predicate,
                claims,
            } => {
                claims.clear();
                let mut valid = true;
                for id in operands.iter() {
                    let f = nodes.fact(*id);
                    valid &= f.is_valid();
                    claims.push(f.now());
                }
                ((**predicate)(claims.as_slice()), valid)
            }
            FactVariant::FromPoint { point } => {
                let p = nodes.binary_point(*point);
                (p.claim(), p.is_valid())
            }
            FactVariant::Sustained {
                watched,
                mode,
                min_cycles,
                cycles_sustained,
                claim_to_watch,
            } => {
                let f = nodes.fact(*watched);
                if !f.is_valid() {
                    return (*cycles_sustained >= *min_cycles, false);
                }
                let now = f.now();
                match mode {
                    SustainMode::TrueXorFalse => {
                        if now != *claim_to_watch {
                            *claim_to_watch = now;
                            *cycles_sustained = 1;
                        } else {
                            *cycles_sustained = (*cycles_sustained + 1).min(*min_cycles);
                        }
                    }
                    SustainMode::True | SustainMode::False => {
                        let target = *mode == SustainMode::True;
                        *cycles_sustained = if now == target {
                            (*cycles_sustained + 1).min(*min_cycles)
                        } else {
                            0
                        };
                    }
                }
                (*cycles_sustained >= *min_cycles, true)
            }
        }
    }

    pub(crate) fn set_min_cycles(&mut self, cycles: u32) -> CoreResult<()> {
        SUSTAINED_MIN_CYCLES.vet(cycles as f64)?;
        if let FactVariant::Sustained {
            min_cycles,
            cycles_sustained,
            ..
        } = self
        {
            *min_cycles = cycles;
            *cycles_sustained = (*cycles_sustained).min(cycles);
            return Ok(());
        }
        Err(CoreError::key_not_valid(format!(
            "sustained_min_cycles on a {} fact",
            self.kind_str()
        )))
    }
}

impl fmt::Debug for FactVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(self.kind_str()).field(&self.inputs()).finish()
    }
}
