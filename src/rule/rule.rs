//! One If/Then rule over facts.

use std::fmt;

use serde::Serialize;

use crate::bins::RuleBin;
use crate::core::{CoreError, CoreResult, SnapshotSetId};
use crate::sequence::{Antecedents, NodeId};

type RulePredicate = Box<dyn Fn(&[bool]) -> bool>;

/// Identifier of a rule, unique within its kit. Zero is reserved for "none".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RuleId(u32);

impl RuleId {
    pub const NONE: RuleId = RuleId(0);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Auto rules can open a case; case rules already have one; idle rules only log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuleMode {
    Auto,
    Case,
    Idle,
}

impl RuleMode {
    fn offset(&self) -> u8 {
        match self {
            RuleMode::Auto => 0,
            RuleMode::Case => 4,
            RuleMode::Idle => 7,
        }
    }
}

pub struct Rule {
    id: RuleId,
    if_operands: Vec<NodeId>,
    then_operands: Vec<NodeId>,
    if_test: RulePredicate,
    then_test: RulePredicate,
    pinned: bool,
    mode: RuleMode,
    snapshot: Option<SnapshotSetId>,
    bin_now: RuleBin,
    claims: Vec<bool>,
}

impl Rule {
    /// A rule whose If and Then tests default to "every operand claims true".
    pub fn new(id: u32, if_operands: Vec<NodeId>, then_operands: Vec<NodeId>) -> Self {
        assert!(id != 0, "rule id 0 is reserved");
        assert!(
            !if_operands.is_empty() && !then_operands.is_empty(),
            "rule R{} needs at least one If and one Then operand",
            id
        );
        let n = if_operands.len().max(then_operands.len());
        Self {
            id: RuleId(id),
            if_operands,
            then_operands,
            if_test: Box::new(all_true),
            then_test: Box::new(all_true),
            pinned: false,
            mode: RuleMode::Auto,
            snapshot: None,
            bin_now: RuleBin::Unavailable,
            claims: Vec::with_capacity(n),
        }
    }

    pub fn with_if<P>(mut self, test: P) -> Self
    where
        P: Fn(&[bool]) -> bool + 'static,
    {
        self.if_test = Box::new(test);
        self
    }

    pub fn with_then<P>(mut self, test: P) -> Self
    where
        P: Fn(&[bool]) -> bool + 'static,
    {
        self.then_test = Box::new(test);
        self
    }

    /// Failures of a pinned rule feed the unit output.
    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    pub(crate) fn check_wiring(&self, nodes: Antecedents<'_>) {
        for id in self.if_operands.iter().chain(self.then_operands.iter()) {
            nodes.fact(*id);
        }
    }

    pub(crate) fn evaluate(&mut self, nodes: Antecedents<'_>) -> RuleBin {
        let valid = self
            .if_operands
            .iter()
            .chain(self.then_operands.iter())
            .all(|id| nodes.fact(*id).is_valid());
        if !valid {
            self.bin_now = RuleBin::Invalid;
            return self.bin_now;
        }

        self.claims.clear();
        self.claims
            .extend(self.if_operands.iter().map(|id| nodes.fact(*id).now()));
        let outcome = if !(self.if_test)(self.claims.as_slice()) {
            2
        } else {
            self.claims.clear();
            self.claims
                .extend(self.then_operands.iter().map(|id| nodes.fact(*id).now()));
            if (self.then_test)(self.claims.as_slice()) {
                1
            } else {
                0
            }
        };
        self.bin_now = RuleBin::from_index(outcome + self.mode.offset()).unwrap_or(RuleBin::Invalid);
        self.bin_now
    }

    /// Idle is refused while a case is open on the rule.
    pub(crate) fn set_idle(&mut self, idle: bool) -> CoreResult<()> {
        match (self.mode, idle) {
            (RuleMode::Case, true) => Err(CoreError::key_not_valid(format!(
                "rule {} is in case mode",
                self.id
            ))),
            (RuleMode::Case, false) => Ok(()),
            (_, true) => {
                self.mode = RuleMode::Idle;
                Ok(())
            }
            (_, false) => {
                self.mode = RuleMode::Auto;
                Ok(())
            }
        }
    }

    pub(crate) fn set_case_mode(&mut self, open: bool) {
        self.mode = match (self.mode, open) {
            (_, true) => RuleMode::Case,
            (RuleMode::Case, false) => RuleMode::Auto,
            (m, false) => m,
        };
    }

    pub(crate) fn set_snapshot(&mut self, id: Option<SnapshotSetId>) {
        self.snapshot = id;
    }

    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn mode(&self) -> RuleMode {
        self.mode
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn snapshot(&self) -> Option<SnapshotSetId> {
        self.snapshot
    }

    pub fn bin_now(&self) -> RuleBin {
        self.bin_now
    }

    pub fn if_operands(&self) -> &[NodeId] {
        &self.if_operands
    }

    pub fn then_operands(&self) -> &[NodeId] {
        &self.then_operands
    }

    pub fn operands(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.if_operands.iter().chain(self.then_operands.iter()).copied()
    }
}

fn all_true(claims: &[bool]) -> bool {
    claims.iter().all(|c| *c)
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("if", &self.if_operands)
            .field("then", &self.then_operands)
            .field("mode", &self.mode)
            .field("pinned", &self.pinned)
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_refused_in_case_mode() {
        let mut r = Rule::new(1, vec![NodeId::new(0)], vec![NodeId::new(1)]);
        r.set_case_mode(true);
        assert!(matches!(r.set_idle(true), Err(CoreError::KeyNotValid(_))));
        assert_eq!(r.mode(), RuleMode::Case);
        r.set_case_mode(false);
        assert!(r.set_idle(true).is_ok());
        assert_eq!(r.mode(), RuleMode::Idle);
    }

    #[test]
    fn test_closing_case_leaves_idle_alone() {
        let mut r = Rule::new(2, vec![NodeId::new(0)], vec![NodeId::new(1)]);
        r.set_idle(true).unwrap();
        r.set_case_mode(false);
        assert_eq!(r.mode(), RuleMode::Idle);
    }

    #[test]
    #[should_panic(expected = "reserved")]
    fn test_zero_id_rejected() {
        Rule::new(0, vec![NodeId::new(0)], vec![NodeId::new(1)]);
    }
}
