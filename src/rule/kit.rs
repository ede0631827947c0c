//! Rule kit: rules cycled together, their result logs, and the fail-trap.

use serde::Serialize;

use crate::bins::RuleBin;
use crate::core::constants::{SNAPSHOT_SIZE, STATISTICS_DEPTH_MAX};
use crate::core::{Cadence, ClockReading, CoreError, CoreResult, SnapshotSetId, SnapshotSetIds};
use crate::rainfall::RuleKitRainfall;
use crate::sequence::{
    capture_antecedent_snapshots, destroy_antecedent_snapshots, Antecedents, Node, NodeId,
    TimeAxis,
};

use super::rule::{Rule, RuleId, RuleMode};
use super::trap;

/// What one kit cycle did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KitOutcome {
    /// Rule trapped this cycle, if the trap fired and anything failed
    pub trapped: Option<RuleId>,
    /// Trapped rule that was in auto mode and now has a case open
    pub case_opened: Option<RuleId>,
    /// A pinned rule failed in any mode
    pub pinned_failed: bool,
    pub captured: Vec<(RuleId, SnapshotSetId)>,
    pub evicted: Option<(RuleId, SnapshotSetId)>,
}

#[derive(Debug)]
pub struct RuleKit {
    rules: Vec<Rule>,
    cadence: Cadence,
    rain: RuleKitRainfall,
    trap_secs: i64,
    trap_cycles: usize,
    cycles_until_trap: usize,
    results: Vec<RuleBin>,
    outcome: KitOutcome,
}

impl Default for RuleKit {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleKit {
    pub fn new() -> Self {
        let cadence = Cadence::default();
        let trap_cycles = 60;
        Self {
            rules: Vec::new(),
            cadence,
            rain: RuleKitRainfall::new(cadence),
            trap_secs: trap_cycles as i64 * cadence.secs_per_cycle(),
            trap_cycles,
            cycles_until_trap: trap_cycles,
            results: Vec::new(),
            outcome: KitOutcome::default(),
        }
    }

    /// Add a rule. Panics on a duplicate id.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        assert!(
            self.rule_column(rule.id()).is_none(),
            "rule {} already in kit",
            rule.id()
        );
        self.rain.add_rule();
        self.rules.push(rule);
        self
    }

    /// Rebuild the result logs at the kit's cadence and keep the trap span in seconds.
    pub(crate) fn bind(&mut self, cadence: Cadence) {
        self.cadence = cadence;
        self.rain = RuleKitRainfall::new(cadence);
        for _ in &self.rules {
            self.rain.add_rule();
        }
        let spc = cadence.secs_per_cycle();
        let cycles = (self.trap_secs / spc).clamp(SNAPSHOT_SIZE as i64, STATISTICS_DEPTH_MAX as i64);
        self.trap_cycles = cycles as usize;
        self.trap_secs = cycles * spc;
        self.cycles_until_trap = self.trap_cycles;
        self.rain.grow_to(self.trap_cycles);
    }

    pub(crate) fn check_wiring(&self, nodes: Antecedents<'_>) {
        assert!(!self.rules.is_empty(), "rule kit has no rules");
        for rule in &self.rules {
            rule.check_wiring(nodes);
        }
    }

    /// Set the trailing span the trap tallies over, and how often it fires.
    ///
    /// The span must cover one snapshot window and no more than the deepest
    /// statistics span; otherwise the previous span stays in effect.
    pub fn set_trap_span(&mut self, secs: i64) -> CoreResult<()> {
        let spc = self.cadence.secs_per_cycle();
        let cycles = if secs > 0 { (secs / spc) as usize } else { 0 };
        if !(SNAPSHOT_SIZE..=STATISTICS_DEPTH_MAX).contains(&cycles) {
            return Err(CoreError::TrapSpanOutOfBounds {
                requested: cycles,
                min: SNAPSHOT_SIZE,
                max: STATISTICS_DEPTH_MAX,
            });
        }
        self.trap_secs = secs;
        self.trap_cycles = cycles;
        self.cycles_until_trap = self.cycles_until_trap.min(cycles);
        self.rain.grow_to(cycles);
        Ok(())
    }

    /// Idle or resume every rule without an open case.
    pub fn idle_all(&mut self, idle: bool) {
        for rule in self.rules.iter_mut().filter(|r| r.mode() != RuleMode::Case) {
            // case-mode rules are filtered out, so this cannot be refused
            let _ = rule.set_idle(idle);
        }
    }

    pub fn set_rule_idle(&mut self, id: RuleId, idle: bool) -> CoreResult<()> {
        let col = self
            .rule_column(id)
            .ok_or_else(|| CoreError::key_not_valid(format!("no rule {} in kit", id)))?;
        self.rules[col].set_idle(idle)
    }

    /// Return a rule with an open case to auto mode. Its snapshot set becomes evictable.
    pub fn close_case(&mut self, id: RuleId) -> CoreResult<()> {
        let col = self
            .rule_column(id)
            .ok_or_else(|| CoreError::key_not_valid(format!("no rule {} in kit", id)))?;
        self.rules[col].set_case_mode(false);
        Ok(())
    }

    pub(crate) fn cycle(
        &mut self,
        nodes: &mut [Node],
        axis: &mut TimeAxis,
        ids: &mut SnapshotSetIds,
        reading: &ClockReading,
    ) -> &KitOutcome {
        let mut outcome = KitOutcome::default();

        self.results.clear();
        let view = Antecedents::new(nodes);
        for rule in self.rules.iter_mut() {
            self.results.push(rule.evaluate(view));
        }
        self.rain.push_results(reading, &self.results);

        for (col, rule) in self.rules.iter_mut().enumerate() {
            if self.results[col].is_auto_fail() && rule.snapshot().is_none() {
                let id = ids.issue();
                let roots: Vec<NodeId> = rule.operands().collect();
                capture_antecedent_snapshots(nodes, &roots, id);
                axis.capture_snapshot(id);
                self.rain.capture_rule_snapshot(col, id);
                rule.set_snapshot(Some(id));
                outcome.captured.push((rule.id(), id));
            }
        }

        outcome.pinned_failed = self
            .rules
            .iter()
            .zip(self.results.iter())
            .any(|(r, b)| r.is_pinned() && b.is_failed_in_any_mode());

        self.cycles_until_trap = self.cycles_until_trap.saturating_sub(1);
        if self.cycles_until_trap == 0 {
            self.run_trap(nodes, axis, &mut outcome);
            self.cycles_until_trap = self.trap_cycles;
        }

        self.outcome = outcome;
        &self.outcome
    }

    fn run_trap(&mut self, nodes: &mut [Node], axis: &mut TimeAxis, outcome: &mut KitOutcome) {
        let sums = trap::fail_sums(
            &self.rain.auto_fail_matrix(self.trap_cycles),
            self.rules.len(),
        );
        let has_snapshot: Vec<bool> = self.rules.iter().map(|r| r.snapshot().is_some()).collect();
        let decision = trap::decide(&sums, &has_snapshot);

        if let Some(col) = decision.evictee {
            let rule = &mut self.rules[col];
            if let (Some(id), true) = (rule.snapshot(), rule.mode() != RuleMode::Case) {
                let roots: Vec<NodeId> = rule.operands().collect();
                destroy_antecedent_snapshots(nodes, &roots, id);
                axis.destroy_snapshot(id);
                self.rain.destroy_rule_snapshot(col, id);
                rule.set_snapshot(None);
                outcome.evicted = Some((rule.id(), id));
            }
        }

        if let Some(col) = decision.trapped {
            let rule = &mut self.rules[col];
            outcome.trapped = Some(rule.id());
            if rule.mode() == RuleMode::Auto {
                rule.set_case_mode(true);
                outcome.case_opened = Some(rule.id());
            }
        }
    }

    pub fn inputs(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.rules.iter().flat_map(|r| r.operands()).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    fn rule_column(&self, id: RuleId) -> Option<usize> {
        self.rules.iter().position(|r| r.id() == id)
    }

    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rule_column(id).map(|c| &self.rules[c])
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Result of `id` logged on the last cycle.
    pub fn newest_result(&self, id: RuleId) -> Option<RuleBin> {
        self.rule_column(id).map(|c| self.rain.newest(c))
    }

    pub fn rainfall(&self) -> &RuleKitRainfall {
        &self.rain
    }

    pub(crate) fn rainfall_mut(&mut self) -> &mut RuleKitRainfall {
        &mut self.rain
    }

    pub fn last_outcome(&self) -> &KitOutcome {
        &self.outcome
    }

    pub fn trap_cycles(&self) -> usize {
        self.trap_cycles
    }

    pub fn trap_secs(&self) -> i64 {
        self.trap_secs
    }

    pub fn cycles_until_trap(&self) -> usize {
        self.cycles_until_trap
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kit() -> RuleKit {
        RuleKit::new()
            .with_rule(Rule::new(1, vec![NodeId::new(0)], vec![NodeId::new(1)]))
            .with_rule(Rule::new(2, vec![NodeId::new(0)], vec![NodeId::new(2)]))
    }

    #[test]
    fn test_trap_span_bounds_leave_previous_span() {
        let mut k = kit();
        k.bind(Cadence::new(1, 60));
        assert_eq!(k.trap_cycles(), 60);
        assert!(matches!(
            k.set_trap_span(14 * 60),
            Err(CoreError::TrapSpanOutOfBounds { requested: 14, .. })
        ));
        assert!(k.set_trap_span(361 * 60).is_err());
        assert_eq!(k.trap_cycles(), 60);
        assert!(k.set_trap_span(15 * 60).is_ok());
        assert_eq!(k.trap_cycles(), 15);
    }

    #[test]
    fn test_trap_span_grows_logs() {
        let mut k = kit();
        k.bind(Cadence::new(1, 60));
        k.set_trap_span(300 * 60).unwrap();
        assert!(k.rainfall().log_len() >= 300);
    }

    #[test]
    fn test_idle_all_skips_case_rules() {
        let mut k = kit();
        k.rules[0].set_case_mode(true);
        k.idle_all(true);
        assert_eq!(k.rules()[0].mode(), RuleMode::Case);
        assert_eq!(k.rules()[1].mode(), RuleMode::Idle);
    }

    #[test]
    #[should_panic(expected = "already in kit")]
    fn test_duplicate_rule_id_panics() {
        kit().with_rule(Rule::new(2, vec![NodeId::new(0)], vec![NodeId::new(1)]));
    }

    #[test]
    fn test_inputs_deduplicated() {
        let ids: Vec<usize> = kit().inputs().iter().map(|n| n.index()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
