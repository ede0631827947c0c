//! The trigger wave.
//!
//! Once per tick `Sequence::trigger` offers every lapped node a targeted
//! trigger group, raising the target by one per lap. A node accepts only when
//! the target equals its own group, so a node is always offered after every
//! node it reads. Rule kits run once the laps are done.

use serde::Serialize;

use crate::bins::DataRange;
use crate::chart::{Chart, Guide, ShewhartChart, TrackingChart};
use crate::core::constants::{
    fit_cycles_to_secs, BASE_GROUP_POINT, BASE_GROUP_RULEKIT, DATALOG_MAX_CYCLES,
    STATISTICS_DEPTH_MAX, TRIGGERS_PER_CYCLE_MAX, TRIGGER_LAPS_DEFAULT,
};
use crate::core::{Cadence, ClockReading, CoreError, CoreResult, SnapshotSetIds};
use crate::fact::Fact;
use crate::knob::KnobSetting;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::points::{AnalogPoint, BinaryPoint, Formula};
use crate::rule::{KitOutcome, RuleId, RuleKit};

use super::node::{reachable, Acceptance, Antecedents, Category, Node, NodeKind, SeqElement};
use super::time_axis::TimeAxis;
use super::NodeId;

/// Result of one `trigger` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TickStatus {
    /// Every lapped node was offered its group and the rule kits ran
    AllCycled,
    /// The lap cap was reached first; `pending` nodes were never offered
    /// their group and the rule kits were skipped
    RanToExitWithNodesYetToCycle { pending: usize },
}

impl TickStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, TickStatus::AllCycled)
    }
}

/// Arena of wired nodes plus the shared time axis.
pub struct Sequence {
    nodes: Vec<Node>,
    by_category: [Vec<NodeId>; 5],
    secs_per_trigger: i64,
    max_laps: u32,
    log_ticks: bool,
    time_axis: TimeAxis,
    ids: SnapshotSetIds,
    metrics: MetricsRegistry,
    satisfied: Vec<bool>,
    cycled: Vec<NodeId>,
    ticks: u64,
}

impl Sequence {
    pub fn new(secs_per_trigger: i64) -> Self {
        Self::with_limits(secs_per_trigger, TRIGGER_LAPS_DEFAULT, false)
    }

    /// Panics unless `secs_per_trigger > 0` and `1 <= max_laps < BASE_GROUP_RULEKIT`.
    pub fn with_limits(secs_per_trigger: i64, max_laps: u32, log_ticks: bool) -> Self {
        assert!(secs_per_trigger > 0, "secs_per_trigger must be positive");
        assert!(
            (1..BASE_GROUP_RULEKIT).contains(&max_laps),
            "max_laps must be in 1..{}",
            BASE_GROUP_RULEKIT
        );
        Self {
            nodes: Vec::new(),
            by_category: Default::default(),
            secs_per_trigger,
            max_laps,
            log_ticks,
            time_axis: TimeAxis::new(secs_per_trigger),
            ids: SnapshotSetIds::new(),
            metrics: MetricsRegistry::new(),
            satisfied: Vec::new(),
            cycled: Vec::new(),
            ticks: 0,
        }
    }

    // ==================
    // Wire-up
    // ==================

    pub fn add_analog_point(&mut self, label: &str, range: DataRange, triggers_per_cycle: u32) -> NodeId {
        self.register(
            label,
            NodeKind::AnalogPoint(AnalogPoint::new(range)),
            Some(triggers_per_cycle),
        )
    }

    pub fn add_binary_point(&mut self, label: &str, triggers_per_cycle: u32) -> NodeId {
        self.register(
            label,
            NodeKind::BinaryPoint(BinaryPoint::new()),
            Some(triggers_per_cycle),
        )
    }

    pub fn add_formula(&mut self, label: &str, triggers_per_cycle: u32, formula: Formula) -> NodeId {
        self.register(label, NodeKind::Formula(formula), Some(triggers_per_cycle))
    }

    /// Shewhart chart over `observed`'s statistics across `window_secs`.
    ///
    /// Panics unless the window spans at least one and fewer than
    /// `STATISTICS_DEPTH_MAX` of the observed source's cycles.
    pub fn add_shewhart(&mut self, label: &str, observed: NodeId, window_secs: i64) -> NodeId {
        let rain = self.view().analog(observed);
        let spc = rain.cadence().secs_per_cycle();
        let window = fit_cycles_to_secs(window_secs, spc).unwrap_or_else(|| {
            panic!(
                "Shewhart window of {}s does not fit {}s cycles of {}",
                window_secs, spc, observed
            )
        });
        if let Some(rain) = self.nodes[observed.index()].analog_rainfall_mut() {
            if let Err(e) = rain.add_statistics_user(window) {
                panic!("Shewhart window on {}: {}", observed, e);
            }
        }
        self.register(
            label,
            NodeKind::Chart(Chart::Shewhart(ShewhartChart::new(observed, window))),
            None,
        )
    }

    /// Tracking chart over `observed`, frozen while `observed_shewhart` is unsteady.
    pub fn add_tracking(
        &mut self,
        label: &str,
        observed: NodeId,
        observed_shewhart: NodeId,
        guide: Guide,
    ) -> NodeId {
        let view = self.view();
        let range = view.analog(observed).bin_spec().range();
        assert_eq!(
            view.shewhart(observed_shewhart).observed(),
            observed,
            "Shewhart chart {} does not observe {}",
            observed_shewhart,
            observed
        );
        if let Guide::Data { source, shewhart } = guide {
            view.analog(source);
            if let Some(s) = shewhart {
                assert_eq!(
                    view.shewhart(s).observed(),
                    source,
                    "Shewhart chart {} does not observe guide {}",
                    s,
                    source
                );
            }
        }
        self.register(
            label,
            NodeKind::Chart(Chart::Tracking(TrackingChart::new(
                observed,
                observed_shewhart,
                guide,
                range,
            ))),
            None,
        )
    }

    pub fn add_fact(&mut self, label: &str, fact: Fact) -> NodeId {
        self.register(label, NodeKind::Fact(fact), None)
    }

    pub fn add_rule_kit(&mut self, label: &str, triggers_per_cycle: u32, kit: RuleKit) -> NodeId {
        self.register(label, NodeKind::RuleKit(kit), Some(triggers_per_cycle))
    }

    /// Panics on any wiring defect: unknown handle, wrong input kind,
    /// triggers-per-cycle out of range, or a group past the rule-kit group.
    fn register(&mut self, label: &str, mut kind: NodeKind, triggers_per_cycle: Option<u32>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let inputs = kind.inputs();
        let view = self.view();
        for input in &inputs {
            assert!(
                input.index() < id.index(),
                "{} reads {}, which is not registered",
                label,
                input
            );
        }

        match &kind {
            NodeKind::Formula(f) => {
                for op in f.operands() {
                    view.analog(*op);
                }
            }
            NodeKind::Fact(f) => f.check_wiring(view),
            NodeKind::RuleKit(k) => k.check_wiring(view),
            _ => {}
        }

        let category = kind.category();
        let trigger_group = if category == Category::RuleKit {
            BASE_GROUP_RULEKIT
        } else {
            inputs
                .iter()
                .map(|i| view.node(*i).element.trigger_group + 1)
                .max()
                .unwrap_or(0)
                .max(category.base_group())
        };
        assert!(
            category == Category::RuleKit || trigger_group < BASE_GROUP_RULEKIT,
            "{} lands in trigger group {}, past the rule kits",
            label,
            trigger_group
        );

        let tpc = match triggers_per_cycle {
            Some(tpc) => tpc,
            None => inputs
                .iter()
                .map(|i| view.node(*i).element.cadence.triggers_per_cycle)
                .min()
                .unwrap_or_else(|| panic!("{} has no inputs to take its cadence from", label)),
        };
        assert!(
            (1..=TRIGGERS_PER_CYCLE_MAX).contains(&tpc),
            "{}: triggers per cycle {} not in 1..={}",
            label,
            tpc,
            TRIGGERS_PER_CYCLE_MAX
        );
        let cadence = Cadence::new(tpc, self.secs_per_trigger);

        match &mut kind {
            NodeKind::AnalogPoint(p) => p.bind(cadence),
            NodeKind::BinaryPoint(_) => {}
            NodeKind::Formula(f) => f.bind(cadence),
            NodeKind::Chart(c) => c.bind(cadence),
            NodeKind::Fact(f) => f.bind(cadence),
            NodeKind::RuleKit(k) => k.bind(cadence),
        }

        let element = SeqElement::new(label.to_string(), category, trigger_group, cadence);
        self.nodes.push(Node { element, kind });
        self.by_category[category.slot()].push(id);
        self.satisfied.push(false);
        id
    }

    /// Log the wired node count. Call once wire-up is finished.
    pub fn finish_wiring(&self) {
        let nodes = self.nodes.len().to_string();
        let kits = self.by_category[Category::RuleKit.slot()].len().to_string();
        let depth = self.max_group().to_string();
        log_event_with_fields(
            Event::EngineWired,
            &[("nodes", &nodes), ("rule_kits", &kits), ("max_group", &depth)],
        );
    }

    // ==================
    // Inputs
    // ==================

    /// Post the value an analog point logs on its next cycle.
    pub fn post_analog(&mut self, id: NodeId, value: f64, valid: bool) {
        match self.nodes.get_mut(id.index()).map(|n| &mut n.kind) {
            Some(NodeKind::AnalogPoint(p)) => p.post(value, valid),
            _ => panic!("{} is not an analog point", id),
        }
    }

    pub fn post_binary(&mut self, id: NodeId, raw: f64) {
        match self.nodes.get_mut(id.index()).map(|n| &mut n.kind) {
            Some(NodeKind::BinaryPoint(p)) => p.post(raw),
            _ => panic!("{} is not a binary point", id),
        }
    }

    // ==================
    // Tick
    // ==================

    pub fn trigger(&mut self, reading: &ClockReading) -> TickStatus {
        self.time_axis.push(reading.timestamp);
        self.cycled.clear();
        self.satisfied.iter_mut().for_each(|s| *s = false);

        let mut pending: usize = Category::LAPPED
            .iter()
            .map(|c| self.by_category[c.slot()].len())
            .sum();
        let mut lap = 0;
        while pending > 0 && lap < self.max_laps {
            let target = BASE_GROUP_POINT + lap;
            for category in Category::LAPPED {
                if target < category.base_group() {
                    continue;
                }
                for k in 0..self.by_category[category.slot()].len() {
                    let id = self.by_category[category.slot()][k];
                    if self.satisfied[id.index()] {
                        continue;
                    }
                    match self.nodes[id.index()].element.offer(target) {
                        Acceptance::NotTargeted => {}
                        Acceptance::Counted => {
                            self.satisfied[id.index()] = true;
                            pending -= 1;
                        }
                        Acceptance::Cycle => {
                            self.satisfied[id.index()] = true;
                            pending -= 1;
                            self.cycle_lapped(id, reading);
                        }
                    }
                }
            }
            lap += 1;
        }

        self.ticks += 1;
        self.metrics.increment_ticks();

        if pending > 0 {
            self.metrics.increment_incomplete_ticks();
            self.metrics.add_node_cycles(self.cycled.len() as u64);
            let count = reading.trigger_count.to_string();
            let waiting = pending.to_string();
            let laps = lap.to_string();
            log_event_with_fields(
                Event::TickIncomplete,
                &[("trigger_count", &count), ("pending", &waiting), ("laps", &laps)],
            );
            return TickStatus::RanToExitWithNodesYetToCycle { pending };
        }

        for k in 0..self.by_category[Category::RuleKit.slot()].len() {
            let id = self.by_category[Category::RuleKit.slot()][k];
            if self.nodes[id.index()].element.offer(BASE_GROUP_RULEKIT) == Acceptance::Cycle {
                self.cycle_kit(id, reading);
            }
        }

        self.metrics.add_node_cycles(self.cycled.len() as u64);
        if self.log_ticks {
            let count = reading.trigger_count.to_string();
            let cycled = self.cycled.len().to_string();
            let laps = lap.to_string();
            log_event_with_fields(
                Event::TickComplete,
                &[("trigger_count", &count), ("cycled", &cycled), ("laps", &laps)],
            );
        }
        TickStatus::AllCycled
    }

    fn cycle_lapped(&mut self, id: NodeId, reading: &ClockReading) {
        let (before, rest) = self.nodes.split_at_mut(id.index());
        let view = Antecedents::new(before);
        match &mut rest[0].kind {
            NodeKind::AnalogPoint(p) => p.cycle(reading),
            NodeKind::BinaryPoint(p) => p.cycle(),
            NodeKind::Formula(f) => f.cycle(view, reading),
            NodeKind::Chart(c) => c.cycle(view),
            NodeKind::Fact(f) => f.cycle(view, reading),
            NodeKind::RuleKit(_) => unreachable!("rule kits are not lapped"),
        }
        self.cycled.push(id);
    }

    fn cycle_kit(&mut self, id: NodeId, reading: &ClockReading) {
        let (before, rest) = self.nodes.split_at_mut(id.index());
        let node = &mut rest[0];
        let outcome = match &mut node.kind {
            NodeKind::RuleKit(kit) => kit
                .cycle(before, &mut self.time_axis, &mut self.ids, reading)
                .clone(),
            _ => unreachable!("only rule kits are filed as rule kits"),
        };
        let label = node.element.label.clone();
        self.cycled.push(id);
        self.report_kit(&label, &outcome);
    }

    fn report_kit(&self, kit: &str, outcome: &KitOutcome) {
        for (rule, set) in &outcome.captured {
            self.metrics.increment_snapshot_sets_captured();
            let (rule, set) = (rule.to_string(), set.to_string());
            log_event_with_fields(
                Event::SnapshotSetCaptured,
                &[("kit", kit), ("rule", &rule), ("snapshot_set", &set)],
            );
        }
        if let Some((rule, set)) = outcome.evicted {
            self.metrics.increment_snapshot_sets_evicted();
            let (rule, set) = (rule.to_string(), set.to_string());
            log_event_with_fields(
                Event::SnapshotSetEvicted,
                &[("kit", kit), ("rule", &rule), ("snapshot_set", &set)],
            );
        }
        if let Some(rule) = outcome.trapped {
            self.metrics.increment_rules_trapped();
            let case = outcome.case_opened.is_some().to_string();
            let rule = rule.to_string();
            log_event_with_fields(
                Event::RuleTrapped,
                &[("kit", kit), ("rule", &rule), ("case_opened", &case)],
            );
        }
        if outcome.pinned_failed {
            self.metrics.increment_pinned_failures();
            log_event_with_fields(Event::PinnedRuleFailed, &[("kit", kit)]);
        }
    }

    // ==================
    // Knobs
    // ==================

    /// Apply a vetted parameter change to one node. On failure nothing changes.
    pub fn apply_knob(&mut self, id: NodeId, setting: KnobSetting) -> CoreResult<()> {
        let result = self.apply_knob_inner(id, setting);
        if let Err(e) = &result {
            self.metrics.increment_knob_rejections();
            let node = id.to_string();
            log_event_with_fields(
                Event::KnobRejected,
                &[("node", &node), ("knob", setting.as_str()), ("code", e.code())],
            );
        }
        result
    }

    fn apply_knob_inner(&mut self, id: NodeId, setting: KnobSetting) -> CoreResult<()> {
        if id.index() >= self.nodes.len() {
            return Err(CoreError::key_not_valid(format!("no node {}", id)));
        }
        let (before, rest) = self.nodes.split_at_mut(id.index());
        let node = &mut rest[0];
        let mismatch = CoreError::key_not_valid(format!(
            "knob {} does not apply to {} {}",
            setting.as_str(),
            node.kind.kind_str(),
            node.element.label
        ));

        match (&mut node.kind, setting) {
            (NodeKind::Chart(Chart::Shewhart(s)), KnobSetting::ShewhartZPass(z)) => {
                s.core_mut().set_z_pass(z)
            }
            (NodeKind::Chart(Chart::Shewhart(s)), KnobSetting::ShewhartTripFreeMargin(m)) => {
                s.core_mut().set_trip_free_margin(m)
            }
            (NodeKind::Chart(Chart::Shewhart(s)), KnobSetting::ShewhartWindowSecs(secs)) => {
                let rain = before[s.observed().index()]
                    .analog_rainfall_mut()
                    .ok_or_else(|| CoreError::key_not_valid("observed node has no rainfall"))?;
                let spc = rain.cadence().secs_per_cycle();
                let window = fit_cycles_to_secs(secs, spc).ok_or(CoreError::ValueOutOfRange {
                    value: secs as f64,
                    min: spc as f64,
                    max: ((STATISTICS_DEPTH_MAX - 1) as i64 * spc) as f64,
                })?;
                rain.shift_statistics_span(s.window(), window)?;
                s.set_window(window);
                Ok(())
            }
            (NodeKind::Chart(Chart::Tracking(t)), KnobSetting::TrackingHalfBand(v)) => {
                t.set_half_band(v)
            }
            (NodeKind::Chart(Chart::Tracking(t)), KnobSetting::TrackingWarn(v)) => t.set_warn(v),
            (NodeKind::Chart(Chart::Tracking(t)), KnobSetting::TrackingLagFrac(v)) => {
                t.set_lag_frac(v)
            }
            (NodeKind::Chart(Chart::Tracking(t)), KnobSetting::TrackingStaleFrac(v)) => {
                t.set_stale_frac(v)
            }
            (NodeKind::Chart(Chart::Tracking(t)), KnobSetting::TrackingAppsBetweenResets(v)) => {
                t.set_apps_between_resets(v)
            }
            (NodeKind::Fact(f), KnobSetting::SustainedMinCycles(n)) => f.set_min_cycles(n),
            (NodeKind::RuleKit(k), KnobSetting::RuleKitTrapSecs(secs)) => k.set_trap_span(secs),
            (NodeKind::RuleKit(k), KnobSetting::RuleKitIdleAll(idle)) => {
                k.idle_all(idle);
                Ok(())
            }
            (NodeKind::RuleKit(k), KnobSetting::RuleIdle { rule, idle }) => {
                k.set_rule_idle(rule, idle)
            }
            _ => Err(mismatch),
        }
    }

    /// Return a rule with an open case to auto mode.
    pub fn close_case(&mut self, kit: NodeId, rule: RuleId) -> CoreResult<()> {
        match self.nodes.get_mut(kit.index()).map(|n| &mut n.kind) {
            Some(NodeKind::RuleKit(k)) => k.close_case(rule),
            _ => Err(CoreError::key_not_valid(format!("{} is not a rule kit", kit))),
        }
    }

    /// Grow a node's data log, and the time axis alongside it, to cover `secs`.
    pub fn resize_logging_to_at_least(&mut self, id: NodeId, secs: i64) -> CoreResult<()> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or_else(|| CoreError::key_not_valid(format!("no node {}", id)))?;
        let result = match &mut node.kind {
            NodeKind::AnalogPoint(p) => p.rainfall_mut().resize_logging_to_at_least(secs),
            NodeKind::Formula(f) => f.rainfall_mut().resize_logging_to_at_least(secs),
            NodeKind::Fact(f) => f.rainfall_mut().resize_logging_to_at_least(secs),
            NodeKind::RuleKit(k) => k.rainfall_mut().resize_logging_to_at_least(secs),
            _ => Err(CoreError::key_not_valid(format!(
                "{} {} keeps no data log",
                node.kind.kind_str(),
                node.element.label
            ))),
        };
        let label = node.element.label.clone();

        match result {
            Ok(()) => {
                let axis_secs = secs.min(DATALOG_MAX_CYCLES as i64 * self.secs_per_trigger);
                self.time_axis.resize_logging_to_at_least(axis_secs)?;
                let secs = secs.to_string();
                log_event_with_fields(Event::LoggingResized, &[("node", &label), ("secs", &secs)]);
                Ok(())
            }
            Err(e) => {
                self.metrics.increment_knob_rejections();
                let secs = secs.to_string();
                log_event_with_fields(
                    Event::KnobRejected,
                    &[("node", &label), ("knob", "logging_secs"), ("code", e.code()), ("secs", &secs)],
                );
                Err(e)
            }
        }
    }

    // ==================
    // Accessors
    // ==================

    fn view(&self) -> Antecedents<'_> {
        Antecedents::new(&self.nodes)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        self.view().node(id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn chart(&self, id: NodeId) -> &Chart {
        self.view().chart(id)
    }

    pub fn shewhart(&self, id: NodeId) -> &ShewhartChart {
        self.view().shewhart(id)
    }

    pub fn tracking(&self, id: NodeId) -> &TrackingChart {
        self.view().tracking(id)
    }

    pub fn fact(&self, id: NodeId) -> &Fact {
        self.view().fact(id)
    }

    pub fn analog(&self, id: NodeId) -> &crate::rainfall::AnalogRainfall {
        self.view().analog(id)
    }

    pub fn rule_kit(&self, id: NodeId) -> &RuleKit {
        self.node(id)
            .as_rule_kit()
            .unwrap_or_else(|| panic!("node {} is not a rule kit", id))
    }

    /// Look a node up by label.
    pub fn find(&self, label: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.label() == label)
            .map(NodeId::new)
    }

    pub fn time_axis(&self) -> &TimeAxis {
        &self.time_axis
    }

    /// Nodes whose cycle ran on the last tick, in the order they ran.
    pub fn last_cycled(&self) -> &[NodeId] {
        &self.cycled
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn secs_per_trigger(&self) -> i64 {
        self.secs_per_trigger
    }

    pub fn max_laps(&self) -> u32 {
        self.max_laps
    }

    /// Highest trigger group among lapped nodes.
    pub fn max_group(&self) -> u32 {
        self.nodes
            .iter()
            .filter(|n| n.element.category != Category::RuleKit)
            .map(|n| n.element.trigger_group)
            .max()
            .unwrap_or(0)
    }

    /// Knobs of `id` and of every node it reads, directly or not.
    pub fn antecedent_knobs(&self, id: NodeId) -> Vec<(NodeId, &'static str)> {
        reachable(&self.nodes, &[id])
            .into_iter()
            .flat_map(|n| {
                self.nodes[n.index()]
                    .knob_names()
                    .iter()
                    .map(move |k| (n, *k))
            })
            .collect()
    }
}

impl std::fmt::Debug for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence")
            .field("nodes", &self.nodes.len())
            .field("secs_per_trigger", &self.secs_per_trigger)
            .field("max_laps", &self.max_laps)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bins::DataRange;

    fn reading(n: u64) -> ClockReading {
        ClockReading::at(60 * n as i64, n)
    }

    #[test]
    fn test_groups_follow_inputs() {
        let mut seq = Sequence::new(60);
        let p = seq.add_analog_point("p", DataRange::ZeroTo120, 1);
        let f1 = seq.add_formula("f1", 1, Formula::new(DataRange::ZeroTo120, vec![p], |v| v[0]));
        let f2 = seq.add_formula("f2", 1, Formula::new(DataRange::ZeroTo120, vec![f1], |v| v[0]));
        let c = seq.add_shewhart("c", f2, 180);
        assert_eq!(seq.node(p).element.trigger_group, 1);
        assert_eq!(seq.node(f1).element.trigger_group, 2);
        assert_eq!(seq.node(f2).element.trigger_group, 3);
        assert_eq!(seq.node(c).element.trigger_group, 4);
        assert_eq!(seq.max_group(), 4);
    }

    #[test]
    fn test_cadence_inherited_from_fastest_input() {
        let mut seq = Sequence::new(60);
        let a = seq.add_binary_point("a", 2);
        let b = seq.add_binary_point("b", 5);
        let fa = seq.add_fact("fa", Fact::from_point(a));
        let fb = seq.add_fact("fb", Fact::from_point(b));
        let both = seq.add_fact("both", Fact::from_facts(vec![fa, fb], |c| c[0] && c[1]));
        assert_eq!(seq.node(both).element.cadence.triggers_per_cycle, 2);
    }

    #[test]
    fn test_slow_node_cycles_every_nth_tick() {
        let mut seq = Sequence::new(60);
        let p = seq.add_analog_point("p", DataRange::ZeroTo120, 3);
        seq.post_analog(p, 10.0, true);
        let mut cycled_on = Vec::new();
        for n in 1..=7 {
            seq.trigger(&reading(n));
            if seq.last_cycled().contains(&p) {
                cycled_on.push(n);
            }
        }
        assert_eq!(cycled_on, vec![1, 4, 7]);
    }

    #[test]
    fn test_knob_kind_mismatch() {
        let mut seq = Sequence::new(60);
        let p = seq.add_analog_point("p", DataRange::ZeroTo120, 1);
        let err = seq.apply_knob(p, KnobSetting::ShewhartZPass(2.0)).unwrap_err();
        assert!(matches!(err, CoreError::KeyNotValid(_)));
        assert_eq!(seq.metrics().snapshot().knob_rejections, 1);
    }

    #[test]
    fn test_window_knob_moves_statistics_user() {
        let mut seq = Sequence::new(60);
        let p = seq.add_analog_point("p", DataRange::ZeroTo120, 1);
        let c = seq.add_shewhart("c", p, 180);
        assert!(seq.apply_knob(c, KnobSetting::ShewhartWindowSecs(600)).is_ok());
        assert_eq!(seq.shewhart(c).window(), 10);
        let spans: Vec<usize> = seq.analog(p).spans_in_use().map(|(s, _)| s).collect();
        assert_eq!(spans, vec![10]);

        let err = seq.apply_knob(c, KnobSetting::ShewhartWindowSecs(30)).unwrap_err();
        assert!(matches!(err, CoreError::ValueOutOfRange { .. }));
        assert_eq!(seq.shewhart(c).window(), 10);
    }

    #[test]
    fn test_antecedent_knobs_cover_chain() {
        let mut seq = Sequence::new(60);
        let p = seq.add_analog_point("p", DataRange::ZeroTo120, 1);
        let c = seq.add_shewhart("c", p, 180);
        let steady = seq.add_fact("steady", Fact::from_chart(c, Chart::is_steady));
        let held = seq.add_fact(
            "held",
            Fact::sustained(steady, crate::fact::SustainMode::True, 3).unwrap(),
        );
        let knobs = seq.antecedent_knobs(held);
        assert!(knobs.contains(&(held, "sustained_min_cycles")));
        assert!(knobs.contains(&(c, "shewhart_z_pass")));
        assert!(!knobs.iter().any(|(n, _)| *n == p));
    }

    #[test]
    fn test_resize_rejects_beyond_max_and_keeps_axis() {
        let mut seq = Sequence::new(60);
        let p = seq.add_analog_point("p", DataRange::ZeroTo120, 1);
        let axis = seq.time_axis().capacity();
        assert!(seq.resize_logging_to_at_least(p, 1441 * 60).is_err());
        assert_eq!(seq.time_axis().capacity(), axis);
        assert!(seq.resize_logging_to_at_least(p, 7200).is_ok());
        assert_eq!(seq.analog(p).log_len(), 120);
        assert_eq!(seq.time_axis().capacity(), 120);
    }

    #[test]
    fn test_resize_below_capacity_is_noop() {
        let mut seq = Sequence::new(60);
        let p = seq.add_analog_point("p", DataRange::ZeroTo120, 1);
        let axis = seq.time_axis().capacity();
        assert!(seq.resize_logging_to_at_least(p, 60).is_ok());
        assert!(seq.resize_logging_to_at_least(p, 0).is_ok());
        assert_eq!(seq.analog(p).log_len(), 60);
        assert_eq!(seq.time_axis().capacity(), axis);
        assert_eq!(seq.metrics().snapshot().knob_rejections, 0);
    }

    #[test]
    #[should_panic(expected = "triggers per cycle")]
    fn test_tpc_beyond_max_panics() {
        Sequence::new(60).add_binary_point("b", 16);
    }

    #[test]
    #[should_panic(expected = "not a fact")]
    fn test_wrong_input_kind_panics() {
        let mut seq = Sequence::new(60);
        let p = seq.add_binary_point("b", 1);
        seq.add_fact("bad", Fact::from_facts(vec![p], |c| c[0]));
    }
}
