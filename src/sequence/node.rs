//! Node arena entries and the handles that address them.
//!
//! Every node is registered once at wire-up and lives as long as its sequence.
//! Cross-references are `NodeId` handles into the arena; a node's inputs are
//! always registered before it, so its handles index the slice in front of it.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::chart::{Chart, ShewhartChart, TrackingChart};
use crate::core::constants::{
    BASE_GROUP_CHART, BASE_GROUP_FACT, BASE_GROUP_FORMULA, BASE_GROUP_POINT, BASE_GROUP_RULEKIT,
};
use crate::core::{Cadence, SnapshotSetId};
use crate::fact::Fact;
use crate::points::{AnalogPoint, BinaryPoint, Formula};
use crate::rainfall::AnalogRainfall;
use crate::rule::RuleKit;

/// Stable handle to a node in a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scheduling category. Categories are offered each lap in declaration order;
/// rule kits run once all other categories are satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    DataChannel,
    Formula,
    Chart,
    Fact,
    RuleKit,
}

impl Category {
    pub const LAPPED: [Category; 4] = [
        Category::DataChannel,
        Category::Formula,
        Category::Chart,
        Category::Fact,
    ];

    pub fn base_group(&self) -> u32 {
        match self {
            Category::DataChannel => BASE_GROUP_POINT,
            Category::Formula => BASE_GROUP_FORMULA,
            Category::Chart => BASE_GROUP_CHART,
            Category::Fact => BASE_GROUP_FACT,
            Category::RuleKit => BASE_GROUP_RULEKIT,
        }
    }

    pub(crate) fn slot(&self) -> usize {
        match self {
            Category::DataChannel => 0,
            Category::Formula => 1,
            Category::Chart => 2,
            Category::Fact => 3,
            Category::RuleKit => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::DataChannel => "data_channel",
            Category::Formula => "formula",
            Category::Chart => "chart",
            Category::Fact => "fact",
            Category::RuleKit => "rule_kit",
        }
    }
}

/// Outcome of offering a node the group targeted on the current lap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    /// Not this node's group
    NotTargeted,
    /// Accepted; countdown still running
    Counted,
    /// Accepted; countdown expired, node must cycle now
    Cycle,
}

/// Scheduling state common to every node.
#[derive(Debug, Clone, Serialize)]
pub struct SeqElement {
    pub label: String,
    pub category: Category,
    pub trigger_group: u32,
    pub cadence: Cadence,
    triggers_until_cycle: u32,
    cycles: u64,
}

impl SeqElement {
    pub(crate) fn new(label: String, category: Category, trigger_group: u32, cadence: Cadence) -> Self {
        Self {
            label,
            category,
            trigger_group,
            cadence,
            // first tick after wire-up always cycles
            triggers_until_cycle: 1,
            cycles: 0,
        }
    }

    pub(crate) fn offer(&mut self, targeted: u32) -> Acceptance {
        if targeted != self.trigger_group {
            return Acceptance::NotTargeted;
        }
        self.triggers_until_cycle -= 1;
        if self.triggers_until_cycle == 0 {
            self.triggers_until_cycle = self.cadence.triggers_per_cycle;
            self.cycles += 1;
            Acceptance::Cycle
        } else {
            Acceptance::Counted
        }
    }

    /// Cycles run since wire-up.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

/// Closed set of node kinds.
pub enum NodeKind {
    AnalogPoint(AnalogPoint),
    BinaryPoint(BinaryPoint),
    Formula(Formula),
    Chart(Chart),
    Fact(Fact),
    RuleKit(RuleKit),
}

impl NodeKind {
    pub fn category(&self) -> Category {
        match self {
            NodeKind::AnalogPoint(_) | NodeKind::BinaryPoint(_) => Category::DataChannel,
            NodeKind::Formula(_) => Category::Formula,
            NodeKind::Chart(_) => Category::Chart,
            NodeKind::Fact(_) => Category::Fact,
            NodeKind::RuleKit(_) => Category::RuleKit,
        }
    }

    /// Direct inputs.
    pub fn inputs(&self) -> Vec<NodeId> {
        match self {
            NodeKind::AnalogPoint(_) | NodeKind::BinaryPoint(_) => Vec::new(),
            NodeKind::Formula(f) => f.operands().to_vec(),
            NodeKind::Chart(c) => c.inputs(),
            NodeKind::Fact(f) => f.inputs(),
            NodeKind::RuleKit(k) => k.inputs(),
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            NodeKind::AnalogPoint(p) => p.is_valid(),
            NodeKind::BinaryPoint(p) => p.is_valid(),
            NodeKind::Formula(f) => f.is_valid(),
            NodeKind::Chart(c) => c.is_valid(),
            NodeKind::Fact(f) => f.is_valid(),
            NodeKind::RuleKit(_) => true,
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            NodeKind::AnalogPoint(_) => "analog_point",
            NodeKind::BinaryPoint(_) => "binary_point",
            NodeKind::Formula(_) => "formula",
            NodeKind::Chart(Chart::Shewhart(_)) => "shewhart",
            NodeKind::Chart(Chart::Tracking(_)) => "tracking",
            NodeKind::Fact(_) => "fact",
            NodeKind::RuleKit(_) => "rule_kit",
        }
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(self.kind_str()).field(&self.inputs()).finish()
    }
}

/// One arena entry.
#[derive(Debug)]
pub struct Node {
    pub element: SeqElement,
    pub kind: NodeKind,
}

impl Node {
    pub fn label(&self) -> &str {
        &self.element.label
    }

    pub fn is_valid(&self) -> bool {
        self.kind.is_valid()
    }

    /// Rainfall of an analog point or formula.
    pub fn analog_rainfall(&self) -> Option<&AnalogRainfall> {
        match &self.kind {
            NodeKind::AnalogPoint(p) => Some(p.rainfall()),
            NodeKind::Formula(f) => Some(f.rainfall()),
            _ => None,
        }
    }

    pub(crate) fn analog_rainfall_mut(&mut self) -> Option<&mut AnalogRainfall> {
        match &mut self.kind {
            NodeKind::AnalogPoint(p) => Some(p.rainfall_mut()),
            NodeKind::Formula(f) => Some(f.rainfall_mut()),
            _ => None,
        }
    }

    pub fn as_chart(&self) -> Option<&Chart> {
        match &self.kind {
            NodeKind::Chart(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_fact(&self) -> Option<&Fact> {
        match &self.kind {
            NodeKind::Fact(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_binary_point(&self) -> Option<&BinaryPoint> {
        match &self.kind {
            NodeKind::BinaryPoint(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_rule_kit(&self) -> Option<&RuleKit> {
        match &self.kind {
            NodeKind::RuleKit(k) => Some(k),
            _ => None,
        }
    }

    /// Knobs that `Sequence::apply_knob` accepts for this node.
    pub fn knob_names(&self) -> &'static [&'static str] {
        match &self.kind {
            NodeKind::Chart(Chart::Shewhart(_)) => &[
                "shewhart_z_pass",
                "shewhart_trip_free_margin",
                "shewhart_window_secs",
            ],
            NodeKind::Chart(Chart::Tracking(_)) => &[
                "tracking_half_band",
                "tracking_warn",
                "tracking_lag_frac",
                "tracking_stale_frac",
                "tracking_apps_between_resets",
            ],
            NodeKind::Fact(f) if f.kind_str() == "sustained" => &["sustained_min_cycles"],
            NodeKind::RuleKit(_) => &["rule_kit_trap_secs", "rule_kit_idle_all", "rule_idle"],
            _ => &[],
        }
    }

    /// Capture this node's own rainfall, if it has one.
    fn capture_snapshot(&mut self, id: SnapshotSetId) {
        match &mut self.kind {
            NodeKind::AnalogPoint(p) => p.rainfall_mut().capture_snapshot(id),
            NodeKind::Formula(f) => f.rainfall_mut().capture_snapshot(id),
            NodeKind::Fact(f) => f.rainfall_mut().capture_snapshot(id),
            _ => {}
        }
    }

    fn destroy_snapshot(&mut self, id: SnapshotSetId) {
        match &mut self.kind {
            NodeKind::AnalogPoint(p) => {
                p.rainfall_mut().destroy_snapshot(id);
            }
            NodeKind::Formula(f) => {
                f.rainfall_mut().destroy_snapshot(id);
            }
            NodeKind::Fact(f) => {
                f.rainfall_mut().destroy_snapshot(id);
            }
            _ => {}
        }
    }
}

/// Read-only view of the nodes registered before the one cycling.
#[derive(Clone, Copy)]
pub struct Antecedents<'a> {
    nodes: &'a [Node],
}

impl<'a> Antecedents<'a> {
    pub fn new(nodes: &'a [Node]) -> Self {
        Self { nodes }
    }

    pub fn node(&self, id: NodeId) -> &'a Node {
        self.nodes
            .get(id.index())
            .unwrap_or_else(|| panic!("node {} is not an antecedent", id))
    }

    pub fn analog(&self, id: NodeId) -> &'a AnalogRainfall {
        self.node(id)
            .analog_rainfall()
            .unwrap_or_else(|| panic!("node {} has no analog rainfall", id))
    }

    pub fn chart(&self, id: NodeId) -> &'a Chart {
        self.node(id)
            .as_chart()
            .unwrap_or_else(|| panic!("node {} is not a chart", id))
    }

    pub fn shewhart(&self, id: NodeId) -> &'a ShewhartChart {
        self.chart(id)
            .as_shewhart()
            .unwrap_or_else(|| panic!("node {} is not a Shewhart chart", id))
    }

    pub fn tracking(&self, id: NodeId) -> &'a TrackingChart {
        self.chart(id)
            .as_tracking()
            .unwrap_or_else(|| panic!("node {} is not a tracking chart", id))
    }

    pub fn fact(&self, id: NodeId) -> &'a Fact {
        self.node(id)
            .as_fact()
            .unwrap_or_else(|| panic!("node {} is not a fact", id))
    }

    pub fn binary_point(&self, id: NodeId) -> &'a BinaryPoint {
        self.node(id)
            .as_binary_point()
            .unwrap_or_else(|| panic!("node {} is not a binary point", id))
    }
}

/// Every node reachable from `roots` through inputs, roots included.
pub(crate) fn reachable(nodes: &[Node], roots: &[NodeId]) -> BTreeSet<NodeId> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<NodeId> = roots.to_vec();
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(node) = nodes.get(id.index()) {
            stack.extend(node.kind.inputs());
        }
    }
    seen
}

/// Capture `id` on every rainfall reachable from `roots`.
pub(crate) fn capture_antecedent_snapshots(nodes: &mut [Node], roots: &[NodeId], id: SnapshotSetId) {
    for n in reachable(nodes, roots) {
        if let Some(node) = nodes.get_mut(n.index()) {
            node.capture_snapshot(id);
        }
    }
}

/// Destroy `id` on every rainfall reachable from `roots`.
pub(crate) fn destroy_antecedent_snapshots(nodes: &mut [Node], roots: &[NodeId], id: SnapshotSetId) {
    for n in reachable(nodes, roots) {
        if let Some(node) = nodes.get_mut(n.index()) {
            node.destroy_snapshot(id);
        }
    }
}
