//! Events the engine reports.
//!
//! Each event carries a fixed code and a severity; the sequence and the CLI
//! log through `log_event_with_fields` and never format codes themselves.

use std::fmt;

use super::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// A sequence finished wire-up
    EngineWired,
    /// Engine configuration loaded and validated
    ConfigLoaded,
    /// Replay of a reading file begins
    ReplayStart,
    /// Replay of a reading file finished
    ReplayComplete,

    // Ticks
    /// Every node was offered its group this tick
    TickComplete,
    /// The lap cap was reached with nodes still waiting
    TickIncomplete,

    // Rule kits
    /// Snapshots captured across a failing rule's antecedents
    SnapshotSetCaptured,
    /// A rule's snapshot set released by the trap
    SnapshotSetEvicted,
    /// The trap selected a rule
    RuleTrapped,
    /// A rule pinned to the unit output failed
    PinnedRuleFailed,

    // Parameters
    /// A data log grew to cover a longer span
    LoggingResized,
    /// A knob setting or resize request was refused
    KnobRejected,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::EngineWired => "ENGINE_WIRED",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ReplayStart => "REPLAY_START",
            Event::ReplayComplete => "REPLAY_COMPLETE",
            Event::TickComplete => "TICK_COMPLETE",
            Event::TickIncomplete => "TICK_INCOMPLETE",
            Event::SnapshotSetCaptured => "SNAPSHOT_SET_CAPTURED",
            Event::SnapshotSetEvicted => "SNAPSHOT_SET_EVICTED",
            Event::RuleTrapped => "RULE_TRAPPED",
            Event::PinnedRuleFailed => "PINNED_RULE_FAILED",
            Event::LoggingResized => "LOGGING_RESIZED",
            Event::KnobRejected => "KNOB_REJECTED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Event::TickComplete | Event::SnapshotSetCaptured | Event::LoggingResized => {
                Severity::Trace
            }
            Event::KnobRejected | Event::PinnedRuleFailed => Severity::Warn,
            Event::TickIncomplete => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
