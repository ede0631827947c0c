//! Rules, rule kits and the fail-trap.
//!
//! Each kit cycle every rule logs one result. On the first auto-mode fail of
//! a rule without a snapshot set, the kit captures one across the rule's
//! antecedents and the time axis. Once per trap span the trap picks the rule
//! that failed most and releases the snapshot set of the one that failed least.

mod kit;
#[allow(clippy::module_inception)]
mod rule;
pub mod trap;

pub use kit::{KitOutcome, RuleKit};
pub use rule::{Rule, RuleId, RuleMode};
