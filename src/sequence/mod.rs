//! # Sequence
//!
//! The node arena and the scheduler that cycles it once per tick.
//!
//! - `node`: handles, categories, per-node trigger bookkeeping, read-only antecedent views
//! - `scheduler`: wire-up, the trigger wave, knob dispatch
//! - `time_axis`: timestamps parallel to every data log

mod node;
mod scheduler;
mod time_axis;

pub use node::{Antecedents, Category, Node, NodeId, NodeKind, SeqElement};
pub use scheduler::{Sequence, TickStatus};
pub use time_axis::TimeAxis;

pub(crate) use node::{capture_antecedent_snapshots, destroy_antecedent_snapshots};
