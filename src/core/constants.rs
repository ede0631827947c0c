//! Fixed sizes and limits shared by every node in a sequence.

/// Default period between clock ticks, in seconds.
pub const SECS_PER_TRIGGER_DEFAULT: i64 = 60;

/// Entries in one captured snapshot window.
pub const SNAPSHOT_SIZE: usize = 15;

/// Largest triggers-per-cycle a node may be wired with.
///
/// A slower node could not fill a snapshot window with at least one of its own cycles.
pub const TRIGGERS_PER_CYCLE_MAX: u32 = SNAPSHOT_SIZE as u32;

/// Deepest span, in cycles, that rolling statistics or a trap may look back over.
pub const STATISTICS_DEPTH_MAX: usize = 360;

/// Smallest span a data log is ever sized to, in seconds.
pub const DATALOG_MIN_SECS: i64 = 3600;

/// Largest data log, in cycles.
pub const DATALOG_MAX_CYCLES: usize = 1440;

/// Number of bins in every analog bin table.
pub const ANALOG_BINS: usize = 256;

/// Trigger counter wraps back to zero after this many ticks (ten days at one minute).
pub const TRIGGER_COUNT_WRAP: u64 = 14_400;

/// Base trigger groups, in the order categories are offered each lap.
pub const BASE_GROUP_POINT: u32 = 1;
pub const BASE_GROUP_FORMULA: u32 = 2;
pub const BASE_GROUP_CHART: u32 = 3;
pub const BASE_GROUP_FACT: u32 = 4;
pub const BASE_GROUP_RULEKIT: u32 = 99;

/// Default cap on scheduler laps per tick.
pub const TRIGGER_LAPS_DEFAULT: u32 = 32;

/// Cycles a data log needs to cover `secs`, rounded up.
pub fn cycles_covering(secs: i64, secs_per_cycle: i64) -> usize {
    if secs <= 0 || secs_per_cycle <= 0 {
        return 0;
    }
    ((secs + secs_per_cycle - 1) / secs_per_cycle) as usize
}

/// Cycles spanned by `secs` when it must be a whole span of a source's cycles.
///
/// Returns `None` unless `secs_per_cycle <= secs < STATISTICS_DEPTH_MAX * secs_per_cycle`.
pub fn fit_cycles_to_secs(secs: i64, secs_per_cycle: i64) -> Option<usize> {
    if secs_per_cycle <= 0 {
        return None;
    }
    let upper = STATISTICS_DEPTH_MAX as i64 * secs_per_cycle;
    if secs < secs_per_cycle || secs >= upper {
        return None;
    }
    Some((secs / secs_per_cycle) as usize)
}
