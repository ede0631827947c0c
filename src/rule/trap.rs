//! Fail-trap selection over a kit's auto-fail matrix.
//!
//! Columns are indexed in kit order; ties resolve to the lowest column.

/// Decision taken when the trap fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrapDecision {
    /// Column with the strictly largest fail sum
    pub trapped: Option<usize>,
    /// Column whose snapshot set should be released
    pub evictee: Option<usize>,
}

/// Fails per column over the rows of `matrix`.
pub fn fail_sums(matrix: &[Vec<bool>], columns: usize) -> Vec<u32> {
    let mut sums = vec![0u32; columns];
    for row in matrix {
        for (sum, failed) in sums.iter_mut().zip(row.iter()) {
            if *failed {
                *sum += 1;
            }
        }
    }
    sums
}

/// First column holding the maximum, or `None` when nothing failed.
pub fn select_trapped(sums: &[u32]) -> Option<usize> {
    if sums.iter().all(|s| *s == 0) {
        return None;
    }
    let max = sums.iter().copied().max()?;
    sums.iter().position(|s| *s == max)
}

/// First column holding the minimum once zero-fail columns without a snapshot
/// are bumped by one, so that an idle rule still holding an old snapshot
/// surfaces as the minimum.
pub fn select_evictee(sums: &[u32], has_snapshot: &[bool]) -> Option<usize> {
    let bumped: Vec<u32> = sums
        .iter()
        .zip(has_snapshot.iter())
        .map(|(s, snap)| if *s == 0 && !*snap { 1 } else { *s })
        .collect();
    let min = bumped.iter().copied().min()?;
    bumped.iter().position(|s| *s == min)
}

/// Run one trap round. Nothing is trapped or evicted when no column failed.
pub fn decide(sums: &[u32], has_snapshot: &[bool]) -> TrapDecision {
    let Some(trapped) = select_trapped(sums) else {
        return TrapDecision::default();
    };
    let evictee = select_evictee(sums, has_snapshot).filter(|e| *e != trapped);
    TrapDecision {
        trapped: Some(trapped),
        evictee,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_max_is_trapped() {
        assert_eq!(select_trapped(&[3, 0, 5]), Some(2));
    }

    #[test]
    fn test_all_zero_traps_nothing() {
        assert_eq!(select_trapped(&[0, 0, 0]), None);
        assert_eq!(decide(&[0, 0, 0], &[true, false, true]), TrapDecision::default());
    }

    #[test]
    fn test_tie_goes_to_first_column() {
        assert_eq!(select_trapped(&[4, 4, 1]), Some(0));
    }

    #[test]
    fn test_snapshot_holder_with_no_fails_is_evicted() {
        // column 1 failed long ago and still holds a snapshot; column 2 never failed
        let d = decide(&[3, 0, 0], &[true, true, false]);
        assert_eq!(d.trapped, Some(0));
        assert_eq!(d.evictee, Some(1));
    }

    #[test]
    fn test_evictee_never_the_trapped_rule() {
        let d = decide(&[2], &[true]);
        assert_eq!(d.trapped, Some(0));
        assert_eq!(d.evictee, None);
    }

    #[test]
    fn test_fail_sums_by_column() {
        let m = vec![vec![true, false], vec![true, true], vec![false, false]];
        assert_eq!(fail_sums(&m, 2), vec![2, 1]);
    }
}
