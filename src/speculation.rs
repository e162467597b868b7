//! The LATE (Longest Approximate Time to End) speculation policy.
//!
//! Split out as a pure function of already-computed per-task numbers so it can be
//! exercised by property tests (AMBIENT-4) independent of real wall-clock timing, and so
//! the locking/threading concerns in `scheduler.rs` stay separate from the ranking
//! arithmetic.

use crate::types::TaskId;

/// A snapshot of one in-flight, non-speculative task eligible for speculation, taken
/// under the scheduler lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// The original task's id.
    pub id: TaskId,
    /// Its current LATE estimated-time-to-end.
    pub eta_remaining: f64,
}

/// The outcome of one monitor-phase selection pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Ids that should receive a new speculative duplicate this tick.
    pub to_duplicate: Vec<TaskId>,
    /// Ranked-and-within-limit candidates skipped because they already had a speculative
    /// duplicate in flight (§4.3.1 step 6) — surfaced so the caller can log the skip
    /// (SPEC_FULL.md AMBIENT-1: "a speculative-task construction that was skipped because
    /// a copy already existed").
    pub already_duplicated: Vec<TaskId>,
}

/// Decide which candidates get a speculative duplicate this tick.
///
/// `candidates` should already be filtered to `¬completed ∧ ¬is_speculative ∧ in_progress
/// ∧ progress < cutoff` (§4.3.1 steps 1); this function performs steps 2, 4, 5 and 6: it
/// ranks by descending `eta_remaining` (ties broken by lower id first), computes the
/// per-tick limit, and splits the first `limit` candidates into those that should receive
/// a new speculative duplicate and those `already_has_duplicate` reports as already
/// covered. Either way, a covered candidate still consumes a slot of the per-tick limit —
/// it is never backfilled from beyond the ranking window.
pub fn select_stragglers(
    candidates: &[Candidate],
    already_has_duplicate: impl Fn(TaskId) -> bool,
    speculative_limit: usize,
    straggler_percentile: f64,
) -> Selection {
    if candidates.is_empty() || speculative_limit == 0 {
        return Selection::default();
    }

    let mut ranked = candidates.to_vec();
    ranked.sort_by(|a, b| {
        b.eta_remaining
            .partial_cmp(&a.eta_remaining)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });

    let scaled = (ranked.len() as f64 * straggler_percentile).floor() as usize;
    let limit = speculative_limit.min(scaled.max(1));

    let mut selection = Selection::default();
    for candidate in ranked.into_iter().take(limit) {
        if already_has_duplicate(candidate.id) {
            selection.already_duplicated.push(candidate.id);
        } else {
            selection.to_duplicate.push(candidate.id);
        }
    }
    selection
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: u64, eta: f64) -> Candidate {
        Candidate { id: TaskId(id), eta_remaining: eta }
    }

    #[test]
    fn empty_candidates_yields_nothing() {
        let result = select_stragglers(&[], |_| false, 2, 0.2);
        assert!(result.to_duplicate.is_empty());
        assert!(result.already_duplicated.is_empty());
    }

    #[test]
    fn zero_limit_yields_nothing_regardless_of_candidates() {
        let candidates = vec![candidate(0, 100.0), candidate(1, 50.0)];
        let result = select_stragglers(&candidates, |_| false, 0, 1.0);
        assert!(result.to_duplicate.is_empty());
        assert!(result.already_duplicated.is_empty());
    }

    #[test]
    fn zero_percentile_still_yields_one_per_tick() {
        // max(1, floor(n*0)) == 1, pinned per SPEC_FULL.md §8 boundary behaviors.
        let candidates = vec![candidate(0, 100.0), candidate(1, 50.0), candidate(2, 10.0)];
        let result = select_stragglers(&candidates, |_| false, 5, 0.0);
        assert_eq!(result.to_duplicate, vec![TaskId(0)]);
        assert!(result.already_duplicated.is_empty());
    }

    #[test]
    fn ranks_worst_eta_first() {
        let candidates = vec![candidate(0, 10.0), candidate(1, 100.0), candidate(2, 50.0)];
        let result = select_stragglers(&candidates, |_| false, 3, 1.0);
        assert_eq!(result.to_duplicate, vec![TaskId(1), TaskId(2), TaskId(0)]);
    }

    #[test]
    fn ties_break_by_lower_id_first() {
        let candidates = vec![candidate(5, 42.0), candidate(2, 42.0), candidate(9, 42.0)];
        let result = select_stragglers(&candidates, |_| false, 3, 1.0);
        assert_eq!(result.to_duplicate, vec![TaskId(2), TaskId(5), TaskId(9)]);
    }

    #[test]
    fn speculative_limit_caps_output() {
        let candidates = vec![candidate(0, 10.0), candidate(1, 20.0), candidate(2, 30.0)];
        let result = select_stragglers(&candidates, |_| false, 1, 1.0);
        assert_eq!(result.to_duplicate.len(), 1);
        assert_eq!(result.to_duplicate, vec![TaskId(2)]);
    }

    #[test]
    fn existing_duplicate_is_skipped_without_freeing_its_slot() {
        // task 1 (the worst) already has a duplicate; it is reported as skipped, but
        // task 0's slot is not "backfilled" from beyond the limit — only the first
        // `limit` candidates are ever considered, per §4.3.1 step 6.
        let candidates = vec![candidate(0, 10.0), candidate(1, 100.0), candidate(2, 50.0)];
        let result = select_stragglers(&candidates, |id| id == TaskId(1), 2, 1.0);
        assert_eq!(result.to_duplicate, vec![TaskId(2)]);
        assert_eq!(result.already_duplicated, vec![TaskId(1)]);
    }
}
