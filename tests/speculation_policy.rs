//! Property tests for the pure LATE ranking/selection arithmetic, independent of real
//! wall-clock timing (AMBIENT-4).

use late_scheduler::speculation::{select_stragglers, Candidate};
use late_scheduler::TaskId;
use proptest::prelude::*;
use std::collections::HashSet;

fn candidate_strategy() -> impl Strategy<Value = Candidate> {
    (0u64..1000, 0.0f64..10_000.0).prop_map(|(id, eta)| Candidate {
        id: TaskId(id),
        eta_remaining: eta,
    })
}

fn candidates_strategy() -> impl Strategy<Value = Vec<Candidate>> {
    prop::collection::vec(candidate_strategy(), 0..30).prop_map(|mut cands| {
        // ids must be unique; the scheduler never produces duplicate candidate ids in a
        // single tick.
        let mut seen = HashSet::new();
        cands.retain(|c| seen.insert(c.id));
        cands
    })
}

proptest! {
    /// The to-duplicate selection never exceeds `speculative_limit`, regardless of
    /// candidate count (skipped already-duplicated candidates still consume a slot of
    /// the ranking window, but never grow the to-duplicate list beyond the limit).
    #[test]
    fn never_exceeds_speculative_limit(
        candidates in candidates_strategy(),
        speculative_limit in 0usize..10,
        straggler_percentile in 0.0f64..=1.0,
    ) {
        let result = select_stragglers(&candidates, |_| false, speculative_limit, straggler_percentile);
        prop_assert!(result.to_duplicate.len() <= speculative_limit);
    }

    /// Every selected id was actually a candidate.
    #[test]
    fn selection_is_a_subset_of_candidates(
        candidates in candidates_strategy(),
        speculative_limit in 0usize..10,
        straggler_percentile in 0.0f64..=1.0,
    ) {
        let ids: HashSet<TaskId> = candidates.iter().map(|c| c.id).collect();
        let result = select_stragglers(&candidates, |_| false, speculative_limit, straggler_percentile);
        for id in result.to_duplicate {
            prop_assert!(ids.contains(&id));
        }
    }

    /// Selected candidates are exactly a prefix of the descending-eta ranking (modulo
    /// dedup filtering), so any two selected ids preserve the "worse eta ranked first"
    /// ordering relative to the full candidate set.
    #[test]
    fn selected_etas_are_non_increasing_in_selection_order(
        candidates in candidates_strategy(),
        speculative_limit in 1usize..10,
    ) {
        prop_assume!(!candidates.is_empty());
        let result = select_stragglers(&candidates, |_| false, speculative_limit, 1.0);
        let etas: Vec<f64> = result
            .to_duplicate
            .iter()
            .map(|id| candidates.iter().find(|c| c.id == *id).unwrap().eta_remaining)
            .collect();
        for pair in etas.windows(2) {
            prop_assert!(pair[0] >= pair[1]);
        }
    }

    /// A candidate reported as already having a duplicate is never re-selected for a new
    /// duplicate — it surfaces in `already_duplicated` instead — and no candidate beyond
    /// the original ranking window backfills its slot.
    #[test]
    fn already_duplicated_candidates_are_excluded(
        candidates in candidates_strategy(),
        speculative_limit in 1usize..10,
    ) {
        prop_assume!(!candidates.is_empty());
        let excluded = candidates[0].id;
        let result = select_stragglers(&candidates, |id| id == excluded, speculative_limit, 1.0);
        prop_assert!(!result.to_duplicate.contains(&excluded));
    }

    /// `speculative_limit = 0` always yields nothing.
    #[test]
    fn zero_limit_always_yields_nothing(candidates in candidates_strategy(), straggler_percentile in 0.0f64..=1.0) {
        let result = select_stragglers(&candidates, |_| false, 0, straggler_percentile);
        prop_assert!(result.to_duplicate.is_empty());
        prop_assert!(result.already_duplicated.is_empty());
    }

    /// An empty candidate set always yields nothing, for any limit/percentile.
    #[test]
    fn empty_candidates_always_yields_nothing(speculative_limit in 0usize..10, straggler_percentile in 0.0f64..=1.0) {
        let result = select_stragglers(&[], |_| false, speculative_limit, straggler_percentile);
        prop_assert!(result.to_duplicate.is_empty());
        prop_assert!(result.already_duplicated.is_empty());
    }
}
