//! An immutable snapshot of scheduler-wide counters and per-task durations.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A point-in-time view of the scheduler's progress, safe to log, export as JSON, or
/// compare across polls. Returned by [`crate::Scheduler::stats`] under the scheduler lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Count of tasks ever added, originals and speculatives combined.
    pub total_tasks: usize,

    /// Count of speculative tasks created so far.
    pub speculative_tasks: usize,

    /// Count of stragglers detected so far; equal to `speculative_tasks` in this design
    /// (kept distinct for future policies that detect without duplicating, §6).
    pub stragglers_detected: usize,

    /// Count of completion callbacks received so far.
    pub tasks_completed: usize,

    /// Wall-clock duration in seconds recorded for each completed task, keyed by the raw
    /// numeric task id (a [`crate::types::TaskId`]'s `.0`) rather than the newtype itself,
    /// so the snapshot serializes to JSON with ordinary string-keyed objects.
    pub task_durations: HashMap<u64, f64>,

    /// Echo of the scheduler's configured straggler percentile.
    pub straggler_percentile: f64,
}

impl SchedulerStats {
    pub(crate) fn new(straggler_percentile: f64) -> Self {
        Self {
            total_tasks: 0,
            speculative_tasks: 0,
            stragglers_detected: 0,
            tasks_completed: 0,
            task_durations: HashMap::new(),
            straggler_percentile,
        }
    }
}
