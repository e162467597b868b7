//! A unit of map work tracked by the scheduler.

use crate::error::{Error, Result};
use crate::types::TaskId;
use std::sync::Arc;
use std::time::Instant;

/// The lifecycle state of a [`Task`], folded into a single tagged field rather than the
/// independent `completed`/`in_progress` atomics the reference implementation uses (see
/// DESIGN.md's notes on §9 of SPEC_FULL.md). Owned and mutated exclusively by the scheduler
/// under its lock.
#[derive(Debug, Clone, Copy)]
enum TaskState {
    /// Not yet assigned to a node.
    Pending,
    /// Dispatched to a node at `speed_factor`, running since `started_at`.
    Running { started_at: Instant, speed_factor: f64 },
    /// Finished; `started_at`/`finished_at` bound its wall-clock duration.
    Done { started_at: Instant, finished_at: Instant },
}

/// A single map task: an opaque payload plus the timing/progress bookkeeping the LATE
/// speculation policy needs.
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    data: Arc<[u8]>,
    is_speculative: bool,
    state: TaskState,
}

impl Task {
    /// Create a new, not-yet-started task.
    pub fn new(id: TaskId, data: impl Into<Arc<[u8]>>, is_speculative: bool) -> Self {
        Self {
            id,
            data: data.into(),
            is_speculative,
            state: TaskState::Pending,
        }
    }

    /// This task's id.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// The opaque payload handed to the node; the scheduler never interprets it.
    pub fn data(&self) -> Arc<[u8]> {
        Arc::clone(&self.data)
    }

    /// True for a speculative duplicate, fixed at construction.
    pub fn is_speculative(&self) -> bool {
        self.is_speculative
    }

    /// True from [`Task::mark_started`] until [`Task::mark_completed`].
    pub fn in_progress(&self) -> bool {
        matches!(self.state, TaskState::Running { .. })
    }

    /// True once [`Task::mark_completed`] has run.
    pub fn completed(&self) -> bool {
        matches!(self.state, TaskState::Done { .. })
    }

    /// Not yet dispatched to a node.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, TaskState::Pending)
    }

    /// Record dispatch to a node running at `speed_factor`. A usage error if the task is
    /// not `Pending` (already started, or already finished).
    pub fn mark_started(&mut self, speed_factor: f64) -> Result<()> {
        match self.state {
            TaskState::Pending => {
                self.state = TaskState::Running {
                    started_at: Instant::now(),
                    speed_factor,
                };
                Ok(())
            }
            _ => Err(Error::UsageError {
                message: format!("task {} marked started while not pending", self.id),
            }),
        }
    }

    /// Record completion. A usage error if the task was never started.
    pub fn mark_completed(&mut self) -> Result<()> {
        match self.state {
            TaskState::Running { started_at, .. } => {
                self.state = TaskState::Done {
                    started_at,
                    finished_at: Instant::now(),
                };
                Ok(())
            }
            _ => Err(Error::UsageError {
                message: format!("task {} marked completed while not running", self.id),
            }),
        }
    }

    /// Wall-clock duration in seconds, once completed.
    pub fn duration(&self) -> Option<f64> {
        match self.state {
            TaskState::Done { started_at, finished_at } => {
                Some((finished_at - started_at).as_secs_f64())
            }
            _ => None,
        }
    }

    /// Fraction of the expected unit of work done so far, in `[0, 1]`.
    ///
    /// `expected = 1 / speed_factor` is the simulation's "unit of work"; a task that has
    /// not started reports 0, one that has finished reports 1.
    pub fn progress(&self) -> f64 {
        match self.state {
            TaskState::Pending => 0.0,
            TaskState::Running { started_at, speed_factor } => {
                let elapsed = started_at.elapsed().as_secs_f64();
                let expected = 1.0 / speed_factor;
                (elapsed / expected).min(1.0)
            }
            TaskState::Done { .. } => 1.0,
        }
    }

    /// `progress() / elapsed`; zero while elapsed is zero (task just dispatched).
    pub fn progress_rate(&self) -> f64 {
        match self.state {
            TaskState::Running { started_at, .. } => {
                let elapsed = started_at.elapsed().as_secs_f64();
                if elapsed == 0.0 {
                    0.0
                } else {
                    self.progress() / elapsed
                }
            }
            _ => 0.0,
        }
    }

    /// LATE estimator: linear extrapolation from the current progress rate to completion.
    /// Returns `sentinel` (an intentionally large value) when the rate is still zero, so
    /// that just-started tasks read as "very slow" rather than "instantaneous" (§4.1).
    pub fn eta_remaining(&self, sentinel: f64) -> f64 {
        let rate = self.progress_rate();
        if rate == 0.0 {
            sentinel
        } else {
            (1.0 - self.progress()) / rate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn fresh_task_is_pending() {
        let task = Task::new(TaskId(1), b"abc".to_vec(), false);
        assert!(task.is_pending());
        assert!(!task.in_progress());
        assert!(!task.completed());
        assert_eq!(task.progress(), 0.0);
        assert_eq!(task.duration(), None);
    }

    #[test]
    fn double_start_is_usage_error() {
        let mut task = Task::new(TaskId(1), b"abc".to_vec(), false);
        task.mark_started(1.0).unwrap();
        assert!(matches!(task.mark_started(1.0), Err(Error::UsageError { .. })));
    }

    #[test]
    fn complete_before_start_is_usage_error() {
        let mut task = Task::new(TaskId(1), b"abc".to_vec(), false);
        assert!(matches!(task.mark_completed(), Err(Error::UsageError { .. })));
    }

    #[test]
    fn completed_implies_not_in_progress_and_duration_present() {
        let mut task = Task::new(TaskId(1), b"abc".to_vec(), false);
        task.mark_started(10.0).unwrap();
        sleep(Duration::from_millis(5));
        task.mark_completed().unwrap();
        assert!(task.completed());
        assert!(!task.in_progress());
        assert!(task.duration().unwrap() >= 0.0);
        assert_eq!(task.progress(), 1.0);
    }

    #[test]
    fn just_started_task_has_large_eta() {
        let mut task = Task::new(TaskId(1), b"abc".to_vec(), false);
        task.mark_started(1.0).unwrap();
        // Elapsed is ~0 immediately after dispatch, so the progress rate is ~0 and the
        // sentinel kicks in: a just-started task reads as "very slow".
        assert_eq!(task.eta_remaining(9999.0), 9999.0);
    }

    #[test]
    fn slow_node_progresses_slower_than_fast_node() {
        let mut slow = Task::new(TaskId(1), b"abc".to_vec(), false);
        let mut fast = Task::new(TaskId(2), b"abc".to_vec(), false);
        slow.mark_started(0.1).unwrap();
        fast.mark_started(10.0).unwrap();
        sleep(Duration::from_millis(20));
        assert!(fast.progress() > slow.progress());
    }
}
