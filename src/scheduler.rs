//! The control loop: assigns tasks to idle nodes, runs the LATE speculation policy, and
//! aggregates completion statistics.

use crate::config::SchedulerConfig;
use crate::error::{Error, Result};
use crate::node::{Completion, NodeHandle};
use crate::speculation::{select_stragglers, Candidate};
use crate::stats::SchedulerStats;
use crate::task::Task;
use crate::types::{NodeId, TaskId};

use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// All state guarded by the scheduler's single mutex (§5 of SPEC_FULL.md): the node
/// roster, the append-only task list, and the running statistics.
struct Inner {
    nodes: Vec<NodeHandle>,
    tasks: Vec<Task>,
    stats: SchedulerStats,
}

/// The LATE speculative-execution scheduler.
///
/// Construct with [`Scheduler::new`], register nodes and tasks, call [`Scheduler::start`],
/// poll [`Scheduler::stats`] as desired, and call [`Scheduler::join`] to wait for
/// completion.
pub struct Scheduler {
    config: SchedulerConfig,
    inner: Mutex<Inner>,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
    running: AtomicBool,
    control_thread: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Create a scheduler with the given configuration, validating it first.
    pub fn new(config: SchedulerConfig) -> Result<Arc<Self>> {
        config.validate()?;
        let (completion_tx, completion_rx) = unbounded();
        let stats = SchedulerStats::new(config.straggler_percentile);
        Ok(Arc::new(Self {
            config,
            inner: Mutex::new(Inner {
                nodes: Vec::new(),
                tasks: Vec::new(),
                stats,
            }),
            completion_tx,
            completion_rx,
            running: AtomicBool::new(false),
            control_thread: Mutex::new(None),
        }))
    }

    /// Create a scheduler using [`SchedulerConfig::default`] (`speculative_limit = 2`,
    /// `straggler_percentile = 0.2`, per §6).
    pub fn with_defaults() -> Arc<Self> {
        Self::new(SchedulerConfig::default()).expect("default configuration is always valid")
    }

    /// Register a worker node, pre-start only. `speed_factor` must be positive.
    pub fn add_node(&self, id: NodeId, speed_factor: f64) -> Result<()> {
        if speed_factor <= 0.0 {
            warn!(node = id.0, speed_factor, "rejecting non-positive speed factor");
            return Err(Error::InvalidSpeedFactor { factor: speed_factor });
        }
        if self.running.load(Ordering::Acquire) {
            return Err(Error::UsageError {
                message: format!("cannot add node {id} after the scheduler has started"),
            });
        }
        let node = NodeHandle::spawn(id, speed_factor, self.completion_tx.clone());
        self.inner.lock().nodes.push(node);
        info!(node = id.0, speed_factor, "node registered");
        Ok(())
    }

    /// Enqueue an original task. Safe to call before or after [`Scheduler::start`].
    pub fn add_task(&self, id: TaskId, data: impl Into<Arc<[u8]>>) {
        self.add_task_inner(id, data.into(), false);
    }

    fn add_task_inner(&self, id: TaskId, data: Arc<[u8]>, is_speculative: bool) {
        let mut inner = self.inner.lock();
        inner.tasks.push(Task::new(id, data, is_speculative));
        inner.stats.total_tasks += 1;
        info!(task = id.0, is_speculative, "task registered");
    }

    /// Launch the control loop on a dedicated thread. Precondition: not already running.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyRunning);
        }
        info!("scheduler starting");
        let scheduler = Arc::clone(self);
        let handle = thread::Builder::new()
            .name("late-scheduler-control".to_string())
            .spawn(move || scheduler.control_loop())
            .expect("failed to spawn control thread");
        *self.control_thread.lock() = Some(handle);
        Ok(())
    }

    /// Block until the control loop has observed every task complete.
    pub fn join(&self) -> Result<()> {
        let handle = self.control_thread.lock().take();
        match handle {
            Some(handle) => {
                let _ = handle.join();
                Ok(())
            }
            None => Err(Error::NotRunning),
        }
    }

    /// Take an immutable snapshot of current counts and durations.
    pub fn stats(&self) -> SchedulerStats {
        self.inner.lock().stats.clone()
    }

    fn control_loop(self: Arc<Self>) {
        loop {
            self.drain_completions();
            self.assign_phase();
            self.monitor_phase();

            let done = {
                let inner = self.inner.lock();
                inner.stats.total_tasks > 0 && inner.stats.tasks_completed >= inner.stats.total_tasks
            };
            if done {
                break;
            }
            thread::sleep(self.config.tick_interval);
        }
        self.running.store(false, Ordering::Release);
        info!("scheduler finished");
    }

    /// Apply every completion message nodes have posted since the previous tick, so the
    /// assign and monitor phases observe up-to-date state (§4.3 control-loop step 1).
    fn drain_completions(&self) {
        while let Ok(completion) = self.completion_rx.try_recv() {
            let duration = completion.duration.as_secs_f64();
            self.apply_completion(completion.task_id, duration, Some(completion.node_id));
        }
    }

    /// Report a task's completion and its wall-clock `duration_secs`. This is the same
    /// contract a node's worker thread uses internally via its completion channel (§4.3),
    /// exposed publicly so an embedder supplying its own execution backend can report
    /// completions directly. A negative duration is rejected at the boundary: logged and
    /// left as a no-op, per §7/AMBIENT-3.
    pub fn record_completion(&self, task_id: TaskId, duration_secs: f64) -> Result<()> {
        if duration_secs < 0.0 {
            warn!(task = task_id.0, duration = duration_secs, "rejecting negative-duration completion");
            return Err(Error::InvalidDuration { duration: duration_secs });
        }
        self.apply_completion(task_id, duration_secs, None);
        Ok(())
    }

    /// Mark `task_id` completed and fold its duration into the stats snapshot. Assumes
    /// `duration_secs` has already been validated non-negative by the caller.
    fn apply_completion(&self, task_id: TaskId, duration_secs: f64, node_id: Option<NodeId>) {
        let mut inner = self.inner.lock();
        let marked = match inner.tasks.iter_mut().find(|t| t.id() == task_id) {
            Some(task) => task.mark_completed(),
            None => {
                warn!(task = task_id.0, "completion for unknown task id, ignoring");
                return;
            }
        };
        if let Err(e) = marked {
            warn!(task = task_id.0, error = %e, "ignoring duplicate completion");
            return;
        }

        inner.stats.tasks_completed += 1;
        inner.stats.task_durations.insert(task_id.0, duration_secs);
        match node_id {
            Some(node_id) => info!(task = task_id.0, node = node_id.0, duration = duration_secs, "task completed"),
            None => info!(task = task_id.0, duration = duration_secs, "task completed"),
        }
    }

    /// Walk the node roster in order; dispatch the first pending task to each idle node.
    fn assign_phase(&self) {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        for node in inner.nodes.iter() {
            if !node.is_idle() {
                continue;
            }
            if let Some(task) = inner.tasks.iter_mut().find(|t| t.is_pending()) {
                if task.mark_started(node.speed_factor()).is_ok() {
                    debug!(node = node.id().0, task = task.id().0, "dispatching task to node");
                    node.dispatch(task.id(), task.data());
                }
            }
        }
    }

    /// The LATE speculation policy (§4.3.1): rank in-flight candidates by worst estimated
    /// time-to-end, and duplicate the worst few, at most one duplicate per original.
    fn monitor_phase(&self) {
        let mut inner = self.inner.lock();
        let cutoff = self.config.speculation_progress_cutoff;
        let sentinel = self.config.eta_unknown_sentinel;

        let candidates: Vec<Candidate> = inner
            .tasks
            .iter()
            .filter(|t| !t.completed() && !t.is_speculative() && t.in_progress() && t.progress() < cutoff)
            .map(|t| Candidate {
                id: t.id(),
                eta_remaining: t.eta_remaining(sentinel),
            })
            .collect();

        if candidates.is_empty() {
            return;
        }
        debug!(candidates = candidates.len(), "evaluating speculation candidates");

        let already_duplicated: HashSet<TaskId> = inner
            .tasks
            .iter()
            .filter(|t| t.is_speculative())
            .filter_map(|t| t.id().original_id())
            .collect();

        let selection = select_stragglers(
            &candidates,
            |id| already_duplicated.contains(&id),
            self.config.speculative_limit,
            self.config.straggler_percentile,
        );

        for skipped_id in selection.already_duplicated {
            warn!(
                original = skipped_id.0,
                "skipping speculative duplicate: a copy already exists"
            );
        }

        for original_id in selection.to_duplicate {
            let data = match inner.tasks.iter().find(|t| t.id() == original_id) {
                Some(task) => task.data(),
                None => continue,
            };
            let spec_id = original_id.speculative_id();
            inner.tasks.push(Task::new(spec_id, data, true));
            inner.stats.total_tasks += 1;
            inner.stats.speculative_tasks += 1;
            inner.stats.stragglers_detected += 1;
            info!(original = original_id.0, speculative = spec_id.0, "straggler detected");
        }
    }
}
