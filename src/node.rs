//! Worker nodes: one persistent worker thread per node, fed by a single-slot dispatch
//! channel, simulating opaque work proportional to `1 / speed_factor`.

use crate::types::{NodeId, TaskId};
use crossbeam::channel::{bounded, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::debug;

/// Work handed to a node's worker thread: everything it needs without touching the
/// scheduler's owned `Task` list directly (§9 of SPEC_FULL.md).
pub(crate) struct Dispatch {
    pub task_id: TaskId,
    pub data: Arc<[u8]>,
    pub speed_factor: f64,
}

/// A completion report posted back by a node's worker thread.
pub(crate) struct Completion {
    pub node_id: NodeId,
    pub task_id: TaskId,
    pub duration: Duration,
}

/// A registered worker node: a fixed speed factor and a persistent worker thread.
///
/// Rather than the reference implementation's fresh detached thread per dispatched task,
/// each node owns one long-lived worker thread fed by a bounded, size-1 channel — the
/// channel being full (or the node's `is_idle` flag being false) is structurally
/// equivalent to the original's `busy` atomic, but makes "one task per node at a time" a
/// property of the queue rather than a convention callers must honor.
pub struct NodeHandle {
    id: NodeId,
    speed_factor: f64,
    is_idle: Arc<AtomicBool>,
    dispatch_tx: Sender<Dispatch>,
    worker: Option<JoinHandle<()>>,
}

impl NodeHandle {
    /// Spawn a node with the given `speed_factor`, reporting completions on `completion_tx`.
    pub(crate) fn spawn(id: NodeId, speed_factor: f64, completion_tx: Sender<Completion>) -> Self {
        let (dispatch_tx, dispatch_rx) = bounded::<Dispatch>(1);
        let is_idle = Arc::new(AtomicBool::new(true));
        let worker_idle = Arc::clone(&is_idle);

        let worker = std::thread::Builder::new()
            .name(format!("late-scheduler-node-{}", id.0))
            .spawn(move || {
                for dispatch in dispatch_rx.iter() {
                    debug!(node = id.0, task = dispatch.task_id.0, "node picked up task");
                    let started_at = Instant::now();
                    simulate_work(1.0 / dispatch.speed_factor);
                    let duration = started_at.elapsed();
                    worker_idle.store(true, Ordering::Release);
                    let _ = completion_tx.send(Completion {
                        node_id: id,
                        task_id: dispatch.task_id,
                        duration,
                    });
                }
            })
            .expect("failed to spawn node worker thread");

        Self {
            id,
            speed_factor,
            is_idle,
            dispatch_tx,
            worker: Some(worker),
        }
    }

    /// This node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// This node's fixed speed factor.
    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    /// True if the node's dispatch slot is free.
    pub fn is_idle(&self) -> bool {
        self.is_idle.load(Ordering::Acquire)
    }

    /// Hand a task to this node. Precondition: [`NodeHandle::is_idle`]. Marks the node
    /// busy synchronously so a concurrent assign-phase scan never double-dispatches.
    pub(crate) fn dispatch(&self, task_id: TaskId, data: Arc<[u8]>) {
        self.is_idle.store(false, Ordering::Release);
        // Capacity-1 channel: this send cannot block because the previous occupant was
        // drained before `is_idle` was set back to true.
        let _ = self.dispatch_tx.send(Dispatch {
            task_id,
            data,
            speed_factor: self.speed_factor,
        });
    }
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        // Dropping `dispatch_tx` closes the channel, which ends the worker's `for` loop.
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl std::fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeHandle")
            .field("id", &self.id)
            .field("speed_factor", &self.speed_factor)
            .field("is_idle", &self.is_idle())
            .finish()
    }
}

/// The simulation's abstraction for "doing work": sleep for `duration_secs` seconds. A
/// real rewrite replaces this with the actual map function; the completion contract on
/// [`NodeHandle::dispatch`]/[`Completion`] is the only thing the scheduler relies on.
fn simulate_work(duration_secs: f64) {
    std::thread::sleep(Duration::from_secs_f64(duration_secs.max(0.0)));
}
