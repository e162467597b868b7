//! # late-scheduler
//!
//! A simulated MapReduce task scheduler implementing the LATE (Longest Approximate Time
//! to End) speculative-execution policy: rather than waiting for a fixed timeout, it ranks
//! in-flight tasks by estimated time remaining and re-dispatches the worst stragglers to a
//! second node while the original keeps running.
//!
//! ## Quick start
//!
//! ```no_run
//! use late_scheduler::{NodeId, Scheduler, SchedulerConfig, TaskId};
//!
//! let scheduler = Scheduler::new(SchedulerConfig::default())?;
//! scheduler.add_node(NodeId(0), 1.0)?;
//! scheduler.add_node(NodeId(1), 0.4)?;
//! scheduler.add_task(TaskId(0), b"chunk-0".to_vec());
//! scheduler.add_task(TaskId(1), b"chunk-1".to_vec());
//! scheduler.start()?;
//! scheduler.join()?;
//! println!("{:?}", scheduler.stats());
//! # Ok::<(), late_scheduler::Error>(())
//! ```
//!
//! ## Module map
//!
//! - [`types`]: [`TaskId`]/[`NodeId`] newtypes and the speculative-id encoding contract.
//! - [`task`]: per-task lifecycle state and progress/ETA arithmetic.
//! - [`node`]: per-node worker thread and dispatch channel.
//! - [`speculation`]: the pure LATE ranking/selection function.
//! - [`stats`]: the snapshot returned by [`Scheduler::stats`].
//! - [`config`]: [`SchedulerConfig`] and its TOML loading/validation.
//! - [`error`]: the crate's [`Error`] and [`Result`] types.
//! - [`scheduler`]: [`Scheduler`], the control loop tying the above together.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod node;
pub mod scheduler;
pub mod speculation;
pub mod stats;
pub mod task;
pub mod types;

pub use config::SchedulerConfig;
pub use error::{Error, Result};
pub use scheduler::Scheduler;
pub use speculation::{Candidate, Selection};
pub use stats::SchedulerStats;
pub use task::Task;
pub use types::{NodeId, TaskId};
