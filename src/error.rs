//! Error types for the LATE scheduler core.

use thiserror::Error;

/// Errors the scheduler core can surface to an embedder.
#[derive(Error, Debug)]
pub enum Error {
    /// `start()` called on a scheduler that is already running.
    #[error("scheduler is already running")]
    AlreadyRunning,

    /// `join()` called before `start()`.
    #[error("scheduler has not been started")]
    NotRunning,

    /// `add_node` was given a non-positive speed factor.
    #[error("invalid speed factor {factor}: must be > 0")]
    InvalidSpeedFactor {
        /// The rejected value.
        factor: f64,
    },

    /// `record_completion` was given a negative duration.
    #[error("invalid duration {duration}s: must be >= 0")]
    InvalidDuration {
        /// The rejected value.
        duration: f64,
    },

    /// A `SchedulerConfig` failed validation.
    #[error("invalid configuration: {message}")]
    Config {
        /// Human-readable description of what failed validation.
        message: String,
    },

    /// Some other caller-contract violation (e.g. a task marked started twice).
    #[error("usage error: {message}")]
    UsageError {
        /// Human-readable description of the violated contract.
        message: String,
    },
}

/// Result type alias for the scheduler core.
pub type Result<T> = std::result::Result<T, Error>;
