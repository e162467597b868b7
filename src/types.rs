//! Common types shared across the scheduler core.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Task identifier.
///
/// Speculative duplicates of an original task `k` are assigned id `k + SPECULATIVE_ID_OFFSET`
/// (§6 of SPEC_FULL.md). Original ids must therefore stay below [`SPECULATIVE_ID_OFFSET`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Id offset applied to an original task's id to produce its speculative duplicate's id.
    pub const SPECULATIVE_ID_OFFSET: u64 = 10_000;

    /// True if this id lies in the speculative range (`id >= SPECULATIVE_ID_OFFSET`).
    pub fn is_speculative_range(self) -> bool {
        self.0 >= Self::SPECULATIVE_ID_OFFSET
    }

    /// The id of the speculative duplicate of this task, if this id were an original.
    pub fn speculative_id(self) -> TaskId {
        TaskId(self.0 + Self::SPECULATIVE_ID_OFFSET)
    }

    /// The id of the original task this id is a speculative duplicate of, if it is one.
    pub fn original_id(self) -> Option<TaskId> {
        self.is_speculative_range()
            .then(|| TaskId(self.0 - Self::SPECULATIVE_ID_OFFSET))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Worker node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
