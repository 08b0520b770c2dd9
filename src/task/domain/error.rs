//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task identifier is empty after trimming.
    #[error("task identifier must not be empty")]
    EmptyTaskId,

    /// The task type is empty after trimming.
    #[error("task type must not be empty")]
    EmptyTaskType,

    /// The owning user identifier is empty after trimming.
    #[error("user identifier must not be empty")]
    EmptyUserId,

    /// The requested status change is not in the transition table.
    #[error("invalid status transition for task {task_id}: {from} -> {to}")]
    InvalidStatusTransition {
        /// Task identifier.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// The task cannot wait for another retry.
    #[error("task {task_id} has no retries left: {source}")]
    RetriesExhausted {
        /// Task identifier.
        task_id: TaskId,
        /// Underlying retry-table failure.
        #[source]
        source: RetriesExhausted,
    },

    /// Stage progress is a percentage and must not exceed 100.
    #[error("stage progress {0} is out of range, expected 0..=100")]
    InvalidStageProgress(u8),
}

/// Returned when a retry attempt has no entry in the retry table or the
/// retry budget is spent.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("retry attempt {attempt} exceeds the retry budget of {limit}")]
pub struct RetriesExhausted {
    /// Zero-based retry attempt that was requested.
    pub attempt: u32,
    /// Number of attempts available.
    pub limit: u32,
}

/// Error returned while parsing task statuses from wire codes or names.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
