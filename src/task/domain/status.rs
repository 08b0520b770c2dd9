//! Task lifecycle status and its transition table.

use super::ParseTaskStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a scheduled task.
///
/// Serialized on the wire as the scheduler's integer status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TaskStatus {
    /// Task has been created and is waiting to be scheduled.
    Created,
    /// A failed attempt is waiting for its retry backoff to elapse.
    WaitForRetry,
    /// The current stage finished and the next stage is queued.
    WaitForNextStage,
    /// Task has been handed to an executor.
    Scheduled,
    /// Task is executing.
    Running,
    /// Task was finalized without completing, for example when cancelled.
    Final,
    /// Task failed and will not be retried.
    Failed,
    /// Task completed successfully.
    Success,
}

impl TaskStatus {
    /// Every status, in wire-code order.
    pub const ALL: [Self; 8] = [
        Self::Created,
        Self::WaitForRetry,
        Self::WaitForNextStage,
        Self::Scheduled,
        Self::Running,
        Self::Final,
        Self::Failed,
        Self::Success,
    ];

    /// Returns the scheduler's integer status code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Created => 1,
            Self::WaitForRetry => 2,
            Self::WaitForNextStage => 3,
            Self::Scheduled => 8,
            Self::Running => 9,
            Self::Final => 10,
            Self::Failed => 11,
            Self::Success => 12,
        }
    }

    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::WaitForRetry => "wait_for_retry",
            Self::WaitForNextStage => "wait_for_next_stage",
            Self::Scheduled => "scheduled",
            Self::Running => "running",
            Self::Final => "final",
            Self::Failed => "failed",
            Self::Success => "success",
        }
    }

    /// Returns `true` when no further transitions are allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Final | Self::Failed | Self::Success)
    }

    /// Returns `true` while the task sits in the scheduler queue waiting to
    /// become due.
    #[must_use]
    pub const fn is_queued(self) -> bool {
        matches!(
            self,
            Self::Created | Self::WaitForRetry | Self::WaitForNextStage
        )
    }

    /// Returns `true` when moving from `self` to `next` is permitted.
    ///
    /// Any non-terminal status may be finalized.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Created | Self::WaitForRetry | Self::WaitForNextStage, Self::Scheduled)
            | (Self::Scheduled, Self::Running)
            | (
                Self::Running,
                Self::Success | Self::Failed | Self::WaitForRetry | Self::WaitForNextStage,
            ) => true,
            (current, Self::Final) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<TaskStatus> for u8 {
    fn from(value: TaskStatus) -> Self {
        value.code()
    }
}

impl TryFrom<u8> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == value)
            .ok_or_else(|| ParseTaskStatusError(value.to_string()))
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseTaskStatusError(value.to_owned()))
    }
}
