//! Domain model for the scheduled task lifecycle.
//!
//! The task domain models task creation, the status transition table, retry
//! backoff and the due-time ordering policy while keeping transport concerns
//! outside of the domain boundary.

mod error;
mod ids;
mod patch;
mod retry;
mod status;
mod task;
mod timestamp;

pub use error::{ParseTaskStatusError, RetriesExhausted, TaskDomainError};
pub use ids::{TaskId, TaskType, UserId};
pub use patch::{TaskField, TaskPatch, UnknownTaskFieldError};
pub use retry::RetrySchedule;
pub use status::TaskStatus;
pub use task::{MAX_STAGE_PROGRESS, PersistedTaskData, Task, TaskOptions};
