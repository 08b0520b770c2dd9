//! Scheduler wire protocol: endpoints, the response envelope and the
//! field-masked update request.

use crate::task::domain::{Task, TaskField, TaskId, TaskPatch, UnknownTaskFieldError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Endpoint accepting a full task for creation.
pub const CREATE_TASK_PATH: &str = "/task/create";

/// Returns the endpoint that answers a single task.
#[must_use]
pub fn query_task_path(task_id: &TaskId) -> String {
    format!("/task/query/{task_id}")
}

/// Returns the endpoint that applies a field-masked update.
#[must_use]
pub fn update_task_path(task_id: &TaskId) -> String {
    format!("/task/update/{task_id}")
}

/// Outer JSON wrapper of every scheduler response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Status code; one configured value means success.
    pub code: i64,
    /// Error detail on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    /// Payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Builds a success envelope.
    pub const fn success(code: i64, data: Option<T>) -> Self {
        Self {
            code,
            msg: None,
            data,
        }
    }

    /// Builds a failure envelope.
    pub fn failure(code: i64, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: Some(msg.into()),
            data: None,
        }
    }
}

/// Payload of the query endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryTaskData {
    /// Task snapshot.
    #[serde(rename = "taskData", default)]
    pub task_data: Option<Task>,
}

/// Body of the update endpoint.
///
/// The mask is derived from the patch on construction. The wire name
/// `filedMasks` is what the scheduler expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(rename = "filedMasks")]
    field_masks: Vec<String>,
    #[serde(rename = "taskData")]
    task_data: TaskPatch,
}

/// Errors raised while interpreting an update request on the receiving side.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpdateTaskRequestError {
    /// The mask names a field that is unknown or immutable.
    #[error(transparent)]
    UnknownField(#[from] UnknownTaskFieldError),

    /// The mask names a field absent from `taskData`.
    #[error("masked field '{0}' is missing from taskData")]
    MissingValue(TaskField),
}

impl UpdateTaskRequest {
    /// Returns the masked field names in wire form.
    #[must_use]
    pub fn field_masks(&self) -> &[String] {
        &self.field_masks
    }

    /// Returns the `taskData` payload.
    #[must_use]
    pub const fn task_data(&self) -> &TaskPatch {
        &self.task_data
    }

    /// Returns `true` when no field is masked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_masks.is_empty()
    }

    /// Reads the masked fields back into a patch, ignoring unmasked data.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateTaskRequestError`] when a mask is unknown or a masked
    /// value is missing.
    pub fn into_masked_patch(self) -> Result<TaskPatch, UpdateTaskRequestError> {
        let fields = self
            .field_masks
            .iter()
            .map(|mask| TaskField::try_from(mask.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(missing) = fields.iter().find(|field| !self.task_data.contains(**field)) {
            return Err(UpdateTaskRequestError::MissingValue(*missing));
        }
        Ok(self.task_data.retain(&fields))
    }
}

impl From<TaskPatch> for UpdateTaskRequest {
    fn from(patch: TaskPatch) -> Self {
        let field_masks = patch
            .fields()
            .into_iter()
            .map(|field| field.as_str().to_owned())
            .collect();
        Self {
            field_masks,
            task_data: patch,
        }
    }
}
