//! RPC client submitting, fetching and updating tasks on the scheduler.

use crate::task::{
    domain::{Task, TaskDomainError, TaskField, TaskId, TaskPatch, TaskStatus},
    ports::{
        Envelope, QueryTaskData, SchedulerClientConfig, SchedulerTransport,
        SchedulerTransportError, UpdateTaskRequest,
        protocol::{CREATE_TASK_PATH, query_task_path, update_task_path},
    },
};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Fields a status transition may touch, sent after
/// [`SchedulerClient::transition_task`].
const TRANSITION_FIELDS: [TaskField; 6] = [
    TaskField::Status,
    TaskField::RetryIndex,
    TaskField::Stage,
    TaskField::StageProgress,
    TaskField::OrderTime,
    TaskField::ModifyTime,
];

/// Client-level errors for scheduler operations.
#[derive(Debug, Error)]
pub enum SchedulerClientError {
    /// The scheduler answered a non-success envelope code.
    #[error("scheduler rejected the request with code {code}: {message}")]
    Rejected {
        /// Envelope code.
        code: i64,
        /// Server-provided detail.
        message: String,
    },

    /// The query answer carried no `taskData`.
    #[error("scheduler returned no task data for {0}")]
    MissingTaskData(TaskId),

    /// The request body could not be encoded.
    #[error("failed to encode scheduler request: {0}")]
    Encode(#[source] serde_json::Error),

    /// The response envelope or its payload could not be decoded.
    #[error("malformed scheduler response: {0}")]
    Decode(#[source] serde_json::Error),

    /// A local task mutation was rejected before reaching the scheduler.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The transport failed.
    #[error(transparent)]
    Transport(#[from] SchedulerTransportError),
}

/// Result type for scheduler client operations.
pub type SchedulerClientResult<T> = Result<T, SchedulerClientError>;

/// Scheduler RPC client.
///
/// No retries and no backoff happen at this layer; every failure is returned
/// to the caller.
pub struct SchedulerClient<T>
where
    T: SchedulerTransport,
{
    transport: Arc<T>,
    success_code: i64,
}

impl<T> Clone for SchedulerClient<T>
where
    T: SchedulerTransport,
{
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            success_code: self.success_code,
        }
    }
}

impl<T> SchedulerClient<T>
where
    T: SchedulerTransport,
{
    /// Creates a client expecting the default success code.
    #[must_use]
    pub const fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            success_code: SchedulerClientConfig::DEFAULT_SUCCESS_CODE,
        }
    }

    /// Creates a client using the success code from `config`.
    #[must_use]
    pub const fn from_config(transport: Arc<T>, config: &SchedulerClientConfig) -> Self {
        Self {
            transport,
            success_code: config.success_code(),
        }
    }

    /// Returns the envelope code treated as success.
    #[must_use]
    pub const fn success_code(&self) -> i64 {
        self.success_code
    }

    /// Submits a new task.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerClientError::Rejected`] carrying the server's
    /// message when the envelope code is not the success code, or transport
    /// and codec errors.
    #[tracing::instrument(skip_all, fields(task_id = %task.id(), task_type = %task.task_type()))]
    pub async fn submit_task(&self, task: &Task) -> SchedulerClientResult<()> {
        let body = serde_json::to_value(task).map_err(SchedulerClientError::Encode)?;
        let response = self.transport.post(CREATE_TASK_PATH, &body).await?;
        self.open_envelope(response)?;
        tracing::info!("task submitted");
        Ok(())
    }

    /// Fetches a task by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerClientError::Rejected`] for non-success envelopes,
    /// [`SchedulerClientError::MissingTaskData`] when the answer has no
    /// `taskData`, or transport and codec errors.
    #[tracing::instrument(skip_all, fields(%task_id))]
    pub async fn get_task(&self, task_id: &TaskId) -> SchedulerClientResult<Task> {
        let response = self.transport.get(&query_task_path(task_id)).await?;
        let data = self
            .open_envelope(response)?
            .filter(|data| !data.is_null())
            .map(serde_json::from_value::<QueryTaskData>)
            .transpose()
            .map_err(SchedulerClientError::Decode)?;

        data.and_then(|data| data.task_data)
            .ok_or_else(|| SchedulerClientError::MissingTaskData(task_id.clone()))
    }

    /// Sends a field-masked update.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerClientError::Rejected`] for non-success envelopes,
    /// or transport and codec errors.
    #[tracing::instrument(skip_all, fields(%task_id, fields = ?request.field_masks()))]
    pub async fn update_task(
        &self,
        task_id: &TaskId,
        request: &UpdateTaskRequest,
    ) -> SchedulerClientResult<()> {
        if request.is_empty() {
            tracing::warn!("sending an update without masked fields");
        }
        let body = serde_json::to_value(request).map_err(SchedulerClientError::Encode)?;
        let response = self
            .transport
            .post(&update_task_path(task_id), &body)
            .await?;
        self.open_envelope(response)?;
        Ok(())
    }

    /// Sends the current values of `fields` from a local task.
    ///
    /// # Errors
    ///
    /// Same as [`SchedulerClient::update_task`].
    pub async fn update_task_fields(
        &self,
        task: &Task,
        fields: impl IntoIterator<Item = TaskField>,
    ) -> SchedulerClientResult<()> {
        let request = UpdateTaskRequest::from(TaskPatch::from_task(task, fields));
        self.update_task(task.id(), &request).await
    }

    /// Applies a validated status transition locally and mirrors it on the
    /// scheduler.
    ///
    /// The local task is only changed when the transition table allows the
    /// move. It stays changed if the scheduler then rejects the update.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerClientError::Domain`] for rejected transitions,
    /// otherwise the errors of [`SchedulerClient::update_task`].
    pub async fn transition_task<C>(
        &self,
        task: &mut Task,
        next: TaskStatus,
        clock: &C,
    ) -> SchedulerClientResult<()>
    where
        C: Clock + Send + Sync,
    {
        task.transition_to(next, clock)?;
        self.update_task_fields(task, TRANSITION_FIELDS).await
    }

    /// Checks the envelope code and returns the raw payload.
    fn open_envelope(&self, response: Value) -> SchedulerClientResult<Option<Value>> {
        let envelope: Envelope<Value> =
            serde_json::from_value(response).map_err(SchedulerClientError::Decode)?;
        if envelope.code != self.success_code {
            let message = envelope.msg.unwrap_or_default();
            tracing::warn!(code = envelope.code, %message, "scheduler rejected request");
            return Err(SchedulerClientError::Rejected {
                code: envelope.code,
                message,
            });
        }
        Ok(envelope.data)
    }
}
