//! In-memory scheduler service speaking the envelope protocol.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{Task, TaskId, TaskStatus, TaskType},
    ports::{
        Envelope, QueryTaskData, SchedulerClientConfig, SchedulerTransport,
        SchedulerTransportError, SchedulerTransportResult, UpdateTaskRequest,
    },
};

/// Envelope code for malformed requests.
pub const CODE_BAD_REQUEST: i64 = 400;
/// Envelope code for unknown task identifiers or routes.
pub const CODE_NOT_FOUND: i64 = 404;
/// Envelope code for duplicate task identifiers.
pub const CODE_CONFLICT: i64 = 409;

/// Thread-safe in-memory stand-in for the remote scheduler.
///
/// Requests are answered with envelopes exactly as the remote service would,
/// so a [`crate::task::services::SchedulerClient`] can run against it
/// unchanged. Updates honour the field mask.
#[derive(Debug, Clone)]
pub struct InMemoryScheduler {
    state: Arc<RwLock<HashMap<TaskId, Task>>>,
    success_code: i64,
}

impl Default for InMemoryScheduler {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            success_code: SchedulerClientConfig::DEFAULT_SUCCESS_CODE,
        }
    }
}

enum Route<'a> {
    Create,
    Query(&'a str),
    Update(&'a str),
}

impl InMemoryScheduler {
    /// Creates an empty scheduler answering the default success code.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `success_code` on success instead of the default.
    #[must_use]
    pub const fn with_success_code(mut self, success_code: i64) -> Self {
        self.success_code = success_code;
        self
    }

    /// Returns a stored task.
    ///
    /// # Errors
    ///
    /// Returns transport errors when lock acquisition fails.
    pub fn task(&self, task_id: &TaskId) -> SchedulerTransportResult<Option<Task>> {
        Ok(self.read()?.get(task_id).cloned())
    }

    /// Returns the number of stored tasks.
    ///
    /// # Errors
    ///
    /// Returns transport errors when lock acquisition fails.
    pub fn len(&self) -> SchedulerTransportResult<usize> {
        Ok(self.read()?.len())
    }

    /// Returns queued tasks whose due time is at or before `now`, earliest
    /// first.
    ///
    /// Ties on `order_time` break on `create_time`, then on task id. Per
    /// task type, a task is only returned while the tasks already scheduled
    /// or running plus those returned ahead of it stay below its
    /// `max_running_num`.
    ///
    /// # Errors
    ///
    /// Returns transport errors when lock acquisition fails.
    pub fn due_tasks(&self, now: DateTime<Utc>) -> SchedulerTransportResult<Vec<Task>> {
        let tasks = self.read()?;

        let mut occupied: HashMap<&TaskType, u32> = HashMap::new();
        for task in tasks.values() {
            if matches!(task.status(), TaskStatus::Scheduled | TaskStatus::Running) {
                *occupied.entry(task.task_type()).or_default() += 1;
            }
        }

        let mut due: Vec<&Task> = tasks.values().filter(|task| task.is_due(now)).collect();
        due.sort_by(|left, right| {
            left.order_time()
                .cmp(&right.order_time())
                .then_with(|| left.create_time().cmp(&right.create_time()))
                .then_with(|| left.id().cmp(right.id()))
        });

        let mut dispatched = Vec::with_capacity(due.len());
        for task in due {
            let slots = occupied.entry(task.task_type()).or_default();
            if *slots < task.max_running_num() {
                *slots += 1;
                dispatched.push(task.clone());
            }
        }
        tracing::debug!(count = dispatched.len(), %now, "collected due tasks");
        Ok(dispatched)
    }

    fn read(&self) -> SchedulerTransportResult<RwLockReadGuard<'_, HashMap<TaskId, Task>>> {
        self.state
            .read()
            .map_err(|err| SchedulerTransportError::backend(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> SchedulerTransportResult<RwLockWriteGuard<'_, HashMap<TaskId, Task>>> {
        self.state
            .write()
            .map_err(|err| SchedulerTransportError::backend(std::io::Error::other(err.to_string())))
    }

    fn create(&self, body: &Value) -> SchedulerTransportResult<Value> {
        let task: Task = match serde_json::from_value(body.clone()) {
            Ok(task) => task,
            Err(err) => return failure(CODE_BAD_REQUEST, format!("invalid task: {err}")),
        };
        let mut tasks = self.write()?;
        if tasks.contains_key(task.id()) {
            return failure(CODE_CONFLICT, format!("duplicate task identifier: {}", task.id()));
        }
        tracing::debug!(task_id = %task.id(), "stored task");
        tasks.insert(task.id().clone(), task);
        self.success::<Value>(None)
    }

    fn query(&self, raw_id: &str) -> SchedulerTransportResult<Value> {
        let tasks = self.read()?;
        match lookup(&tasks, raw_id) {
            Some(task) => self.success(Some(QueryTaskData {
                task_data: Some(task.clone()),
            })),
            None => failure(CODE_NOT_FOUND, format!("task not found: {raw_id}")),
        }
    }

    fn update(&self, raw_id: &str, body: &Value) -> SchedulerTransportResult<Value> {
        let request: UpdateTaskRequest = match serde_json::from_value(body.clone()) {
            Ok(request) => request,
            Err(err) => return failure(CODE_BAD_REQUEST, format!("invalid update: {err}")),
        };
        let patch = match request.into_masked_patch() {
            Ok(patch) => patch,
            Err(err) => return failure(CODE_BAD_REQUEST, err.to_string()),
        };

        let not_found = || failure(CODE_NOT_FOUND, format!("task not found: {raw_id}"));
        let Ok(task_id) = TaskId::parse(raw_id) else {
            return not_found();
        };
        let mut tasks = self.write()?;
        let Some(task) = tasks.get_mut(&task_id) else {
            return not_found();
        };
        task.apply_patch(&patch);
        tracing::debug!(task_id = %raw_id, fields = ?patch.fields(), "applied task update");
        self.success::<Value>(None)
    }

    fn success<T: Serialize>(&self, data: Option<T>) -> SchedulerTransportResult<Value> {
        serde_json::to_value(Envelope::success(self.success_code, data))
            .map_err(SchedulerTransportError::decode)
    }
}

fn lookup<'a>(tasks: &'a HashMap<TaskId, Task>, raw_id: &str) -> Option<&'a Task> {
    TaskId::parse(raw_id)
        .ok()
        .and_then(|task_id| tasks.get(&task_id))
}

fn failure(code: i64, msg: String) -> SchedulerTransportResult<Value> {
    serde_json::to_value(Envelope::<Value>::failure(code, msg))
        .map_err(SchedulerTransportError::decode)
}

fn route(path: &str) -> Option<Route<'_>> {
    let mut segments = path.split('/').filter(|segment| !segment.is_empty());
    let route = match (segments.next(), segments.next(), segments.next()) {
        (Some("task"), Some("create"), None) => Route::Create,
        (Some("task"), Some("query"), Some(task_id)) => Route::Query(task_id),
        (Some("task"), Some("update"), Some(task_id)) => Route::Update(task_id),
        _ => return None,
    };
    segments.next().is_none().then_some(route)
}

#[async_trait]
impl SchedulerTransport for InMemoryScheduler {
    async fn get(&self, path: &str) -> SchedulerTransportResult<Value> {
        match route(path) {
            Some(Route::Query(task_id)) => self.query(task_id),
            _ => failure(CODE_NOT_FOUND, format!("no GET route for {path}")),
        }
    }

    async fn post(&self, path: &str, body: &Value) -> SchedulerTransportResult<Value> {
        match route(path) {
            Some(Route::Create) => self.create(body),
            Some(Route::Update(task_id)) => self.update(task_id, body),
            _ => failure(CODE_NOT_FOUND, format!("no POST route for {path}")),
        }
    }
}
