//! Task aggregate root, creation options and the due-time ordering policy.

use super::{
    RetriesExhausted, RetrySchedule, TaskDomainError, TaskId, TaskPatch, TaskStatus, TaskType,
    UserId, timestamp,
};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Upper bound of [`Task::stage_progress`].
pub const MAX_STAGE_PROGRESS: u8 = 100;

/// Creation knobs for a new task.
///
/// Defaults match the scheduler's defaults: five retries with backoff
/// `[100, 200, 300, 500, 1000]` ms, ten concurrent runs, priority `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOptions {
    user_id: UserId,
    version: u32,
    max_retry_num: u32,
    retry_interval: RetrySchedule,
    max_running_num: u32,
    priority: i64,
    stage_conf: String,
    stage: String,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            user_id: UserId::default(),
            version: 0,
            max_retry_num: 5,
            retry_interval: RetrySchedule::default(),
            max_running_num: 10,
            priority: 0,
            stage_conf: String::new(),
            stage: String::new(),
        }
    }
}

impl TaskOptions {
    /// Creates options holding the scheduler defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the owning principal.
    #[must_use]
    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = user_id;
        self
    }

    /// Sets the executor schema version.
    #[must_use]
    pub const fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Sets the retry budget.
    #[must_use]
    pub const fn with_max_retry_num(mut self, max_retry_num: u32) -> Self {
        self.max_retry_num = max_retry_num;
        self
    }

    /// Sets the backoff table.
    #[must_use]
    pub fn with_retry_interval(mut self, retry_interval: RetrySchedule) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Sets the advisory concurrency cap for the task type.
    #[must_use]
    pub const fn with_max_running_num(mut self, max_running_num: u32) -> Self {
        self.max_running_num = max_running_num;
        self
    }

    /// Sets the priority in seconds; higher values become due earlier.
    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the multi-stage pipeline configuration.
    #[must_use]
    pub fn with_stage_conf(mut self, stage_conf: impl Into<String>) -> Self {
        self.stage_conf = stage_conf.into();
        self
    }

    /// Sets the initial pipeline stage.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = stage.into();
        self
    }
}

/// Task aggregate root.
///
/// Serializes to the scheduler's task JSON. Timestamps travel as Unix
/// seconds with millisecond precision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    task_id: TaskId,
    #[serde(rename = "type")]
    task_type: TaskType,
    version: u32,
    user_id: UserId,
    max_retry_num: u32,
    retry_interval: RetrySchedule,
    max_running_num: u32,
    priority: i64,
    #[serde(default)]
    stage_conf: String,
    #[serde(default)]
    stage: String,
    #[serde(default)]
    stage_progress: u8,
    status: TaskStatus,
    retry_index: u32,
    #[serde(default)]
    log: Vec<String>,
    context: String,
    #[serde(with = "super::timestamp")]
    order_time: DateTime<Utc>,
    #[serde(with = "super::timestamp")]
    create_time: DateTime<Utc>,
    #[serde(with = "super::timestamp")]
    modify_time: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Task identifier.
    pub task_id: TaskId,
    /// Executable kind.
    pub task_type: TaskType,
    /// Executor schema version.
    pub version: u32,
    /// Owning principal.
    pub user_id: UserId,
    /// Retry budget.
    pub max_retry_num: u32,
    /// Backoff table.
    pub retry_interval: RetrySchedule,
    /// Advisory concurrency cap.
    pub max_running_num: u32,
    /// Priority in seconds.
    pub priority: i64,
    /// Pipeline configuration.
    pub stage_conf: String,
    /// Current pipeline stage.
    pub stage: String,
    /// Progress of the current stage in percent.
    pub stage_progress: u8,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Retries consumed so far.
    pub retry_index: u32,
    /// Log lines.
    pub log: Vec<String>,
    /// Opaque payload.
    pub context: String,
    /// Derived due time.
    pub order_time: DateTime<Utc>,
    /// Creation timestamp.
    pub create_time: DateTime<Utc>,
    /// Latest modification timestamp.
    pub modify_time: DateTime<Utc>,
}

impl Task {
    /// Creates a task with default options.
    #[must_use]
    pub fn new(task_type: TaskType, context: impl Into<String>, clock: &impl Clock) -> Self {
        Self::with_options(task_type, context, TaskOptions::default(), clock)
    }

    /// Creates a task in [`TaskStatus::Created`] with the given options.
    ///
    /// `order_time` starts at `create_time - priority`.
    #[must_use]
    pub fn with_options(
        task_type: TaskType,
        context: impl Into<String>,
        options: TaskOptions,
        clock: &impl Clock,
    ) -> Self {
        let now = timestamp::now(clock);
        Self {
            task_id: TaskId::new(),
            task_type,
            version: options.version,
            user_id: options.user_id,
            max_retry_num: options.max_retry_num,
            retry_interval: options.retry_interval,
            max_running_num: options.max_running_num,
            priority: options.priority,
            stage_conf: options.stage_conf,
            stage: options.stage,
            stage_progress: 0,
            status: TaskStatus::Created,
            retry_index: 0,
            log: Vec::new(),
            context: context.into(),
            order_time: shift_back(now, options.priority),
            create_time: now,
            modify_time: now,
        }
    }

    /// Reconstructs a task from persisted storage without validation.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            task_id: data.task_id,
            task_type: data.task_type,
            version: data.version,
            user_id: data.user_id,
            max_retry_num: data.max_retry_num,
            retry_interval: data.retry_interval,
            max_running_num: data.max_running_num,
            priority: data.priority,
            stage_conf: data.stage_conf,
            stage: data.stage,
            stage_progress: data.stage_progress,
            status: data.status,
            retry_index: data.retry_index,
            log: data.log,
            context: data.context,
            order_time: data.order_time,
            create_time: data.create_time,
            modify_time: data.modify_time,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.task_id
    }

    /// Returns the executable kind.
    #[must_use]
    pub const fn task_type(&self) -> &TaskType {
        &self.task_type
    }

    /// Returns the executor schema version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns the owning principal.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the retry budget.
    #[must_use]
    pub const fn max_retry_num(&self) -> u32 {
        self.max_retry_num
    }

    /// Returns the backoff table.
    #[must_use]
    pub const fn retry_interval(&self) -> &RetrySchedule {
        &self.retry_interval
    }

    /// Returns the advisory concurrency cap.
    #[must_use]
    pub const fn max_running_num(&self) -> u32 {
        self.max_running_num
    }

    /// Returns the priority in seconds.
    #[must_use]
    pub const fn priority(&self) -> i64 {
        self.priority
    }

    /// Returns the pipeline configuration.
    #[must_use]
    pub fn stage_conf(&self) -> &str {
        &self.stage_conf
    }

    /// Returns the current pipeline stage.
    #[must_use]
    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Returns the progress of the current stage in percent.
    #[must_use]
    pub const fn stage_progress(&self) -> u8 {
        self.stage_progress
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns how many retries have been consumed.
    #[must_use]
    pub const fn retry_index(&self) -> u32 {
        self.retry_index
    }

    /// Returns the log lines, oldest first.
    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Returns the opaque payload.
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Returns the derived due time. Lower sorts first.
    #[must_use]
    pub const fn order_time(&self) -> DateTime<Utc> {
        self.order_time
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn create_time(&self) -> DateTime<Utc> {
        self.create_time
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn modify_time(&self) -> DateTime<Utc> {
        self.modify_time
    }

    /// Returns how many more times the task may enter
    /// [`TaskStatus::WaitForRetry`].
    #[must_use]
    pub fn remaining_retries(&self) -> u32 {
        self.max_retry_num
            .min(self.retry_interval.len())
            .saturating_sub(self.retry_index)
    }

    /// Returns `true` when the task is queued and its due time has passed.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status.is_queued() && self.order_time <= now
    }

    /// Bookkeeping after any mutation: advances `modify_time` and
    /// recomputes `order_time`.
    ///
    /// `modify_time` never moves backwards.
    ///
    /// # Errors
    ///
    /// Returns [`RetriesExhausted`] when the task waits for a retry that has
    /// no backoff entry. The task is left untouched in that case.
    pub fn on_update(&mut self, clock: &impl Clock) -> Result<(), RetriesExhausted> {
        let modify_time = timestamp::now(clock).max(self.modify_time);
        let order_time = self.order_time_at(modify_time)?;
        self.modify_time = modify_time;
        self.order_time = order_time;
        Ok(())
    }

    /// Recomputes `order_time` from the current fields.
    ///
    /// # Errors
    ///
    /// Returns [`RetriesExhausted`] when the task waits for a retry that has
    /// no backoff entry.
    pub fn reset_order_time(&mut self) -> Result<(), RetriesExhausted> {
        self.order_time = self.order_time_at(self.modify_time)?;
        Ok(())
    }

    /// Moves the task to `next` when the transition table permits it.
    ///
    /// Entering [`TaskStatus::WaitForRetry`] requires a retry left in the
    /// budget; leaving it for [`TaskStatus::Scheduled`] consumes that retry.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] for moves outside
    /// the table and [`TaskDomainError::RetriesExhausted`] when no retry is
    /// left. The task is unchanged on error.
    pub fn transition_to(
        &mut self,
        next: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(next) {
            return Err(TaskDomainError::InvalidStatusTransition {
                task_id: self.task_id.clone(),
                from: self.status,
                to: next,
            });
        }
        if next == TaskStatus::WaitForRetry {
            self.ensure_retry_available()
                .map_err(|source| self.retries_exhausted(source))?;
        }

        let consumes_retry =
            self.status == TaskStatus::WaitForRetry && next == TaskStatus::Scheduled;
        self.mutate(clock, |task| {
            task.status = next;
            if consumes_retry {
                task.retry_index = task.retry_index.saturating_add(1);
            }
        })
    }

    /// Finishes the running stage and queues `stage` as the next one.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] unless the task is
    /// running.
    pub fn enter_next_stage(
        &mut self,
        stage: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(TaskStatus::WaitForNextStage) {
            return Err(TaskDomainError::InvalidStatusTransition {
                task_id: self.task_id.clone(),
                from: self.status,
                to: TaskStatus::WaitForNextStage,
            });
        }
        let stage = stage.into();
        self.mutate(clock, |task| {
            task.status = TaskStatus::WaitForNextStage;
            task.stage = stage;
            task.stage_progress = 0;
        })
    }

    /// Records progress of the current stage.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStageProgress`] above 100.
    pub fn set_stage_progress(
        &mut self,
        percent: u8,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if percent > MAX_STAGE_PROGRESS {
            return Err(TaskDomainError::InvalidStageProgress(percent));
        }
        self.mutate(clock, |task| task.stage_progress = percent)
    }

    /// Appends one log line.
    ///
    /// # Errors
    ///
    /// Propagates [`Task::on_update`] failures.
    pub fn append_log(
        &mut self,
        entry: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let entry = entry.into();
        self.mutate(clock, |task| task.log.push(entry))
    }

    /// Replaces the opaque payload.
    ///
    /// # Errors
    ///
    /// Propagates [`Task::on_update`] failures.
    pub fn set_context(
        &mut self,
        context: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let context = context.into();
        self.mutate(clock, |task| task.context = context)
    }

    /// Changes the priority and re-derives the due time.
    ///
    /// # Errors
    ///
    /// Propagates [`Task::on_update`] failures.
    pub fn set_priority(&mut self, priority: i64, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.mutate(clock, |task| task.priority = priority)
    }

    /// Overwrites the fields populated in `patch`, without transition checks.
    ///
    /// This mirrors the scheduler applying a field-masked update; the stored
    /// `order_time` and `modify_time` are taken from the patch when present.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(status) = patch.status() {
            self.status = status;
        }
        if let Some(priority) = patch.priority() {
            self.priority = priority;
        }
        if let Some(stage_conf) = patch.stage_conf() {
            stage_conf.clone_into(&mut self.stage_conf);
        }
        if let Some(stage) = patch.stage() {
            stage.clone_into(&mut self.stage);
        }
        if let Some(stage_progress) = patch.stage_progress() {
            self.stage_progress = stage_progress;
        }
        if let Some(retry_index) = patch.retry_index() {
            self.retry_index = retry_index;
        }
        if let Some(log) = patch.log() {
            self.log = log.to_vec();
        }
        if let Some(context) = patch.context() {
            context.clone_into(&mut self.context);
        }
        if let Some(max_retry_num) = patch.max_retry_num() {
            self.max_retry_num = max_retry_num;
        }
        if let Some(retry_interval) = patch.retry_interval() {
            self.retry_interval = retry_interval.clone();
        }
        if let Some(max_running_num) = patch.max_running_num() {
            self.max_running_num = max_running_num;
        }
        if let Some(order_time) = patch.order_time() {
            self.order_time = order_time;
        }
        if let Some(modify_time) = patch.modify_time() {
            self.modify_time = modify_time;
        }
    }

    /// Applies `change` to a copy, runs [`Task::on_update`] on it and commits
    /// only when bookkeeping succeeds.
    fn mutate(
        &mut self,
        clock: &impl Clock,
        change: impl FnOnce(&mut Self),
    ) -> Result<(), TaskDomainError> {
        let mut candidate = self.clone();
        change(&mut candidate);
        candidate
            .on_update(clock)
            .map_err(|source| self.retries_exhausted(source))?;
        *self = candidate;
        Ok(())
    }

    fn ensure_retry_available(&self) -> Result<(), RetriesExhausted> {
        if self.retry_index >= self.max_retry_num {
            return Err(RetriesExhausted {
                attempt: self.retry_index,
                limit: self.max_retry_num,
            });
        }
        self.retry_interval.delay_for(self.retry_index).map(|_| ())
    }

    fn retries_exhausted(&self, source: RetriesExhausted) -> TaskDomainError {
        TaskDomainError::RetriesExhausted {
            task_id: self.task_id.clone(),
            source,
        }
    }

    /// Due-time ordering policy.
    ///
    /// | status                | order time                                   |
    /// |-----------------------|----------------------------------------------|
    /// | `Created`             | `create_time - priority`                     |
    /// | `WaitForNextStage`    | `modify_time - priority`                     |
    /// | `WaitForRetry`        | `modify_time + retry_interval[retry_index]`  |
    /// | anything else         | unchanged                                    |
    fn order_time_at(&self, modify_time: DateTime<Utc>) -> Result<DateTime<Utc>, RetriesExhausted> {
        match self.status {
            TaskStatus::Created => Ok(shift_back(self.create_time, self.priority)),
            TaskStatus::WaitForNextStage => Ok(shift_back(modify_time, self.priority)),
            TaskStatus::WaitForRetry => {
                let delay = self.retry_interval.delay_for(self.retry_index)?;
                Ok(modify_time
                    .checked_add_signed(delay)
                    .unwrap_or(DateTime::<Utc>::MAX_UTC))
            }
            TaskStatus::Scheduled
            | TaskStatus::Running
            | TaskStatus::Final
            | TaskStatus::Failed
            | TaskStatus::Success => Ok(self.order_time),
        }
    }
}

/// Moves `time` earlier by `priority` seconds, saturating at the chrono
/// range limits.
fn shift_back(time: DateTime<Utc>, priority: i64) -> DateTime<Utc> {
    let saturated = if priority > 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    };
    TimeDelta::try_seconds(priority)
        .and_then(|delta| time.checked_sub_signed(delta))
        .unwrap_or(saturated)
}
