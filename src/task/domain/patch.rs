//! Typed partial updates for tasks.
//!
//! A [`TaskPatch`] holds one optional slot per mutable task field. The field
//! mask sent to the scheduler is derived from the populated slots, so the
//! mask and the data cannot disagree.

use super::{RetrySchedule, Task, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Mutable task field, named as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskField {
    /// `status`
    Status,
    /// `priority`
    Priority,
    /// `stage_conf`
    StageConf,
    /// `stage`
    Stage,
    /// `stage_progress`
    StageProgress,
    /// `retry_index`
    RetryIndex,
    /// `log`
    Log,
    /// `context`
    Context,
    /// `max_retry_num`
    MaxRetryNum,
    /// `retry_interval`
    RetryInterval,
    /// `max_running_num`
    MaxRunningNum,
    /// `order_time`
    OrderTime,
    /// `modify_time`
    ModifyTime,
}

impl TaskField {
    /// Every patchable field.
    pub const ALL: [Self; 13] = [
        Self::Status,
        Self::Priority,
        Self::StageConf,
        Self::Stage,
        Self::StageProgress,
        Self::RetryIndex,
        Self::Log,
        Self::Context,
        Self::MaxRetryNum,
        Self::RetryInterval,
        Self::MaxRunningNum,
        Self::OrderTime,
        Self::ModifyTime,
    ];

    /// Returns the wire name of the field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Priority => "priority",
            Self::StageConf => "stage_conf",
            Self::Stage => "stage",
            Self::StageProgress => "stage_progress",
            Self::RetryIndex => "retry_index",
            Self::Log => "log",
            Self::Context => "context",
            Self::MaxRetryNum => "max_retry_num",
            Self::RetryInterval => "retry_interval",
            Self::MaxRunningNum => "max_running_num",
            Self::OrderTime => "order_time",
            Self::ModifyTime => "modify_time",
        }
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskField {
    type Error = UnknownTaskFieldError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == value)
            .ok_or_else(|| UnknownTaskFieldError(value.to_owned()))
    }
}

/// Error returned for field names that are not patchable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown or immutable task field: {0}")]
pub struct UnknownTaskFieldError(pub String);

/// Partial task update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stage_conf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stage_progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    retry_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    log: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_retry_num: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    retry_interval: Option<RetrySchedule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_running_num: Option<u32>,
    #[serde(
        default,
        with = "super::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    order_time: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "super::timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    modify_time: Option<DateTime<Utc>>,
}

impl TaskPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshots the selected fields of `task`.
    #[must_use]
    pub fn from_task(task: &Task, fields: impl IntoIterator<Item = TaskField>) -> Self {
        fields.into_iter().fold(Self::new(), |patch, field| match field {
            TaskField::Status => patch.with_status(task.status()),
            TaskField::Priority => patch.with_priority(task.priority()),
            TaskField::StageConf => patch.with_stage_conf(task.stage_conf()),
            TaskField::Stage => patch.with_stage(task.stage()),
            TaskField::StageProgress => patch.with_stage_progress(task.stage_progress()),
            TaskField::RetryIndex => patch.with_retry_index(task.retry_index()),
            TaskField::Log => patch.with_log(task.log().to_vec()),
            TaskField::Context => patch.with_context(task.context()),
            TaskField::MaxRetryNum => patch.with_max_retry_num(task.max_retry_num()),
            TaskField::RetryInterval => patch.with_retry_interval(task.retry_interval().clone()),
            TaskField::MaxRunningNum => patch.with_max_running_num(task.max_running_num()),
            TaskField::OrderTime => patch.with_order_time(task.order_time()),
            TaskField::ModifyTime => patch.with_modify_time(task.modify_time()),
        })
    }

    /// Returns the populated fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> Vec<TaskField> {
        TaskField::ALL
            .into_iter()
            .filter(|field| self.contains(*field))
            .collect()
    }

    /// Returns `true` when `field` is populated.
    #[must_use]
    pub const fn contains(&self, field: TaskField) -> bool {
        match field {
            TaskField::Status => self.status.is_some(),
            TaskField::Priority => self.priority.is_some(),
            TaskField::StageConf => self.stage_conf.is_some(),
            TaskField::Stage => self.stage.is_some(),
            TaskField::StageProgress => self.stage_progress.is_some(),
            TaskField::RetryIndex => self.retry_index.is_some(),
            TaskField::Log => self.log.is_some(),
            TaskField::Context => self.context.is_some(),
            TaskField::MaxRetryNum => self.max_retry_num.is_some(),
            TaskField::RetryInterval => self.retry_interval.is_some(),
            TaskField::MaxRunningNum => self.max_running_num.is_some(),
            TaskField::OrderTime => self.order_time.is_some(),
            TaskField::ModifyTime => self.modify_time.is_some(),
        }
    }

    /// Returns `true` when no field is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }

    /// Drops every populated field not listed in `fields`.
    #[must_use]
    pub fn retain(mut self, fields: &[TaskField]) -> Self {
        for field in TaskField::ALL {
            if !fields.contains(&field) {
                self.clear(field);
            }
        }
        self
    }

    fn clear(&mut self, field: TaskField) {
        match field {
            TaskField::Status => self.status = None,
            TaskField::Priority => self.priority = None,
            TaskField::StageConf => self.stage_conf = None,
            TaskField::Stage => self.stage = None,
            TaskField::StageProgress => self.stage_progress = None,
            TaskField::RetryIndex => self.retry_index = None,
            TaskField::Log => self.log = None,
            TaskField::Context => self.context = None,
            TaskField::MaxRetryNum => self.max_retry_num = None,
            TaskField::RetryInterval => self.retry_interval = None,
            TaskField::MaxRunningNum => self.max_running_num = None,
            TaskField::OrderTime => self.order_time = None,
            TaskField::ModifyTime => self.modify_time = None,
        }
    }

    /// Sets `status`.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets `priority`.
    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets `stage_conf`.
    #[must_use]
    pub fn with_stage_conf(mut self, stage_conf: impl Into<String>) -> Self {
        self.stage_conf = Some(stage_conf.into());
        self
    }

    /// Sets `stage`.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Sets `stage_progress`.
    #[must_use]
    pub const fn with_stage_progress(mut self, stage_progress: u8) -> Self {
        self.stage_progress = Some(stage_progress);
        self
    }

    /// Sets `retry_index`.
    #[must_use]
    pub const fn with_retry_index(mut self, retry_index: u32) -> Self {
        self.retry_index = Some(retry_index);
        self
    }

    /// Sets `log`.
    #[must_use]
    pub fn with_log(mut self, log: Vec<String>) -> Self {
        self.log = Some(log);
        self
    }

    /// Sets `context`.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Sets `max_retry_num`.
    #[must_use]
    pub const fn with_max_retry_num(mut self, max_retry_num: u32) -> Self {
        self.max_retry_num = Some(max_retry_num);
        self
    }

    /// Sets `retry_interval`.
    #[must_use]
    pub fn with_retry_interval(mut self, retry_interval: RetrySchedule) -> Self {
        self.retry_interval = Some(retry_interval);
        self
    }

    /// Sets `max_running_num`.
    #[must_use]
    pub const fn with_max_running_num(mut self, max_running_num: u32) -> Self {
        self.max_running_num = Some(max_running_num);
        self
    }

    /// Sets `order_time`.
    #[must_use]
    pub const fn with_order_time(mut self, order_time: DateTime<Utc>) -> Self {
        self.order_time = Some(order_time);
        self
    }

    /// Sets `modify_time`.
    #[must_use]
    pub const fn with_modify_time(mut self, modify_time: DateTime<Utc>) -> Self {
        self.modify_time = Some(modify_time);
        self
    }

    /// Returns `status`, if set.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    /// Returns `priority`, if set.
    #[must_use]
    pub const fn priority(&self) -> Option<i64> {
        self.priority
    }

    /// Returns `stage_conf`, if set.
    #[must_use]
    pub fn stage_conf(&self) -> Option<&str> {
        self.stage_conf.as_deref()
    }

    /// Returns `stage`, if set.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        self.stage.as_deref()
    }

    /// Returns `stage_progress`, if set.
    #[must_use]
    pub const fn stage_progress(&self) -> Option<u8> {
        self.stage_progress
    }

    /// Returns `retry_index`, if set.
    #[must_use]
    pub const fn retry_index(&self) -> Option<u32> {
        self.retry_index
    }

    /// Returns `log`, if set.
    #[must_use]
    pub fn log(&self) -> Option<&[String]> {
        self.log.as_deref()
    }

    /// Returns `context`, if set.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Returns `max_retry_num`, if set.
    #[must_use]
    pub const fn max_retry_num(&self) -> Option<u32> {
        self.max_retry_num
    }

    /// Returns `retry_interval`, if set.
    #[must_use]
    pub const fn retry_interval(&self) -> Option<&RetrySchedule> {
        self.retry_interval.as_ref()
    }

    /// Returns `max_running_num`, if set.
    #[must_use]
    pub const fn max_running_num(&self) -> Option<u32> {
        self.max_running_num
    }

    /// Returns `order_time`, if set.
    #[must_use]
    pub const fn order_time(&self) -> Option<DateTime<Utc>> {
        self.order_time
    }

    /// Returns `modify_time`, if set.
    #[must_use]
    pub const fn modify_time(&self) -> Option<DateTime<Utc>> {
        self.modify_time
    }
}
