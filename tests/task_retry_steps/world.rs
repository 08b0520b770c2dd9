//! Shared world state for task retry ordering BDD scenarios.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use rstest::fixture;
use schedule_sdk::task::{
    adapters::memory::InMemoryScheduler,
    domain::{Task, TaskDomainError},
    services::SchedulerClient,
};

/// Clock that only moves when a step advances it.
#[derive(Debug)]
pub struct ScenarioClock {
    now: Mutex<DateTime<Utc>>,
}

impl ScenarioClock {
    fn new() -> Self {
        Self {
            now: Mutex::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, delta: TimeDelta) {
        if let Ok(mut now) = self.now.lock() {
            *now += delta;
        }
    }
}

impl Clock for ScenarioClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_default()
    }
}

/// Scenario world for retry ordering behaviour tests.
pub struct TaskRetryWorld {
    pub clock: ScenarioClock,
    pub client: SchedulerClient<InMemoryScheduler>,
    pub task: Option<Task>,
    pub fetched: Option<Task>,
    pub last_error: Option<TaskDomainError>,
}

impl TaskRetryWorld {
    /// Creates a world with an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clock: ScenarioClock::new(),
            client: SchedulerClient::new(Arc::new(InMemoryScheduler::new())),
            task: None,
            fetched: None,
            last_error: None,
        }
    }

    /// Returns the task under test.
    ///
    /// # Errors
    ///
    /// Returns an error when no task was created yet.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }
}

impl Default for TaskRetryWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> TaskRetryWorld {
    TaskRetryWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
