//! Shared test helpers for in-memory scheduler integration tests.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use rstest::fixture;
use schedule_sdk::task::{
    adapters::memory::InMemoryScheduler,
    domain::{Task, TaskOptions, TaskType},
    services::SchedulerClient,
};

/// Unix timestamp the test clock starts from.
pub const START_SECONDS: i64 = 1_700_000_000;

/// Clock advanced explicitly by tests.
#[derive(Debug)]
pub struct SteppedClock {
    now: Mutex<DateTime<Utc>>,
}

impl SteppedClock {
    /// Creates a clock at [`START_SECONDS`].
    #[must_use]
    pub fn new() -> Self {
        let start = DateTime::from_timestamp(START_SECONDS, 0).unwrap_or_default();
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, delta: TimeDelta) {
        if let Ok(mut now) = self.now.lock() {
            *now += delta;
        }
    }
}

impl Default for SteppedClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SteppedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map(|now| *now)
            .unwrap_or_default()
    }
}

/// Scheduler, client and clock shared by one test.
pub struct Harness {
    pub scheduler: Arc<InMemoryScheduler>,
    pub client: SchedulerClient<InMemoryScheduler>,
    pub clock: SteppedClock,
}

impl Harness {
    /// Builds a task of `kind` at the current clock time.
    ///
    /// # Errors
    ///
    /// Returns an error if `kind` is blank.
    pub fn task(&self, kind: &str, options: TaskOptions) -> Result<Task, eyre::Report> {
        Ok(Task::with_options(
            TaskType::new(kind)?,
            "{}",
            options,
            &self.clock,
        ))
    }

    /// Returns the scheduler's current due time reference.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }
}

/// Provides a fresh scheduler wired to a client.
#[fixture]
pub fn harness() -> Harness {
    let scheduler = Arc::new(InMemoryScheduler::new());
    Harness {
        client: SchedulerClient::new(Arc::clone(&scheduler)),
        scheduler,
        clock: SteppedClock::new(),
    }
}
