//! Given steps for task retry ordering BDD scenarios.

use super::world::TaskRetryWorld;
use eyre::WrapErr;
use rstest_bdd_macros::given;
use schedule_sdk::task::domain::{Task, TaskOptions, TaskStatus, TaskType};

#[given(r#"a new "{kind}" task with priority {priority:u32}"#)]
fn new_task(world: &mut TaskRetryWorld, kind: String, priority: u32) -> Result<(), eyre::Report> {
    let task = Task::with_options(
        TaskType::new(kind)?,
        "{}",
        TaskOptions::new().with_priority(i64::from(priority)),
        &world.clock,
    );
    world.task = Some(task);
    Ok(())
}

#[given("the task has failed {count:u32} times")]
fn task_has_failed(world: &mut TaskRetryWorld, count: u32) -> Result<(), eyre::Report> {
    let TaskRetryWorld { clock, task, .. } = world;
    let task = task
        .as_mut()
        .ok_or_else(|| eyre::eyre!("missing task in scenario world"))?;
    for attempt in 0..count {
        for next in [
            TaskStatus::Scheduled,
            TaskStatus::Running,
            TaskStatus::WaitForRetry,
        ] {
            task.transition_to(next, &*clock)
                .wrap_err_with(|| format!("fail attempt {attempt}"))?;
        }
    }
    Ok(())
}
