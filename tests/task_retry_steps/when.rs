//! When steps for task retry ordering BDD scenarios.

use super::world::{TaskRetryWorld, run_async};
use chrono::TimeDelta;
use eyre::WrapErr;
use rstest_bdd_macros::when;
use schedule_sdk::task::domain::TaskStatus;

#[when("the task is started")]
fn task_is_started(world: &mut TaskRetryWorld) -> Result<(), eyre::Report> {
    world.clock.advance(TimeDelta::seconds(1));
    let TaskRetryWorld { clock, task, .. } = world;
    let task = task
        .as_mut()
        .ok_or_else(|| eyre::eyre!("missing task in scenario world"))?;
    task.transition_to(TaskStatus::Scheduled, &*clock)?;
    task.transition_to(TaskStatus::Running, &*clock)?;
    Ok(())
}

#[when("the running attempt fails")]
fn running_attempt_fails(world: &mut TaskRetryWorld) -> Result<(), eyre::Report> {
    world.clock.advance(TimeDelta::seconds(1));
    let TaskRetryWorld {
        clock,
        task,
        last_error,
        ..
    } = world;
    let task = task
        .as_mut()
        .ok_or_else(|| eyre::eyre!("missing task in scenario world"))?;
    *last_error = task.transition_to(TaskStatus::WaitForRetry, &*clock).err();
    Ok(())
}

#[when("the task is submitted to the scheduler")]
fn task_is_submitted(world: &mut TaskRetryWorld) -> Result<(), eyre::Report> {
    let task = world.task()?;
    run_async(world.client.submit_task(task)).wrap_err("submit task")
}

#[when("the task is fetched back")]
fn task_is_fetched(world: &mut TaskRetryWorld) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id().clone();
    let fetched = run_async(world.client.get_task(&task_id)).wrap_err("fetch task")?;
    world.fetched = Some(fetched);
    Ok(())
}
