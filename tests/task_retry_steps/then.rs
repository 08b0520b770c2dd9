//! Then steps for task retry ordering BDD scenarios.

use super::world::TaskRetryWorld;
use chrono::TimeDelta;
use rstest_bdd_macros::then;
use schedule_sdk::task::domain::{TaskDomainError, TaskStatus};

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &TaskRetryWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task = world.task()?;

    if task.status() != expected {
        return Err(eyre::eyre!(
            "expected status {expected}, found {}",
            task.status()
        ));
    }
    Ok(())
}

#[then("the order time is {seconds:u32} seconds before the create time")]
fn order_time_before_create_time(
    world: &TaskRetryWorld,
    seconds: u32,
) -> Result<(), eyre::Report> {
    let task = world.task()?;
    let expected = task.create_time() - TimeDelta::seconds(i64::from(seconds));

    eyre::ensure!(
        task.order_time() == expected,
        "expected order time {expected}, found {}",
        task.order_time()
    );
    Ok(())
}

#[then("the order time is {millis:u32} milliseconds after the modify time")]
fn order_time_after_modify_time(world: &TaskRetryWorld, millis: u32) -> Result<(), eyre::Report> {
    let task = world.task()?;
    let expected = task.modify_time() + TimeDelta::milliseconds(i64::from(millis));

    eyre::ensure!(
        task.order_time() == expected,
        "expected order time {expected}, found {}",
        task.order_time()
    );
    Ok(())
}

#[then("the retry index is {index:u32}")]
fn retry_index_is(world: &TaskRetryWorld, index: u32) -> Result<(), eyre::Report> {
    let actual = world.task()?.retry_index();
    eyre::ensure!(actual == index, "expected retry index {index}, found {actual}");
    Ok(())
}

#[then("the retry is rejected as exhausted")]
fn retry_rejected_as_exhausted(world: &TaskRetryWorld) -> Result<(), eyre::Report> {
    match &world.last_error {
        Some(TaskDomainError::RetriesExhausted { .. }) => Ok(()),
        other => Err(eyre::eyre!("expected RetriesExhausted error, got {other:?}")),
    }
}

#[then("the fetched task matches the submitted task")]
fn fetched_matches_submitted(world: &TaskRetryWorld) -> Result<(), eyre::Report> {
    let fetched = world
        .fetched
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing fetched task"))?;
    eyre::ensure!(fetched == world.task()?, "fetched task differs from submitted task");
    Ok(())
}
