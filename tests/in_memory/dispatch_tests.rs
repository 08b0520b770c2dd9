//! Due-task selection after client-driven lifecycle changes.

use super::helpers::{Harness, harness};
use chrono::TimeDelta;
use rstest::rstest;
use schedule_sdk::task::{
    domain::{RetrySchedule, Task, TaskOptions, TaskStatus},
    services::SchedulerClientError,
};

async fn start(harness: &Harness, task: &mut Task) -> Result<(), SchedulerClientError> {
    for next in [TaskStatus::Scheduled, TaskStatus::Running] {
        harness
            .client
            .transition_task(task, next, &harness.clock)
            .await?;
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn higher_priority_task_is_dispatched_first(harness: Harness) -> Result<(), eyre::Report> {
    let background = harness.task("report", TaskOptions::new())?;
    let urgent = harness.task("report", TaskOptions::new().with_priority(60))?;
    harness.client.submit_task(&background).await?;
    harness.client.submit_task(&urgent).await?;

    let due = harness.scheduler.due_tasks(harness.now())?;

    let ids: Vec<_> = due.iter().map(Task::id).collect();
    eyre::ensure!(
        ids == vec![urgent.id(), background.id()],
        "unexpected dispatch order: {ids:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_attempt_is_redispatched_after_backoff(
    harness: Harness,
) -> Result<(), eyre::Report> {
    let options = TaskOptions::new().with_retry_interval(RetrySchedule::from_millis([2_000]));
    let mut task = harness.task("report", options)?;
    harness.client.submit_task(&task).await?;
    start(&harness, &mut task).await?;
    harness
        .client
        .transition_task(&mut task, TaskStatus::WaitForRetry, &harness.clock)
        .await?;

    eyre::ensure!(
        harness.scheduler.due_tasks(harness.now())?.is_empty(),
        "task must wait for its backoff"
    );
    harness.clock.advance(TimeDelta::seconds(2));
    let due = harness.scheduler.due_tasks(harness.now())?;
    eyre::ensure!(due.len() == 1, "task must be due after its backoff");

    harness
        .client
        .transition_task(&mut task, TaskStatus::Scheduled, &harness.clock)
        .await?;
    let fetched = harness.client.get_task(task.id()).await?;
    eyre::ensure!(fetched.retry_index() == 1, "retry must be consumed");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn running_tasks_occupy_type_capacity(harness: Harness) -> Result<(), eyre::Report> {
    let single = TaskOptions::new().with_max_running_num(1);
    let mut first = harness.task("export", single.clone())?;
    let second = harness.task("export", single)?;
    harness.client.submit_task(&first).await?;
    harness.client.submit_task(&second).await?;

    start(&harness, &mut first).await?;
    let due = harness.scheduler.due_tasks(harness.now())?;
    eyre::ensure!(due.is_empty(), "capacity of one is already used");

    harness
        .client
        .transition_task(&mut first, TaskStatus::Success, &harness.clock)
        .await?;
    let due = harness.scheduler.due_tasks(harness.now())?;
    eyre::ensure!(
        due.iter().map(Task::id).eq([second.id()]),
        "second task must be dispatched once the first finished"
    );
    Ok(())
}
