//! Client round trips against the in-memory scheduler.

use super::helpers::{Harness, harness};
use chrono::TimeDelta;
use rstest::rstest;
use schedule_sdk::task::{
    adapters::memory::{CODE_CONFLICT, CODE_NOT_FOUND},
    domain::{TaskField, TaskId, TaskOptions, TaskPatch, TaskStatus},
    ports::UpdateTaskRequest,
    services::SchedulerClientError,
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn submitted_task_is_returned_unchanged(harness: Harness) -> Result<(), eyre::Report> {
    let task = harness.task("echo", TaskOptions::new().with_priority(5))?;

    harness.client.submit_task(&task).await?;
    let fetched = harness.client.get_task(task.id()).await?;

    eyre::ensure!(fetched == task, "fetched task differs from submitted task");
    eyre::ensure!(
        fetched.order_time() == fetched.create_time() - TimeDelta::seconds(5),
        "priority must pull the due time forward"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_submission_is_rejected(harness: Harness) -> Result<(), eyre::Report> {
    let task = harness.task("echo", TaskOptions::new())?;
    harness.client.submit_task(&task).await?;

    let result = harness.client.submit_task(&task).await;

    eyre::ensure!(
        matches!(
            result,
            Err(SchedulerClientError::Rejected { code, .. }) if code == CODE_CONFLICT
        ),
        "expected conflict rejection"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_task_is_rejected_with_server_message(
    harness: Harness,
) -> Result<(), eyre::Report> {
    let task_id = TaskId::parse("abc")?;

    let result = harness.client.get_task(&task_id).await;

    let Err(SchedulerClientError::Rejected { code, message }) = result else {
        return Err(eyre::eyre!("expected rejection, got {result:?}"));
    };
    eyre::ensure!(code == CODE_NOT_FOUND, "unexpected code {code}");
    eyre::ensure!(message.contains("abc"), "message should name the task: {message}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn masked_update_is_visible_on_next_fetch(harness: Harness) -> Result<(), eyre::Report> {
    let task = harness.task("echo", TaskOptions::new())?;
    harness.client.submit_task(&task).await?;

    let request = UpdateTaskRequest::from(
        TaskPatch::new()
            .with_context("{\"rows\":42}")
            .with_log(vec!["loaded".to_owned()]),
    );
    harness.client.update_task(task.id(), &request).await?;
    let fetched = harness.client.get_task(task.id()).await?;

    eyre::ensure!(fetched.context() == "{\"rows\":42}", "context not updated");
    eyre::ensure!(fetched.log() == ["loaded".to_owned()], "log not updated");
    eyre::ensure!(fetched.status() == task.status(), "status must be untouched");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transitions_are_mirrored_on_the_scheduler(harness: Harness) -> Result<(), eyre::Report> {
    let mut task = harness.task("echo", TaskOptions::new())?;
    harness.client.submit_task(&task).await?;

    for next in [TaskStatus::Scheduled, TaskStatus::Running] {
        harness.clock.advance(TimeDelta::seconds(1));
        harness
            .client
            .transition_task(&mut task, next, &harness.clock)
            .await?;
    }
    task.set_stage_progress(60, &harness.clock)?;
    harness
        .client
        .update_task_fields(&task, [TaskField::StageProgress])
        .await?;
    let fetched = harness.client.get_task(task.id()).await?;

    eyre::ensure!(fetched.status() == TaskStatus::Running, "status not mirrored");
    eyre::ensure!(fetched.stage_progress() == 60, "progress not mirrored");
    eyre::ensure!(
        fetched.modify_time() == task.create_time() + TimeDelta::seconds(2),
        "modify time not mirrored"
    );
    Ok(())
}
