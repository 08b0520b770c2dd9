//! Application services for talking to the task scheduler.

mod client;

pub use client::{SchedulerClient, SchedulerClientError, SchedulerClientResult};
