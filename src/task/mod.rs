//! Task lifecycle tracking against a remote scheduler.
//!
//! A [`domain::Task`] moves through the validated status table in
//! [`domain::TaskStatus`]; every mutation re-derives its `order_time`, the
//! key the scheduler sorts its queue by. [`services::SchedulerClient`]
//! submits, fetches and updates tasks through a
//! [`ports::SchedulerTransport`]:
//!
//! - Domain types in [`domain`]
//! - Port contracts and wire protocol in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The client service in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
