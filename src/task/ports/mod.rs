//! Port contracts for talking to a task scheduler.
//!
//! Ports define infrastructure-agnostic interfaces and the wire protocol used
//! by the scheduler client.

pub mod config;
pub mod protocol;
pub mod transport;

pub use config::{SchedulerClientConfig, SchedulerConfigError};
pub use protocol::{Envelope, QueryTaskData, UpdateTaskRequest, UpdateTaskRequestError};
pub use transport::{SchedulerTransport, SchedulerTransportError, SchedulerTransportResult};

#[cfg(test)]
pub use transport::MockSchedulerTransport;
