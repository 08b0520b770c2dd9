//! HTTP adapter for the scheduler transport port.

mod transport;

pub use transport::HttpSchedulerTransport;
