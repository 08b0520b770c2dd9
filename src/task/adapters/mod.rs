//! Adapter implementations for task scheduler ports.

pub mod http;
pub mod memory;
