//! Schedule SDK: task lifecycle model and scheduler RPC client.
//!
//! This crate models units of schedulable work, their retry and staging
//! metadata, and the policy that derives each task's due time. It talks to a
//! remote scheduler service through a JSON envelope protocol.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure task lifecycle logic with no infrastructure dependencies
//! - **Ports**: Transport contract, wire protocol and configuration
//! - **Adapters**: HTTP transport and an in-memory scheduler
//! - **Services**: The scheduler RPC client
//!
//! # Modules
//!
//! - [`task`]: Task lifecycle tracking and scheduler access

pub mod task;
