//! In-memory adapters for tests and local orchestration.

mod scheduler;

pub use scheduler::{CODE_BAD_REQUEST, CODE_CONFLICT, CODE_NOT_FOUND, InMemoryScheduler};
