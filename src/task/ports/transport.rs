//! Transport port carrying scheduler envelopes as JSON values.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Result type for scheduler transport operations.
pub type SchedulerTransportResult<T> = Result<T, SchedulerTransportError>;

/// JSON request/response contract with the scheduler service.
///
/// Paths are relative to the scheduler base URL, for example
/// `/task/query/{task_id}`. Implementations return the decoded response
/// envelope and leave envelope interpretation to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SchedulerTransport: Send + Sync {
    /// Issues a `GET` request.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerTransportError`] when the request cannot be
    /// delivered or the response is not JSON.
    async fn get(&self, path: &str) -> SchedulerTransportResult<Value>;

    /// Issues a `POST` request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerTransportError`] when the request cannot be
    /// delivered or the response is not JSON.
    async fn post(&self, path: &str, body: &Value) -> SchedulerTransportResult<Value>;
}

/// Errors returned by scheduler transport adapters.
#[derive(Debug, Clone, Error)]
pub enum SchedulerTransportError {
    /// The request path cannot be joined onto the base URL.
    #[error("invalid scheduler endpoint '{path}': {reason}")]
    InvalidEndpoint {
        /// Relative request path.
        path: String,
        /// Reason string.
        reason: String,
    },

    /// The scheduler answered a non-success HTTP status without an
    /// envelope.
    #[error("scheduler answered HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },

    /// The response body is not valid JSON.
    #[error("malformed scheduler response body: {0}")]
    Decode(Arc<dyn std::error::Error + Send + Sync>),

    /// Network or runtime failure inside the adapter.
    #[error("scheduler transport failure: {0}")]
    Backend(Arc<dyn std::error::Error + Send + Sync>),
}

impl SchedulerTransportError {
    /// Wraps a response decoding error.
    pub fn decode(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Decode(Arc::new(err))
    }

    /// Wraps a network or runtime error from the adapter.
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Arc::new(err))
    }
}
