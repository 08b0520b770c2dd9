//! `reqwest`-backed scheduler transport.

use crate::task::ports::{
    SchedulerClientConfig, SchedulerTransport, SchedulerTransportError, SchedulerTransportResult,
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use url::Url;

/// Scheduler transport speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSchedulerTransport {
    client: Client,
    config: SchedulerClientConfig,
}

impl HttpSchedulerTransport {
    /// Builds a transport with its own HTTP client, honouring the configured
    /// request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerTransportError::Backend`] when the HTTP client
    /// cannot be initialised.
    pub fn new(config: SchedulerClientConfig) -> SchedulerTransportResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(SchedulerTransportError::backend)?;
        Ok(Self { client, config })
    }

    /// Builds a transport around an existing HTTP client.
    #[must_use]
    pub const fn with_client(client: Client, config: SchedulerClientConfig) -> Self {
        Self { client, config }
    }

    /// Returns the transport configuration.
    #[must_use]
    pub const fn config(&self) -> &SchedulerClientConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> SchedulerTransportResult<Url> {
        self.config
            .endpoint(path)
            .map_err(|rejected| SchedulerTransportError::InvalidEndpoint {
                path: rejected,
                reason: format!("base URL {} cannot take a path", self.config.base_url()),
            })
    }
}

#[async_trait]
impl SchedulerTransport for HttpSchedulerTransport {
    #[tracing::instrument(level = "debug", name = "HttpSchedulerTransport::get", skip(self))]
    async fn get(&self, path: &str) -> SchedulerTransportResult<Value> {
        let url = self.endpoint(path)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(SchedulerTransportError::backend)?;
        decode(response).await
    }

    #[tracing::instrument(
        level = "debug",
        name = "HttpSchedulerTransport::post",
        skip(self, body)
    )]
    async fn post(&self, path: &str, body: &Value) -> SchedulerTransportResult<Value> {
        let url = self.endpoint(path)?;
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(SchedulerTransportError::backend)?;
        decode(response).await
    }
}

/// Reads the scheduler's JSON reply.
///
/// A non-2xx status still carries the scheduler's envelope when the body is
/// a JSON object with a `code`; only other bodies become
/// [`SchedulerTransportError::HttpStatus`].
async fn decode(response: Response) -> SchedulerTransportResult<Value> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<Value>()
            .await
            .map_err(SchedulerTransportError::decode);
    }
    let body = response.text().await.unwrap_or_else(|error| {
        tracing::debug!(
            status = status.as_u16(),
            %error,
            "failed to read scheduler error body"
        );
        String::new()
    });
    if let Some(envelope) = serde_json::from_str::<Value>(&body)
        .ok()
        .filter(|value| value.get("code").is_some())
    {
        tracing::debug!(
            status = status.as_u16(),
            "scheduler answered a non-success status with an envelope"
        );
        return Ok(envelope);
    }
    tracing::debug!(status = status.as_u16(), "scheduler answered a non-success status");
    Err(SchedulerTransportError::HttpStatus {
        status: status.as_u16(),
        body,
    })
}
