//! Scheduler client configuration.

use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Environment variable holding the scheduler base URL.
pub const BASE_URL_ENV: &str = "SCHEDULER_BASE_URL";
/// Environment variable overriding the success code.
pub const SUCCESS_CODE_ENV: &str = "SCHEDULER_SUCCESS_CODE";
/// Environment variable holding the request timeout in milliseconds.
pub const REQUEST_TIMEOUT_ENV: &str = "SCHEDULER_REQUEST_TIMEOUT_MS";

/// Connection settings for the scheduler service.
///
/// # Examples
///
/// ```
/// use schedule_sdk::task::ports::SchedulerClientConfig;
///
/// let config = SchedulerClientConfig::new("http://scheduler.local:8080/api")?;
/// assert_eq!(config.success_code(), 0);
/// assert!(config.request_timeout().is_none());
/// # Ok::<(), schedule_sdk::task::ports::SchedulerConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerClientConfig {
    base_url: Url,
    success_code: i64,
    request_timeout: Option<Duration>,
}

/// Errors raised while building a scheduler client configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulerConfigError {
    /// A required environment variable is unset.
    #[error("environment variable {0} is not set")]
    MissingVariable(&'static str),

    /// The base URL is not an absolute `http` or `https` URL.
    #[error("invalid scheduler base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// Offending value.
        url: String,
        /// Reason string.
        reason: String,
    },

    /// A numeric setting cannot be parsed.
    #[error("invalid value '{value}' for {variable}")]
    InvalidNumber {
        /// Setting name.
        variable: &'static str,
        /// Offending value.
        value: String,
    },
}

impl SchedulerClientConfig {
    /// Success code used unless configured otherwise.
    pub const DEFAULT_SUCCESS_CODE: i64 = 0;

    /// Creates a configuration for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerConfigError::InvalidBaseUrl`] unless `base_url` is
    /// an absolute `http` or `https` URL.
    pub fn new(base_url: &str) -> Result<Self, SchedulerConfigError> {
        let invalid = |reason: String| SchedulerConfigError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason,
        };
        let parsed = Url::parse(base_url.trim()).map_err(|err| invalid(err.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
        }
        if parsed.cannot_be_a_base() {
            return Err(invalid("URL cannot be a base".to_owned()));
        }

        Ok(Self {
            base_url: parsed,
            success_code: Self::DEFAULT_SUCCESS_CODE,
            request_timeout: None,
        })
    }

    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerConfigError`] when the base URL is missing or any
    /// value is invalid.
    pub fn from_env() -> Result<Self, SchedulerConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerConfigError`] when the base URL is missing or any
    /// value is invalid.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, SchedulerConfigError> {
        let base_url =
            lookup(BASE_URL_ENV).ok_or(SchedulerConfigError::MissingVariable(BASE_URL_ENV))?;
        let mut config = Self::new(&base_url)?;

        if let Some(raw) = lookup(SUCCESS_CODE_ENV) {
            config.success_code = parse_number(SUCCESS_CODE_ENV, &raw)?;
        }
        if let Some(raw) = lookup(REQUEST_TIMEOUT_ENV) {
            let millis: u64 = parse_number(REQUEST_TIMEOUT_ENV, &raw)?;
            config.request_timeout = Some(Duration::from_millis(millis));
        }
        Ok(config)
    }

    /// Sets the envelope code treated as success.
    #[must_use]
    pub const fn with_success_code(mut self, success_code: i64) -> Self {
        self.success_code = success_code;
        self
    }

    /// Sets a per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Returns the scheduler base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the envelope code treated as success.
    #[must_use]
    pub const fn success_code(&self) -> i64 {
        self.success_code
    }

    /// Returns the per-request timeout, if any.
    #[must_use]
    pub const fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Resolves a relative endpoint path against the base URL, keeping any
    /// path prefix of the base.
    ///
    /// # Errors
    ///
    /// Returns the rejected path when the base URL cannot take segments.
    pub fn endpoint(&self, path: &str) -> Result<Url, String> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| path.to_owned())?
            .pop_if_empty()
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }
}

fn parse_number<T: std::str::FromStr>(
    variable: &'static str,
    raw: &str,
) -> Result<T, SchedulerConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| SchedulerConfigError::InvalidNumber {
            variable,
            value: raw.to_owned(),
        })
}
