//! Client configuration.

use std::time::Duration;

use url::Url;

use crate::error::ApiError;
use crate::principal::Principal;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/client/api";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Management API endpoint (`.../client/api`).
    pub endpoint: Url,

    /// Principal requests are signed as unless overridden with `acting_as`.
    pub principal: Principal,

    /// Per-request HTTP timeout.
    pub timeout: Duration,

    /// Interval between `queryAsyncJobResult` polls.
    pub async_poll_interval: Duration,

    /// Maximum time to wait for one async job.
    pub async_timeout: Duration,
}

impl ClientConfig {
    pub fn new(endpoint: &str, principal: Principal) -> Result<Self, ApiError> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            principal,
            timeout: Duration::from_secs(30),
            async_poll_interval: Duration::from_secs(2),
            async_timeout: Duration::from_secs(3600),
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_async_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.async_poll_interval = interval;
        self.async_timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// `RIGGER_API_KEY` and `RIGGER_SECRET_KEY` are required.
    pub fn from_env() -> Result<Self, ApiError> {
        let endpoint =
            std::env::var("RIGGER_API_URL").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());

        let api_key = std::env::var("RIGGER_API_KEY")
            .map_err(|_| ApiError::Config("RIGGER_API_KEY is not set".to_string()))?;
        let secret_key = std::env::var("RIGGER_SECRET_KEY")
            .map_err(|_| ApiError::Config("RIGGER_SECRET_KEY is not set".to_string()))?;

        let mut config = Self::new(&endpoint, Principal::new(api_key, secret_key))?;

        if let Some(secs) = env_u64("RIGGER_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = env_u64("RIGGER_ASYNC_POLL_MS")? {
            config.async_poll_interval = Duration::from_millis(ms);
        }
        if let Some(secs) = env_u64("RIGGER_ASYNC_TIMEOUT_SECS")? {
            config.async_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn env_u64(name: &str) -> Result<Option<u64>, ApiError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ApiError::Config(format!("{name} must be a number, got '{raw}'"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("http://cloud:8080/client/api", Principal::new("k", "s"))
            .unwrap();
        assert_eq!(config.endpoint.path(), "/client/api");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.async_timeout > config.async_poll_interval);
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = ClientConfig::new("not a url", Principal::new("k", "s")).unwrap_err();
        assert!(matches!(err, ApiError::Endpoint(_)));
    }
}
