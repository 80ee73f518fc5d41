//! Client configuration

use std::time::Duration;

use thiserror::Error;

use crate::retry::RetryConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

/// Configuration for [`crate::BillingSourceClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the billing source, without trailing slash.
    pub base_url: String,
    /// Bearer token sent with every request, if set.
    pub api_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry behavior for transient failures.
    pub retry: RetryConfig,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ConfigError> {
        let base_url = base_url.into();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidBaseUrl(base_url));
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token: None,
            timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
        })
    }

    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_base_urls() {
        assert!(ClientConfig::new("ftp://billing.example.com").is_err());
        assert!(ClientConfig::new("billing.example.com").is_err());
    }

    #[test]
    fn strips_trailing_slash() {
        let config = ClientConfig::new("https://billing.example.com/").unwrap();
        assert_eq!(config.base_url, "https://billing.example.com");
    }
}
