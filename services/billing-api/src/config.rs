//! Configuration for the Billing API service.

use std::time::Duration;

use hakot_core::BillingPolicy;

/// Billing API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Database URL
    pub database_url: String,
    /// Gateway webhook signing secret
    pub webhook_secret: String,
    /// Base URL of the upstream billing source
    pub billing_source_url: String,
    /// Bearer token for the billing source, if required
    pub billing_source_token: Option<String>,
    /// Invoice policy (grace period, late fee)
    pub policy: BillingPolicy,
    /// Request timeout
    pub request_timeout: Duration,
    /// Metrics enabled
    pub metrics_enabled: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let webhook_secret = std::env::var("GATEWAY_WEBHOOK_SECRET")
            .map_err(|_| ConfigError::Missing("GATEWAY_WEBHOOK_SECRET"))?;

        let billing_source_url = std::env::var("BILLING_SOURCE_URL")
            .map_err(|_| ConfigError::Missing("BILLING_SOURCE_URL"))?;
        let billing_source_token = std::env::var("BILLING_SOURCE_TOKEN").ok();

        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8081".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        let grace_days: i64 = std::env::var("INVOICE_GRACE_DAYS")
            .unwrap_or_else(|_| "7".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("INVOICE_GRACE_DAYS"))?;

        let late_fee_centavos: i64 = std::env::var("LATE_FEE_CENTAVOS")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("LATE_FEE_CENTAVOS"))?;

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REQUEST_TIMEOUT_SECS"))?;

        let metrics_enabled = std::env::var("METRICS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let policy = BillingPolicy::new()
            .with_grace_days(grace_days)
            .with_flat_late_fee(late_fee_centavos);

        Ok(Self {
            http_port,
            database_url,
            webhook_secret,
            billing_source_url,
            billing_source_token,
            policy,
            request_timeout: Duration::from_secs(request_timeout_secs),
            metrics_enabled,
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
