//! Raw billing source client
//!
//! Fetches subscription and invoice documents as-is. The upstream API has
//! gone through several shape revisions, so responses come back as
//! `serde_json::Value` and the status normalizer makes sense of them.

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, instrument};

use hakot_types::AccountId;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::retry::with_retry;
use crate::Result;

/// HTTP client for the upstream billing source.
#[derive(Debug, Clone)]
pub struct BillingSourceClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl BillingSourceClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Connection {
                message: e.to_string(),
                retryable: false,
            })?;
        Ok(Self { http, config })
    }

    /// Fetch the raw subscription document for an account.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_subscription_raw(&self, account_id: &AccountId) -> Result<Value> {
        let url = format!(
            "{}/api/accounts/{}/subscription",
            self.config.base_url, account_id
        );
        self.get_json(&url).await
    }

    /// Fetch the raw current invoice document for an account.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_current_invoice_raw(&self, account_id: &AccountId) -> Result<Value> {
        let url = format!(
            "{}/api/accounts/{}/invoices/current",
            self.config.base_url, account_id
        );
        self.get_json(&url).await
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        with_retry(self.config.retry.clone(), || self.get_json_once(url)).await
    }

    async fn get_json_once(&self, url: &str) -> Result<Value> {
        let mut request = self.http.get(url);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::OK {
            let body: Value = response.json().await?;
            debug!(url, "billing source fetch ok");
            return Ok(body);
        }

        let message = response.text().await.unwrap_or_else(|_| status.to_string());
        metrics::counter!(
            "hakot_client_fetch_errors_total",
            "status" => status.as_u16().to_string()
        )
        .increment(1);
        Err(ClientError::from_status(status.as_u16(), message))
    }
}
