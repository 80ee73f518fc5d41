//! Caching billing client
//!
//! Wraps the raw billing source with a per-account cache of normalized
//! statuses. Two behaviors matter here:
//!
//! - A transient fetch failure never downgrades an account to
//!   "no subscription"; the last-known-good record is served instead.
//! - A run of consecutive 401s past the configured threshold surfaces as
//!   [`ClientError::SessionExpired`], which callers treat differently from
//!   a flaky network.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde_json::Value;
use tracing::{instrument, warn};

use hakot_core::{normalize_subscription_status, NormalizedStatus};
use hakot_types::{AccountId, SubscriptionStatus};

use crate::billing::BillingSourceClient;
use crate::error::ClientError;
use crate::Result;

/// Source of raw billing documents.
///
/// Seam between the cache and the HTTP client so tests can wire in a fake.
#[async_trait]
pub trait BillingSource: Send + Sync {
    async fn fetch_subscription_raw(&self, account_id: &AccountId) -> Result<Value>;
    async fn fetch_current_invoice_raw(&self, account_id: &AccountId) -> Result<Value>;
}

#[async_trait]
impl BillingSource for BillingSourceClient {
    async fn fetch_subscription_raw(&self, account_id: &AccountId) -> Result<Value> {
        BillingSourceClient::fetch_subscription_raw(self, account_id).await
    }

    async fn fetch_current_invoice_raw(&self, account_id: &AccountId) -> Result<Value> {
        BillingSourceClient::fetch_current_invoice_raw(self, account_id).await
    }
}

/// Configuration for the billing cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for fresh status entries.
    /// Default: 30 seconds
    pub status_ttl: Duration,

    /// TTL for last-known-good entries served during outages.
    /// Default: 24 hours
    pub stale_ttl: Duration,

    /// Maximum number of cached accounts.
    /// Default: 10,000
    pub max_accounts: u64,

    /// Consecutive 401s before the session is declared expired.
    /// Default: 3
    pub session_expiry_threshold: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            status_ttl: Duration::from_secs(30),
            stale_ttl: Duration::from_secs(24 * 60 * 60),
            max_accounts: 10_000,
            session_expiry_threshold: 3,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_status_ttl(mut self, ttl: Duration) -> Self {
        self.status_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_stale_ttl(mut self, ttl: Duration) -> Self {
        self.stale_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_max_accounts(mut self, max: u64) -> Self {
        self.max_accounts = max;
        self
    }

    #[must_use]
    pub fn with_session_expiry_threshold(mut self, threshold: u32) -> Self {
        self.session_expiry_threshold = threshold.max(1);
        self
    }
}

/// Cached billing client.
///
/// Thread-safe; share across tasks via `Arc` or `Clone`.
#[derive(Clone)]
pub struct CachedBillingClient {
    source: Arc<dyn BillingSource>,
    status_cache: Cache<String, NormalizedStatus>,
    stale_cache: Cache<String, NormalizedStatus>,
    invoice_cache: Cache<String, Value>,
    consecutive_unauthorized: Arc<AtomicU32>,
    config: CacheConfig,
}

impl std::fmt::Debug for CachedBillingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedBillingClient")
            .field("config", &self.config)
            .field("status_entries", &self.status_cache.entry_count())
            .field("stale_entries", &self.stale_cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl CachedBillingClient {
    pub fn new(source: Arc<dyn BillingSource>, config: CacheConfig) -> Self {
        let status_cache = Cache::builder()
            .max_capacity(config.max_accounts)
            .time_to_live(config.status_ttl)
            .build();
        let stale_cache = Cache::builder()
            .max_capacity(config.max_accounts)
            .time_to_live(config.stale_ttl)
            .build();
        let invoice_cache = Cache::builder()
            .max_capacity(config.max_accounts)
            .time_to_live(config.status_ttl)
            .build();

        Self {
            source,
            status_cache,
            stale_cache,
            invoice_cache,
            consecutive_unauthorized: Arc::new(AtomicU32::new(0)),
            config,
        }
    }

    /// Normalized subscription status for an account.
    ///
    /// Serves the fresh cache when possible, fetches and normalizes
    /// otherwise. When the fetch fails transiently and a last-known-good
    /// record exists, that record is returned instead of an error.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_status(&self, account_id: &AccountId) -> Result<NormalizedStatus> {
        let key = account_id.to_string();

        if let Some(cached) = self.status_cache.get(&key).await {
            metrics::counter!("hakot_client_cache_hits", "operation" => "get_status").increment(1);
            return Ok(cached);
        }
        metrics::counter!("hakot_client_cache_misses", "operation" => "get_status").increment(1);

        match self.source.fetch_subscription_raw(account_id).await {
            Ok(raw) => {
                self.consecutive_unauthorized.store(0, Ordering::SeqCst);
                let status = normalize_subscription_status(&raw);
                self.status_cache.insert(key.clone(), status).await;
                self.stale_cache.insert(key, status).await;
                Ok(status)
            }
            Err(ClientError::NotFound(_)) => {
                self.consecutive_unauthorized.store(0, Ordering::SeqCst);
                // The account genuinely has no subscription upstream.
                let status = NormalizedStatus {
                    status: SubscriptionStatus::None,
                    has_subscription: false,
                    is_active: false,
                    is_pending: false,
                    can_access: false,
                };
                self.status_cache.insert(key.clone(), status).await;
                self.stale_cache.insert(key, status).await;
                Ok(status)
            }
            Err(ClientError::Unauthorized(message)) => {
                let streak = self.consecutive_unauthorized.fetch_add(1, Ordering::SeqCst) + 1;
                if streak >= self.config.session_expiry_threshold {
                    metrics::counter!("hakot_client_session_expired_total").increment(1);
                    return Err(ClientError::SessionExpired {
                        consecutive_unauthorized: streak,
                    });
                }
                Err(ClientError::Unauthorized(message))
            }
            Err(err) if err.is_retryable() => {
                if let Some(stale) = self.stale_cache.get(&key).await {
                    warn!(%account_id, error = %err, "serving last-known-good status");
                    metrics::counter!("hakot_client_stale_served_total").increment(1);
                    return Ok(stale);
                }
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Raw current invoice document for an account, with a short cache.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_current_invoice_raw(&self, account_id: &AccountId) -> Result<Value> {
        let key = account_id.to_string();

        if let Some(cached) = self.invoice_cache.get(&key).await {
            metrics::counter!("hakot_client_cache_hits", "operation" => "get_invoice").increment(1);
            return Ok(cached);
        }
        metrics::counter!("hakot_client_cache_misses", "operation" => "get_invoice").increment(1);

        let raw = self.source.fetch_current_invoice_raw(account_id).await?;
        self.consecutive_unauthorized.store(0, Ordering::SeqCst);
        self.invoice_cache.insert(key, raw.clone()).await;
        Ok(raw)
    }

    /// Drop cached entries for one account, forcing a refetch.
    pub async fn invalidate(&self, account_id: &AccountId) {
        let key = account_id.to_string();
        self.status_cache.invalidate(&key).await;
        self.invoice_cache.invalidate(&key).await;
    }

    /// Drop every cached entry, including last-known-good records.
    pub fn invalidate_all(&self) {
        self.status_cache.invalidate_all();
        self.stale_cache.invalidate_all();
        self.invoice_cache.invalidate_all();
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}
