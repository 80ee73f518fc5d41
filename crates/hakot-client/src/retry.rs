//! Retry with exponential backoff
//!
//! Retries transient billing source failures with exponential backoff and
//! jitter. Retry decisions defer to `ClientError::is_retryable()`.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (excluding the initial request).
    pub max_attempts: u32,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Whether to add jitter to prevent thundering herd.
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of retry attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the base delay for exponential backoff.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Enable or disable jitter.
    #[must_use]
    pub fn with_jitter(mut self, enable: bool) -> Self {
        self.add_jitter = enable;
        self
    }

    /// Calculate the delay for a given attempt number.
    ///
    /// Uses exponential backoff: `base_delay * 2^attempt`
    /// Capped at `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = 2u64.saturating_pow(attempt);
        let delay_ms = self.base_delay.as_millis() as u64 * multiplier;
        let delay = Duration::from_millis(delay_ms.min(self.max_delay.as_millis() as u64));

        if self.add_jitter {
            // Add up to 25% jitter
            let jitter_range = delay.as_millis() as u64 / 4;
            let jitter = if jitter_range > 0 {
                // Simple pseudo-random jitter using current time
                let nanos = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .subsec_nanos() as u64;
                Duration::from_millis(nanos % jitter_range)
            } else {
                Duration::ZERO
            };
            delay + jitter
        } else {
            delay
        }
    }

    /// Check if more retries are allowed.
    #[must_use]
    pub fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// Execute an async operation with retry logic.
///
/// # Example
///
/// ```ignore
/// use hakot_client::retry::{with_retry, RetryConfig};
///
/// let result = with_retry(RetryConfig::default(), || async {
///     client.fetch_subscription_raw(&account_id).await
/// }).await;
/// ```
pub async fn with_retry<F, Fut, T, E>(config: RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RetryableError,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                if !err.is_retryable() || !config.can_retry(attempt) {
                    return Err(err);
                }

                let delay = config.delay_for_attempt(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "retrying after transient error"
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Trait for errors that can indicate whether they're retryable.
pub trait RetryableError {
    /// Returns true if this error is retryable.
    fn is_retryable(&self) -> bool;
}

impl RetryableError for crate::ClientError {
    fn is_retryable(&self) -> bool {
        crate::ClientError::is_retryable(self)
    }
}
