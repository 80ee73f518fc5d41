//! Client for the upstream billing source.
//!
//! [`BillingSourceClient`] fetches raw subscription and invoice documents
//! over HTTP with retry. [`CachedBillingClient`] wraps it with a per-account
//! cache of normalized statuses, serves last-known-good data through
//! transient outages, and turns a run of 401s into a session-expired signal.

pub mod billing;
pub mod cache;
pub mod config;
pub mod error;
pub mod retry;

pub use billing::BillingSourceClient;
pub use cache::{BillingSource, CacheConfig, CachedBillingClient};
pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use retry::{with_retry, RetryConfig, RetryableError};

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
