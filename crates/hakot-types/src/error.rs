//! Common error types

use thiserror::Error;

/// Common errors across hakot services
#[derive(Error, Debug)]
pub enum HakotError {
    /// Subscription not found
    #[error("subscription not found: {0}")]
    SubscriptionNotFound(String),

    /// Invoice not found
    #[error("invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Unrecognized payment channel
    #[error("invalid payment channel: {0}")]
    InvalidPaymentChannel(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}
