//! Lifecycle engine errors

use hakot_types::SubscriptionStatus;
use thiserror::Error;

/// Lifecycle engine errors
#[derive(Error, Debug)]
pub enum CoreError {
    /// Subscription not found
    #[error("subscription not found")]
    SubscriptionNotFound,

    /// Invoice not found
    #[error("invoice not found")]
    InvoiceNotFound,

    /// Transition rejected by the validator
    #[error("invalid transition {from} -> {to}: {reason}")]
    InvalidTransition {
        /// Current status
        from: SubscriptionStatus,
        /// Requested status
        to: SubscriptionStatus,
        /// Why the edge is not in the graph
        reason: String,
    },

    /// A concurrent writer committed first and the retried state disagrees
    #[error("concurrent update conflict")]
    Conflict,

    /// Webhook verification or parsing error
    #[error("webhook error: {0}")]
    WebhookError(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] hakot_db::DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SubscriptionNotFound | Self::InvoiceNotFound)
    }
}
