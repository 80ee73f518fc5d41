//! Notification backend seam.
//!
//! The scheduler only ever talks to [`Notifier`]; production wires in the
//! device push backend, tests wire in an in-memory fake.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hakot_types::InvoiceId;

/// Backend-assigned handle for one scheduled notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub String);

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the notification says when it fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderPayload {
    pub invoice_id: InvoiceId,
    pub offset_key: String,
    pub total_due_centavos: i64,
    pub due_date: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification permission denied")]
    PermissionDenied,

    #[error("notification backend unavailable: {0}")]
    Backend(String),
}

/// Device notification backend.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Schedule a notification to fire at `at`.
    async fn schedule_at(
        &self,
        at: DateTime<Utc>,
        payload: ReminderPayload,
    ) -> Result<NotificationId, NotifyError>;

    /// Cancel a previously scheduled notification. Cancelling an unknown ID
    /// is not an error.
    async fn cancel(&self, id: &NotificationId) -> Result<(), NotifyError>;

    /// IDs of every notification the backend still has pending.
    async fn scheduled_ids(&self) -> Result<Vec<NotificationId>, NotifyError>;
}
