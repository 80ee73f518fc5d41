//! User-facing action descriptors
//!
//! Actions are ephemeral and derived; they are never persisted.

use serde::{Deserialize, Serialize};

/// Identifier for a user-facing action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionId {
    Subscribe,
    ContinueGcashPayment,
    UploadReceipt,
    PayInvoice,
    ReactivateSubscription,
    ViewSchedule,
    PaymentHistory,
    ContactSupport,
    ViewReceipt,
    RenewSubscription,
    CancelSubscription,
}

impl ActionId {
    /// Default display label for this action
    pub const fn label(self) -> &'static str {
        match self {
            Self::Subscribe => "Subscribe",
            Self::ContinueGcashPayment => "Continue GCash payment",
            Self::UploadReceipt => "Upload GCash receipt",
            Self::PayInvoice => "Pay invoice",
            Self::ReactivateSubscription => "Reactivate subscription",
            Self::ViewSchedule => "View collection schedule",
            Self::PaymentHistory => "Payment history",
            Self::ContactSupport => "Contact support",
            Self::ViewReceipt => "View receipt",
            Self::RenewSubscription => "Renew subscription",
            Self::CancelSubscription => "Cancel subscription",
        }
    }
}

/// A resolved action for the current status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Action identifier
    pub id: ActionId,
    /// Display label
    pub label: String,
    /// Whether this is the single highlighted action
    pub primary: bool,
}

impl Action {
    /// Create a non-primary action with its default label
    pub fn new(id: ActionId) -> Self {
        Self {
            id,
            label: id.label().to_string(),
            primary: false,
        }
    }

    /// Create the primary action with its default label
    pub fn primary(id: ActionId) -> Self {
        Self {
            id,
            label: id.label().to_string(),
            primary: true,
        }
    }
}
