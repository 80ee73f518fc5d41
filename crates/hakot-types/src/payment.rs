//! Payment records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{InvoiceId, PaymentChannel};

/// Unique payment identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub Uuid);

impl PaymentId {
    /// Create a new random payment ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A recorded payment against an invoice
///
/// Payments are append-only. An invoice becomes paid once the sum of its
/// payments covers the billed amount plus any late fee.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Payment ID
    pub id: PaymentId,
    /// Invoice this payment settles (or partially settles)
    pub invoice_id: InvoiceId,
    /// Paid amount in centavos
    pub amount_centavos: i64,
    /// Channel the payment arrived through
    pub method: PaymentChannel,
    /// Gateway or receipt reference
    pub reference: String,
    /// When the payment was made
    pub paid_at: DateTime<Utc>,
}
