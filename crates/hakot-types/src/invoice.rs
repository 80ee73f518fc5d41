//! Invoice types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{InvoiceStatus, SubscriptionId};

/// Unique invoice identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub Uuid);

impl InvoiceId {
    /// Create a new random invoice ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an invoice ID from its string form
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for InvoiceId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An invoice for one billing cycle
///
/// Exactly one current (most recent, not superseded) invoice exists per
/// subscription. `due_date` is immutable after generation and the late fee
/// is set at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice ID
    pub id: InvoiceId,
    /// Subscription being billed
    pub subscription_id: SubscriptionId,
    /// Billed amount in centavos
    pub amount_centavos: i64,
    /// Payment deadline
    pub due_date: DateTime<Utc>,
    /// Payment status
    pub status: InvoiceStatus,
    /// Late fee in centavos, zero until applied
    pub late_fee_centavos: i64,
    /// When the invoice was generated
    pub generated_at: DateTime<Utc>,
    /// When the invoice was paid, if paid
    pub paid_at: Option<DateTime<Utc>>,
}

/// Evaluated, read-only view of an invoice at a point in time
///
/// Produced by the invoice engine; drives action resolution and reminder
/// planning. `is_overdue` is false whenever the invoice is paid, regardless
/// of dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceView {
    /// Invoice ID
    pub invoice_id: InvoiceId,
    /// Status at evaluation time
    pub status: InvoiceStatus,
    /// Whether the invoice is paid
    pub is_paid: bool,
    /// Whether the invoice is past due and unpaid
    pub is_overdue: bool,
    /// Billed amount in centavos
    pub amount_centavos: i64,
    /// Payment deadline
    pub due_date: DateTime<Utc>,
    /// Late fee in centavos (possibly newly applied by this evaluation)
    pub late_fee_centavos: i64,
    /// Amount plus late fee
    pub total_due_centavos: i64,
    /// Whole days until the due date (ceiling), zero once past
    pub days_until_due: i64,
    /// Whole days past the due date (ceiling), zero when not yet due
    pub days_overdue: i64,
}

impl InvoiceView {
    /// True when the subscriber still owes something on this invoice
    pub fn is_payable(&self) -> bool {
        matches!(self.status, InvoiceStatus::Unpaid | InvoiceStatus::Overdue)
    }
}
