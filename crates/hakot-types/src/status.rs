//! Subscription and invoice status enums
//!
//! `SubscriptionStatus` carries an explicit rank so that callers choosing
//! between several candidate status values (legacy payloads expose more than
//! one) can pick deterministically without an ad-hoc priority array.

use serde::{Deserialize, Serialize};

/// Canonical subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// No subscription exists for the account
    None,
    /// Awaiting automatic GCash payment
    PendingGcash,
    /// Awaiting manual verification of an uploaded GCash receipt
    PendingManualGcash,
    /// Awaiting cash collection by the collector
    PendingCash,
    /// Subscription is active
    Active,
    /// Suspended for non-payment
    Suspended,
    /// Cancelled by the subscriber
    Cancelled,
    /// Lapsed at end of billing term
    Expired,
    /// Last payment attempt failed
    PaymentFailed,
    /// Status could not be determined
    Unknown,
}

impl SubscriptionStatus {
    /// Rank used to pick among multiple candidate status values.
    ///
    /// Higher wins. `Active` outranks every pending state; legacy payloads
    /// that report both an active subscription and a stale pending flag
    /// resolve to active. `Unknown` loses to everything.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::None => 1,
            Self::Expired => 2,
            Self::Cancelled => 3,
            Self::PaymentFailed => 4,
            Self::Suspended => 5,
            Self::PendingCash => 6,
            Self::PendingManualGcash => 7,
            Self::PendingGcash => 8,
            Self::Active => 9,
        }
    }

    /// True for the pending-payment family of states
    pub const fn is_pending(self) -> bool {
        matches!(
            self,
            Self::PendingGcash | Self::PendingManualGcash | Self::PendingCash
        )
    }

    /// True when the subscriber may use the service
    pub const fn can_access(self) -> bool {
        matches!(self, Self::Active) || self.is_pending()
    }

    /// Wire/database representation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::PendingGcash => "pending_gcash",
            Self::PendingManualGcash => "pending_manual_gcash",
            Self::PendingCash => "pending_cash",
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::PaymentFailed => "payment_failed",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a raw status string, tolerating legacy spellings.
    ///
    /// Unrecognized values map to `Unknown` rather than failing; raw
    /// payloads are not trusted to stay within the enum.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "none" | "no_subscription" => Self::None,
            "pending_gcash" | "pending-gcash" | "pendinggcash" => Self::PendingGcash,
            "pending_manual_gcash" | "pending_gcash_manual" | "pendingmanualgcash" => {
                Self::PendingManualGcash
            }
            "pending_cash" | "pending-cash" | "pendingcash" => Self::PendingCash,
            "active" | "subscribed" => Self::Active,
            "suspended" => Self::Suspended,
            "cancelled" | "canceled" => Self::Cancelled,
            "expired" => Self::Expired,
            "payment_failed" | "payment-failed" | "failed" => Self::PaymentFailed,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Invoice payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Generated, not yet paid
    Unpaid,
    /// Fully paid
    Paid,
    /// Past due date and unpaid
    Overdue,
    /// Voided, no longer collectible
    Voided,
    /// Payment submitted, awaiting confirmation
    Processing,
}

impl InvoiceStatus {
    /// Wire/database representation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Voided => "voided",
            Self::Processing => "processing",
        }
    }

    /// Parse a raw invoice status, tolerating legacy spellings.
    ///
    /// `"pending"` is the historical spelling of `Processing`; anything
    /// unrecognized on a present invoice is treated as `Unpaid`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "paid" | "settled" => Self::Paid,
            "overdue" | "past_due" | "pastdue" => Self::Overdue,
            "voided" | "void" => Self::Voided,
            "processing" | "pending" => Self::Processing,
            _ => Self::Unpaid,
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment channel for a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChannel {
    /// Automatic GCash charge
    Gcash,
    /// Manually verified GCash receipt upload
    ManualGcash,
    /// Cash handed to the collector
    Cash,
}

impl PaymentChannel {
    /// Wire/database representation
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gcash => "gcash",
            Self::ManualGcash => "manual_gcash",
            Self::Cash => "cash",
        }
    }

    /// The pending state a subscription enters while this channel settles
    pub const fn pending_status(self) -> SubscriptionStatus {
        match self {
            Self::Gcash => SubscriptionStatus::PendingGcash,
            Self::ManualGcash => SubscriptionStatus::PendingManualGcash,
            Self::Cash => SubscriptionStatus::PendingCash,
        }
    }
}

impl std::fmt::Display for PaymentChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentChannel {
    type Err = crate::HakotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gcash" => Ok(Self::Gcash),
            "manual_gcash" | "gcash_manual" => Ok(Self::ManualGcash),
            "cash" => Ok(Self::Cash),
            other => Err(crate::HakotError::InvalidPaymentChannel(other.to_string())),
        }
    }
}
