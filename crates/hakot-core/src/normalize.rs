//! Status normalization over legacy payload shapes
//!
//! The billing data source has shipped several historically-evolved JSON
//! shapes: camelCase and snake_case keys, status at the top level or nested
//! under `subscription` (or `data.subscription`), and assorted
//! "has a subscription" flags. All of that variance is resolved here, once,
//! so business-rule code only ever sees the canonical record.
//!
//! Candidate status values are ranked with [`SubscriptionStatus::rank`] and
//! the highest wins. Both entry points are total: null, absent, or malformed
//! input yields an explicit no-access record and never panics.

use serde_json::Value;
use tracing::trace;

use hakot_types::{InvoiceStatus, SubscriptionStatus};

/// Keys that may carry the subscription status at the top level
const STATUS_KEYS: &[&str] = &["status", "subscription_status", "subscriptionStatus", "state"];

/// Keys that may carry the nested subscription object
const SUBSCRIPTION_KEYS: &[&str] = &["subscription", "current_subscription", "currentSubscription"];

/// Keys that may flag subscription presence
const PRESENCE_KEYS: &[&str] = &["has_subscription", "hasSubscription", "subscribed"];

/// Canonical normalized subscription status record
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NormalizedStatus {
    /// Highest-ranked status found in the payload
    pub status: SubscriptionStatus,
    /// Whether the account has a subscription at all
    pub has_subscription: bool,
    /// Status is `active`
    pub is_active: bool,
    /// Status is in the pending-payment family
    pub is_pending: bool,
    /// Subscriber may use the service (active or pending)
    pub can_access: bool,
}

impl NormalizedStatus {
    /// The no-subscription, no-access record returned for empty input
    pub const fn unknown() -> Self {
        Self {
            status: SubscriptionStatus::Unknown,
            has_subscription: false,
            is_active: false,
            is_pending: false,
            can_access: false,
        }
    }

    fn from_parts(status: SubscriptionStatus, presence_flag: bool) -> Self {
        // A usable status implies a subscription even when the legacy
        // presence flag is missing from the payload.
        let has_subscription = presence_flag
            || !matches!(
                status,
                SubscriptionStatus::None | SubscriptionStatus::Unknown
            );

        Self {
            status,
            has_subscription,
            is_active: status == SubscriptionStatus::Active,
            is_pending: status.is_pending(),
            can_access: status.can_access(),
        }
    }
}

/// Normalize a raw subscription payload into the canonical status record.
///
/// Total over arbitrary JSON: anything that is not an object (or that
/// carries no recognizable status) resolves to [`NormalizedStatus::unknown`].
pub fn normalize_subscription_status(raw: &Value) -> NormalizedStatus {
    let Some(obj) = raw.as_object() else {
        return NormalizedStatus::unknown();
    };

    let mut candidates: Vec<SubscriptionStatus> = Vec::new();

    for key in STATUS_KEYS {
        if let Some(s) = obj.get(*key).and_then(Value::as_str) {
            candidates.push(SubscriptionStatus::parse_lenient(s));
        }
    }

    // Nested shapes: subscription.status / subscription.state, possibly
    // wrapped one level deeper under `data`.
    let mut nested_present = false;
    for container in [raw, obj.get("data").unwrap_or(&Value::Null)] {
        for key in SUBSCRIPTION_KEYS {
            if let Some(sub) = container.get(*key) {
                if sub.is_object() {
                    nested_present = true;
                }
                for status_key in ["status", "state"] {
                    if let Some(s) = sub.get(status_key).and_then(Value::as_str) {
                        candidates.push(SubscriptionStatus::parse_lenient(s));
                    }
                }
            }
        }
    }

    let presence_flag = nested_present
        || PRESENCE_KEYS
            .iter()
            .any(|key| obj.get(*key).is_some_and(is_truthy));

    let Some(best) = candidates.iter().copied().max_by_key(|c| c.rank()) else {
        // No status anywhere; a presence flag alone still counts.
        return if presence_flag {
            NormalizedStatus::from_parts(SubscriptionStatus::Unknown, true)
        } else {
            NormalizedStatus::unknown()
        };
    };

    trace!(candidates = candidates.len(), chosen = %best, "normalized subscription status");

    NormalizedStatus::from_parts(best, presence_flag)
}

/// Normalize a raw invoice payload into a canonical invoice status.
///
/// Resolves the same key variance as the subscription normalizer. Returns
/// `None` when the payload carries no invoice at all.
pub fn normalize_invoice_status(raw: &Value) -> Option<InvoiceStatus> {
    let obj = raw.as_object()?;

    for key in ["status", "invoice_status", "invoiceStatus"] {
        if let Some(s) = obj.get(key).and_then(Value::as_str) {
            return Some(InvoiceStatus::parse_lenient(s));
        }
    }

    for container in [raw, obj.get("data").unwrap_or(&Value::Null)] {
        if let Some(inv) = container.get("invoice") {
            if let Some(s) = inv.get("status").and_then(Value::as_str) {
                return Some(InvoiceStatus::parse_lenient(s));
            }
            // An invoice object with no status at all is an unpaid one in
            // the oldest payload shape.
            if inv.is_object() {
                return Some(InvoiceStatus::Unpaid);
            }
        }
    }

    None
}

/// Loose truthiness for legacy presence flags.
///
/// `true`, nonzero numbers, and the strings "true"/"1"/"yes" count.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    }
}
