//! User-facing action resolution
//!
//! A fixed per-status rule table mapping the normalized status (plus the
//! evaluated current invoice, when there is one) to an ordered action list.
//! At most one action is primary, and it always sorts first.

use hakot_types::{Action, ActionId, InvoiceView, SubscriptionStatus};

use crate::normalize::NormalizedStatus;

/// Base actions every subscriber sees, in fixed order
const BASE_ACTIONS: &[ActionId] = &[
    ActionId::ViewSchedule,
    ActionId::PaymentHistory,
    ActionId::ContactSupport,
];

/// Resolve the ordered action list for a normalized status.
///
/// Deterministic: the same inputs always produce the same list. The result
/// is ephemeral and never persisted.
pub fn resolve_actions(
    normalized: &NormalizedStatus,
    invoice: Option<&InvoiceView>,
) -> Vec<Action> {
    use SubscriptionStatus as S;

    if !normalized.has_subscription {
        return vec![Action::primary(ActionId::Subscribe)];
    }

    match normalized.status {
        S::None | S::Unknown => vec![Action::primary(ActionId::Subscribe)],

        S::Active => {
            let mut actions = Vec::with_capacity(7);
            // Only an invoice currently due promotes a payment action to
            // primary; otherwise nothing is highlighted.
            if invoice.is_some_and(InvoiceView::is_payable) {
                actions.push(Action::primary(ActionId::PayInvoice));
            }
            actions.extend(BASE_ACTIONS.iter().copied().map(Action::new));
            actions.push(Action::new(ActionId::ViewReceipt));
            actions.push(Action::new(ActionId::RenewSubscription));
            actions.push(Action::new(ActionId::CancelSubscription));
            actions
        }

        S::PendingGcash => with_primary(ActionId::ContinueGcashPayment),
        S::PendingManualGcash => with_primary(ActionId::UploadReceipt),

        // The collector takes cash on the doorstep; no payment action.
        S::PendingCash => BASE_ACTIONS.iter().copied().map(Action::new).collect(),

        S::Suspended | S::Cancelled | S::Expired | S::PaymentFailed => {
            with_primary(ActionId::ReactivateSubscription)
        }
    }
}

fn with_primary(primary: ActionId) -> Vec<Action> {
    let mut actions = Vec::with_capacity(1 + BASE_ACTIONS.len());
    actions.push(Action::primary(primary));
    actions.extend(BASE_ACTIONS.iter().copied().map(Action::new));
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_subscription_status;
    use chrono::{TimeZone, Utc};
    use hakot_types::{InvoiceId, InvoiceStatus};
    use serde_json::json;

    fn normalized_for(status: &str) -> NormalizedStatus {
        normalize_subscription_status(&json!({ "status": status }))
    }

    fn payable_view() -> InvoiceView {
        InvoiceView {
            invoice_id: InvoiceId::new(),
            status: InvoiceStatus::Unpaid,
            is_paid: false,
            is_overdue: false,
            amount_centavos: 50_000,
            due_date: Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap(),
            late_fee_centavos: 0,
            total_due_centavos: 50_000,
            days_until_due: 3,
            days_overdue: 0,
        }
    }

    fn primary_count(actions: &[Action]) -> usize {
        actions.iter().filter(|a| a.primary).count()
    }

    #[test]
    fn test_no_subscription_is_exactly_subscribe() {
        let actions = resolve_actions(&NormalizedStatus::unknown(), None);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].id, ActionId::Subscribe);
        assert!(actions[0].primary);
    }

    #[test]
    fn test_active_without_invoice_has_no_primary() {
        let actions = resolve_actions(&normalized_for("active"), None);
        assert_eq!(primary_count(&actions), 0);
        let ids: Vec<ActionId> = actions.iter().map(|a| a.id).collect();
        assert!(ids.contains(&ActionId::RenewSubscription));
        assert!(ids.contains(&ActionId::CancelSubscription));
        assert!(ids.contains(&ActionId::ViewReceipt));
    }

    #[test]
    fn test_active_with_due_invoice_promotes_payment() {
        let view = payable_view();
        let actions = resolve_actions(&normalized_for("active"), Some(&view));
        assert_eq!(primary_count(&actions), 1);
        assert_eq!(actions[0].id, ActionId::PayInvoice);
    }

    #[test]
    fn test_active_with_paid_invoice_has_no_primary() {
        let mut view = payable_view();
        view.status = InvoiceStatus::Paid;
        view.is_paid = true;
        let actions = resolve_actions(&normalized_for("active"), Some(&view));
        assert_eq!(primary_count(&actions), 0);
    }

    #[test]
    fn test_pending_gcash_primary() {
        let actions = resolve_actions(&normalized_for("pending_gcash"), None);
        assert_eq!(actions[0].id, ActionId::ContinueGcashPayment);
        assert!(actions[0].primary);
        assert_eq!(primary_count(&actions), 1);
    }

    #[test]
    fn test_pending_manual_gcash_primary() {
        let actions = resolve_actions(&normalized_for("pending_manual_gcash"), None);
        assert_eq!(actions[0].id, ActionId::UploadReceipt);
        assert!(actions[0].primary);
    }

    #[test]
    fn test_pending_cash_has_no_payment_action() {
        let actions = resolve_actions(&normalized_for("pending_cash"), None);
        assert_eq!(primary_count(&actions), 0);
        let ids: Vec<ActionId> = actions.iter().map(|a| a.id).collect();
        assert_eq!(
            ids,
            vec![
                ActionId::ViewSchedule,
                ActionId::PaymentHistory,
                ActionId::ContactSupport
            ]
        );
    }

    #[test]
    fn test_lapsed_states_offer_reactivation() {
        for status in ["suspended", "cancelled", "expired", "payment_failed"] {
            let actions = resolve_actions(&normalized_for(status), None);
            assert_eq!(actions[0].id, ActionId::ReactivateSubscription, "{status}");
            assert!(actions[0].primary);
            assert_eq!(primary_count(&actions), 1);
        }
    }

    #[test]
    fn test_at_most_one_primary_and_primary_first() {
        for status in [
            "active",
            "pending_gcash",
            "pending_manual_gcash",
            "pending_cash",
            "suspended",
            "cancelled",
            "expired",
            "payment_failed",
        ] {
            let view = payable_view();
            let actions = resolve_actions(&normalized_for(status), Some(&view));
            assert!(primary_count(&actions) <= 1, "{status}");
            for (i, action) in actions.iter().enumerate() {
                if action.primary {
                    assert_eq!(i, 0, "primary must sort first for {status}");
                }
            }
        }
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let view = payable_view();
        let a = resolve_actions(&normalized_for("active"), Some(&view));
        let b = resolve_actions(&normalized_for("active"), Some(&view));
        assert_eq!(a, b);
    }
}
