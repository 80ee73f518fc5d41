//! Invoice evaluation
//!
//! Pure computation of due-date relationships, the flat late fee, and the
//! total owed. `evaluate` has no side effects; persisting a newly applied
//! fee is the caller's responsibility (see `LifecycleService`).

use chrono::{DateTime, Utc};

use hakot_types::{Invoice, InvoiceStatus, InvoiceView};

use crate::config::BillingPolicy;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Evaluates invoices against a billing policy
#[derive(Debug, Clone, Copy)]
pub struct InvoiceEngine {
    policy: BillingPolicy,
}

impl InvoiceEngine {
    /// Create an engine with the given policy
    pub fn new(policy: BillingPolicy) -> Self {
        Self { policy }
    }

    /// The policy this engine applies
    pub fn policy(&self) -> BillingPolicy {
        self.policy
    }

    /// Evaluate an invoice at a point in time.
    ///
    /// `is_overdue` is false whenever the invoice is paid, regardless of
    /// dates. The flat late fee appears in the view the first time the
    /// invoice is observed overdue beyond the grace period; an invoice that
    /// already carries a fee never accrues another one.
    pub fn evaluate(&self, invoice: &Invoice, now: DateTime<Utc>) -> InvoiceView {
        let is_paid = invoice.status == InvoiceStatus::Paid;
        let is_overdue = invoice.due_date < now && !is_paid;

        let days_until_due = ceil_days(invoice.due_date.timestamp_millis() - now.timestamp_millis());
        let days_overdue = if is_overdue {
            ceil_days(now.timestamp_millis() - invoice.due_date.timestamp_millis())
        } else {
            0
        };

        let collectible = matches!(
            invoice.status,
            InvoiceStatus::Unpaid | InvoiceStatus::Overdue
        );
        let late_fee_centavos = if invoice.late_fee_centavos > 0 {
            invoice.late_fee_centavos
        } else if collectible && is_overdue && days_overdue > self.policy.grace_days {
            self.policy.flat_late_fee_centavos
        } else {
            0
        };

        // Surface the overdue state in the view status so downstream
        // consumers need not re-derive it from dates.
        let status = if is_overdue && invoice.status == InvoiceStatus::Unpaid {
            InvoiceStatus::Overdue
        } else {
            invoice.status
        };

        InvoiceView {
            invoice_id: invoice.id,
            status,
            is_paid,
            is_overdue,
            amount_centavos: invoice.amount_centavos,
            due_date: invoice.due_date,
            late_fee_centavos,
            total_due_centavos: invoice.amount_centavos + late_fee_centavos,
            days_until_due,
            days_overdue,
        }
    }
}

impl Default for InvoiceEngine {
    fn default() -> Self {
        Self::new(BillingPolicy::default())
    }
}

/// Ceiling-divide a millisecond difference into whole days, clamping
/// negatives to zero.
fn ceil_days(diff_millis: i64) -> i64 {
    if diff_millis <= 0 {
        0
    } else {
        (diff_millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use hakot_types::{InvoiceId, SubscriptionId};

    fn invoice(status: InvoiceStatus, due: DateTime<Utc>, late_fee: i64) -> Invoice {
        Invoice {
            id: InvoiceId::new(),
            subscription_id: SubscriptionId::new(),
            amount_centavos: 50_000,
            due_date: due,
            status,
            late_fee_centavos: late_fee,
            generated_at: due - chrono::Duration::days(14),
            paid_at: None,
        }
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_overdue_when_due_yesterday() {
        let now = at(2025, 1, 11);
        let view = InvoiceEngine::default().evaluate(&invoice(InvoiceStatus::Unpaid, at(2025, 1, 10), 0), now);
        assert!(view.is_overdue);
        assert_eq!(view.status, InvoiceStatus::Overdue);
        assert_eq!(view.days_overdue, 1);
    }

    #[test]
    fn test_not_overdue_when_due_tomorrow() {
        let now = at(2025, 1, 9);
        let view = InvoiceEngine::default().evaluate(&invoice(InvoiceStatus::Unpaid, at(2025, 1, 10), 0), now);
        assert!(!view.is_overdue);
        assert_eq!(view.days_until_due, 1);
        assert_eq!(view.days_overdue, 0);
    }

    #[test]
    fn test_paid_never_overdue_regardless_of_dates() {
        let now = at(2025, 3, 1);
        let view = InvoiceEngine::default().evaluate(&invoice(InvoiceStatus::Paid, at(2025, 1, 10), 0), now);
        assert!(view.is_paid);
        assert!(!view.is_overdue);
        assert_eq!(view.late_fee_centavos, 0);
    }

    #[test]
    fn test_no_fee_within_grace_period() {
        let now = at(2025, 1, 15); // 5 days overdue, grace 7
        let view = InvoiceEngine::default().evaluate(&invoice(InvoiceStatus::Unpaid, at(2025, 1, 10), 0), now);
        assert!(view.is_overdue);
        assert_eq!(view.late_fee_centavos, 0);
        assert_eq!(view.total_due_centavos, 50_000);
    }

    #[test]
    fn test_concrete_late_fee_scenario() {
        // amount P500, due 2025-01-10, grace 7 days, flat fee P50,
        // now 2025-01-20: overdue 10 days, fee P50 (not P500), total P550.
        let engine = InvoiceEngine::new(
            BillingPolicy::new().with_grace_days(7).with_flat_late_fee(5_000),
        );
        let now = at(2025, 1, 20);
        let view = engine.evaluate(&invoice(InvoiceStatus::Unpaid, at(2025, 1, 10), 0), now);

        assert!(view.is_overdue);
        assert_eq!(view.days_overdue, 10);
        assert_eq!(view.late_fee_centavos, 5_000);
        assert_eq!(view.total_due_centavos, 55_000);
    }

    #[test]
    fn test_fee_is_not_applied_twice() {
        let engine = InvoiceEngine::default();
        let now = at(2025, 2, 1);
        // Invoice already carries the fee from an earlier evaluation.
        let view = engine.evaluate(&invoice(InvoiceStatus::Overdue, at(2025, 1, 10), 5_000), now);
        assert_eq!(view.late_fee_centavos, 5_000);
        assert_eq!(view.total_due_centavos, 55_000);
    }

    #[test]
    fn test_fee_does_not_scale_with_days() {
        let engine = InvoiceEngine::default();
        let ten_days = engine.evaluate(&invoice(InvoiceStatus::Unpaid, at(2025, 1, 10), 0), at(2025, 1, 20));
        let ninety_days = engine.evaluate(&invoice(InvoiceStatus::Unpaid, at(2025, 1, 10), 0), at(2025, 4, 10));
        assert_eq!(ten_days.late_fee_centavos, ninety_days.late_fee_centavos);
    }

    #[test]
    fn test_voided_invoice_accrues_no_fee() {
        let now = at(2025, 3, 1);
        let view = InvoiceEngine::default().evaluate(&invoice(InvoiceStatus::Voided, at(2025, 1, 10), 0), now);
        assert_eq!(view.late_fee_centavos, 0);
        assert_eq!(view.status, InvoiceStatus::Voided);
    }

    #[test]
    fn test_ceiling_day_counts() {
        let due = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 9, 13, 0, 0).unwrap();
        // 23 hours away rounds up to one whole day.
        let view = InvoiceEngine::default().evaluate(&invoice(InvoiceStatus::Unpaid, due, 0), now);
        assert_eq!(view.days_until_due, 1);
    }

    #[test]
    fn test_total_due_is_amount_plus_fee() {
        let engine = InvoiceEngine::default();
        for (due, now) in [
            (at(2025, 1, 10), at(2025, 1, 1)),
            (at(2025, 1, 10), at(2025, 1, 20)),
            (at(2025, 1, 10), at(2025, 6, 1)),
        ] {
            let view = engine.evaluate(&invoice(InvoiceStatus::Unpaid, due, 0), now);
            assert_eq!(
                view.total_due_centavos,
                view.amount_centavos + view.late_fee_centavos
            );
        }
    }
}
