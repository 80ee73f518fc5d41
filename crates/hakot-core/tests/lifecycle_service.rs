//! Lifecycle service integration tests
//!
//! Exercises the committing authority against in-memory repositories:
//! payment confirmation, optimistic concurrency, late-fee persistence,
//! and transition enforcement.

mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use common::mock_repos::{
    MockInvoiceRepository, MockPaymentRepository, MockSubscriptionRepository,
};
use hakot_core::{BillingPolicy, ConfirmPayment, CoreError, LifecycleService};
use hakot_db::SubscriptionRepository;
use hakot_types::{InvoiceId, PaymentChannel, SubscriptionId, SubscriptionStatus};

struct Fixture {
    subs: MockSubscriptionRepository,
    invoices: MockInvoiceRepository,
    payments: MockPaymentRepository,
    service: LifecycleService,
}

fn fixture() -> Fixture {
    let subs = MockSubscriptionRepository::new();
    let invoices = MockInvoiceRepository::new();
    let payments = MockPaymentRepository::new();
    let service = LifecycleService::new(
        Arc::new(subs.clone()),
        Arc::new(invoices.clone()),
        Arc::new(payments.clone()),
        BillingPolicy::default(),
    );
    Fixture {
        subs,
        invoices,
        payments,
        service,
    }
}

fn gcash_payment(amount_centavos: i64) -> ConfirmPayment {
    ConfirmPayment {
        amount_centavos,
        method: PaymentChannel::Gcash,
        reference: "gc-ref-001".to_string(),
        paid_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_full_payment_activates_subscription() {
    let f = fixture();
    let sub = MockSubscriptionRepository::test_subscription("pending_gcash");
    let invoice = MockInvoiceRepository::test_invoice(
        sub.id,
        50_000,
        Utc::now() + chrono::Duration::days(5),
    );
    f.subs.insert(sub.clone());
    f.invoices.insert(invoice.clone());

    let outcome = f
        .service
        .confirm_payment(InvoiceId(invoice.id), gcash_payment(50_000))
        .await
        .unwrap();

    assert!(outcome.invoice_paid);
    assert!(!outcome.already_applied);
    assert_eq!(outcome.subscription_status, SubscriptionStatus::Active);
    assert_eq!(f.invoices.get(invoice.id).unwrap().status, "paid");
    assert_eq!(f.payments.count(), 1);
}

#[tokio::test]
async fn test_partial_payment_keeps_invoice_open() {
    let f = fixture();
    let sub = MockSubscriptionRepository::test_subscription("pending_cash");
    let invoice = MockInvoiceRepository::test_invoice(
        sub.id,
        50_000,
        Utc::now() + chrono::Duration::days(5),
    );
    f.subs.insert(sub.clone());
    f.invoices.insert(invoice.clone());

    let outcome = f
        .service
        .confirm_payment(InvoiceId(invoice.id), gcash_payment(20_000))
        .await
        .unwrap();

    assert!(!outcome.invoice_paid);
    assert_eq!(outcome.subscription_status, SubscriptionStatus::PendingCash);
    assert_eq!(f.invoices.get(invoice.id).unwrap().status, "unpaid");
}

#[tokio::test]
async fn test_payment_must_cover_late_fee_too() {
    let f = fixture();
    let sub = MockSubscriptionRepository::test_subscription("pending_gcash");
    let mut invoice = MockInvoiceRepository::test_invoice(
        sub.id,
        50_000,
        Utc::now() - chrono::Duration::days(10),
    );
    invoice.late_fee_centavos = 5_000;
    f.subs.insert(sub.clone());
    f.invoices.insert(invoice.clone());

    // The bare amount no longer settles an invoice carrying a fee.
    let outcome = f
        .service
        .confirm_payment(InvoiceId(invoice.id), gcash_payment(50_000))
        .await
        .unwrap();
    assert!(!outcome.invoice_paid);

    let outcome = f
        .service
        .confirm_payment(InvoiceId(invoice.id), gcash_payment(5_000))
        .await
        .unwrap();
    assert!(outcome.invoice_paid);
}

#[tokio::test]
async fn test_already_paid_invoice_is_a_noop() {
    let f = fixture();
    let sub = MockSubscriptionRepository::test_subscription("active");
    let mut invoice = MockInvoiceRepository::test_invoice(
        sub.id,
        50_000,
        Utc::now() + chrono::Duration::days(5),
    );
    invoice.status = "paid".to_string();
    f.subs.insert(sub.clone());
    f.invoices.insert(invoice.clone());

    let outcome = f
        .service
        .confirm_payment(InvoiceId(invoice.id), gcash_payment(50_000))
        .await
        .unwrap();

    assert!(outcome.invoice_paid);
    assert!(outcome.already_applied);
    // No payment row appended for the duplicate confirmation.
    assert_eq!(f.payments.count(), 0);
}

#[tokio::test]
async fn test_lost_race_with_matching_outcome_is_a_noop() {
    let f = fixture();
    let sub = MockSubscriptionRepository::test_subscription("pending_gcash");
    let invoice = MockInvoiceRepository::test_invoice(
        sub.id,
        50_000,
        Utc::now() + chrono::Duration::days(5),
    );
    f.subs.insert(sub.clone());
    f.invoices.insert(invoice.clone());

    // Simulate a concurrent confirmation that already activated the
    // subscription before our optimistic write lands.
    f.subs.fail_next_update();
    f.subs.force_status(sub.id, "active");

    let outcome = f
        .service
        .confirm_payment(InvoiceId(invoice.id), gcash_payment(50_000))
        .await
        .unwrap();

    assert!(outcome.invoice_paid);
    assert_eq!(outcome.subscription_status, SubscriptionStatus::Active);
}

#[tokio::test]
async fn test_lost_race_with_diverging_outcome_is_a_conflict() {
    let f = fixture();
    let sub = MockSubscriptionRepository::test_subscription("active");
    f.subs.insert(sub.clone());

    f.subs.fail_next_update();
    f.subs.force_status(sub.id, "cancelled");

    let err = f
        .service
        .suspend(SubscriptionId(sub.id))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict));
}

#[tokio::test]
async fn test_invalid_transition_is_rejected_before_write() {
    let f = fixture();
    let sub = MockSubscriptionRepository::test_subscription("cancelled");
    f.subs.insert(sub.clone());

    // Cancelled must route through a pending state; a direct suspend is
    // not an edge.
    let err = f
        .service
        .suspend(SubscriptionId(sub.id))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { .. }));
    // Nothing was written.
    let stored = f.subs.find_by_id(sub.id).await.unwrap().unwrap();
    assert_eq!(stored.status, "cancelled");
}

#[tokio::test]
async fn test_reactivation_enters_pending_state() {
    let f = fixture();
    let sub = MockSubscriptionRepository::test_subscription("cancelled");
    f.subs.insert(sub.clone());

    let status = f
        .service
        .reactivate(SubscriptionId(sub.id), PaymentChannel::ManualGcash)
        .await
        .unwrap();
    assert_eq!(status, SubscriptionStatus::PendingManualGcash);
}

#[tokio::test]
async fn test_late_fee_persisted_exactly_once() {
    let f = fixture();
    let sub = MockSubscriptionRepository::test_subscription("active");
    let due = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
    let invoice = MockInvoiceRepository::test_invoice(sub.id, 50_000, due);
    f.subs.insert(sub.clone());
    f.invoices.insert(invoice.clone());

    let now = Utc.with_ymd_and_hms(2025, 1, 20, 0, 0, 0).unwrap();

    let view = f
        .service
        .evaluate_current_invoice(SubscriptionId(sub.id), now)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.late_fee_centavos, 5_000);
    assert_eq!(f.invoices.get(invoice.id).unwrap().late_fee_centavos, 5_000);

    // Second evaluation observes the same fee without adding to it.
    let view = f
        .service
        .evaluate_current_invoice(SubscriptionId(sub.id), now + chrono::Duration::days(30))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(view.late_fee_centavos, 5_000);
    assert_eq!(view.total_due_centavos, 55_000);
    assert_eq!(f.invoices.get(invoice.id).unwrap().late_fee_centavos, 5_000);
}

#[tokio::test]
async fn test_no_current_invoice_evaluates_to_none() {
    let f = fixture();
    let sub = MockSubscriptionRepository::test_subscription("active");
    f.subs.insert(sub.clone());

    let view = f
        .service
        .evaluate_current_invoice(SubscriptionId(sub.id), Utc::now())
        .await
        .unwrap();
    assert!(view.is_none());
}

#[tokio::test]
async fn test_missing_invoice_is_not_found() {
    let f = fixture();
    let err = f
        .service
        .confirm_payment(InvoiceId::new(), gcash_payment(50_000))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvoiceNotFound));
    assert!(err.is_not_found());
}
