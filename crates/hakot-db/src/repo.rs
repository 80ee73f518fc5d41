//! Repository traits
//!
//! Define async repository interfaces for database operations. Status
//! writes take the expected row version so callers can detect concurrent
//! commits instead of clobbering them.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Find the subscription for an account (most recent)
    async fn find_by_account_id(&self, account_id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Create a new subscription
    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow>;

    /// Update subscription status if the stored version still matches.
    ///
    /// Returns `Ok(false)` when zero rows matched, meaning a concurrent
    /// writer committed first and the caller must re-read and re-validate.
    async fn update_status_checked(
        &self,
        id: Uuid,
        status: &str,
        expected_version: i64,
    ) -> DbResult<bool>;
}

/// Create subscription input
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub id: Uuid,
    pub account_id: Uuid,
    pub plan_id: Uuid,
    pub status: String,
    pub payment_method: String,
    pub billing_start_date: NaiveDate,
}

/// Invoice repository trait
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Find an invoice by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<InvoiceRow>>;

    /// Find the current (most recent, not voided) invoice for a subscription
    async fn find_current_for_subscription(
        &self,
        subscription_id: Uuid,
    ) -> DbResult<Option<InvoiceRow>>;

    /// Create a new invoice
    async fn create(&self, invoice: CreateInvoice) -> DbResult<InvoiceRow>;

    /// Update invoice status
    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<()>;

    /// Set the late fee, only if none has been applied yet.
    ///
    /// Returns `Ok(false)` when the fee was already set; it is applied at
    /// most once per invoice.
    async fn apply_late_fee(&self, id: Uuid, fee_centavos: i64) -> DbResult<bool>;

    /// Mark invoice as paid
    async fn mark_paid(&self, id: Uuid, paid_at: DateTime<Utc>) -> DbResult<()>;
}

/// Create invoice input
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub amount_centavos: i64,
    pub due_date: DateTime<Utc>,
}

/// Payment repository trait
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Find all payments for an invoice
    async fn find_by_invoice_id(&self, invoice_id: Uuid) -> DbResult<Vec<PaymentRow>>;

    /// Record a payment (append-only)
    async fn create(&self, payment: CreatePayment) -> DbResult<PaymentRow>;

    /// Total paid against an invoice, in centavos
    async fn total_for_invoice(&self, invoice_id: Uuid) -> DbResult<i64>;
}

/// Create payment input
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount_centavos: i64,
    pub method: String,
    pub reference: String,
    pub paid_at: DateTime<Utc>,
}

/// Reminder schedule repository trait
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    /// Find all active reminders for an invoice
    async fn find_by_invoice_id(&self, invoice_id: Uuid) -> DbResult<Vec<ReminderRow>>;

    /// Insert one reminder row
    async fn insert(&self, row: ReminderRow) -> DbResult<()>;

    /// Delete every reminder row for an invoice, returning how many went
    async fn delete_for_invoice(&self, invoice_id: Uuid) -> DbResult<u64>;

    /// Delete one reminder row by notification ID
    async fn delete_by_notification_id(&self, notification_id: &str) -> DbResult<()>;

    /// Every invoice that still has schedule rows, for the restart
    /// reconcile pass
    async fn distinct_invoice_ids(&self) -> DbResult<Vec<Uuid>>;
}
