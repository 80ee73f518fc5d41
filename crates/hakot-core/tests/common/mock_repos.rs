//! Mock repositories for testing

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use hakot_db::{
    CreateInvoice, CreatePayment, CreateSubscription, DbResult, InvoiceRepository, InvoiceRow,
    PaymentRepository, PaymentRow, SubscriptionRepository, SubscriptionRow,
};

/// In-memory subscription repository for testing
#[derive(Default, Clone)]
pub struct MockSubscriptionRepository {
    subs: Arc<DashMap<Uuid, SubscriptionRow>>,
    /// When set, the next checked update fails once (simulates a lost race)
    fail_next_update: Arc<AtomicBool>,
    /// Status overwrites applied when the simulated race fires, so the
    /// concurrent write lands between the caller's read and its commit
    forced_statuses: Arc<DashMap<Uuid, String>>,
}

impl MockSubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test subscription directly
    pub fn insert(&self, row: SubscriptionRow) {
        self.subs.insert(row.id, row);
    }

    /// Make the next `update_status_checked` lose its optimistic race
    pub fn fail_next_update(&self) {
        self.fail_next_update.store(true, Ordering::SeqCst);
    }

    /// Overwrite the stored status out-of-band, as a concurrent writer would.
    /// The overwrite lands when the simulated race fires, after the caller's
    /// initial read but before its optimistic commit.
    pub fn force_status(&self, id: Uuid, status: &str) {
        self.forced_statuses.insert(id, status.to_string());
    }

    /// Create a test subscription row with the given status
    pub fn test_subscription(status: &str) -> SubscriptionRow {
        SubscriptionRow {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            status: status.to_string(),
            payment_method: "gcash".to_string(),
            billing_start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        Ok(self.subs.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_account_id(&self, account_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        Ok(self
            .subs
            .iter()
            .find(|r| r.account_id == account_id)
            .map(|r| r.value().clone()))
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        let row = SubscriptionRow {
            id: sub.id,
            account_id: sub.account_id,
            plan_id: sub.plan_id,
            status: sub.status,
            payment_method: sub.payment_method,
            billing_start_date: sub.billing_start_date,
            version: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.insert(row.clone());
        Ok(row)
    }

    async fn update_status_checked(
        &self,
        id: Uuid,
        status: &str,
        expected_version: i64,
    ) -> DbResult<bool> {
        if self.fail_next_update.swap(false, Ordering::SeqCst) {
            if let Some((forced_id, forced)) = self.forced_statuses.remove(&id) {
                if let Some(mut row) = self.subs.get_mut(&forced_id) {
                    row.status = forced;
                    row.version += 1;
                }
            }
            return Ok(false);
        }
        let Some(mut row) = self.subs.get_mut(&id) else {
            return Ok(false);
        };
        if row.version != expected_version {
            return Ok(false);
        }
        row.status = status.to_string();
        row.version += 1;
        row.updated_at = Utc::now();
        Ok(true)
    }
}

/// In-memory invoice repository for testing
#[derive(Default, Clone)]
pub struct MockInvoiceRepository {
    invoices: Arc<DashMap<Uuid, InvoiceRow>>,
}

impl MockInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, row: InvoiceRow) {
        self.invoices.insert(row.id, row);
    }

    pub fn get(&self, id: Uuid) -> Option<InvoiceRow> {
        self.invoices.get(&id).map(|r| r.value().clone())
    }

    /// Create a test invoice row
    pub fn test_invoice(
        subscription_id: Uuid,
        amount_centavos: i64,
        due_date: DateTime<Utc>,
    ) -> InvoiceRow {
        InvoiceRow {
            id: Uuid::new_v4(),
            subscription_id,
            amount_centavos,
            due_date,
            status: "unpaid".to_string(),
            late_fee_centavos: 0,
            generated_at: due_date - chrono::Duration::days(14),
            paid_at: None,
        }
    }
}

#[async_trait]
impl InvoiceRepository for MockInvoiceRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<InvoiceRow>> {
        Ok(self.invoices.get(&id).map(|r| r.value().clone()))
    }

    async fn find_current_for_subscription(
        &self,
        subscription_id: Uuid,
    ) -> DbResult<Option<InvoiceRow>> {
        Ok(self
            .invoices
            .iter()
            .filter(|r| r.subscription_id == subscription_id && r.status != "voided")
            .max_by_key(|r| r.generated_at)
            .map(|r| r.value().clone()))
    }

    async fn create(&self, invoice: CreateInvoice) -> DbResult<InvoiceRow> {
        let row = InvoiceRow {
            id: invoice.id,
            subscription_id: invoice.subscription_id,
            amount_centavos: invoice.amount_centavos,
            due_date: invoice.due_date,
            status: "unpaid".to_string(),
            late_fee_centavos: 0,
            generated_at: Utc::now(),
            paid_at: None,
        };
        self.insert(row.clone());
        Ok(row)
    }

    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<()> {
        if let Some(mut row) = self.invoices.get_mut(&id) {
            row.status = status.to_string();
        }
        Ok(())
    }

    async fn apply_late_fee(&self, id: Uuid, fee_centavos: i64) -> DbResult<bool> {
        if let Some(mut row) = self.invoices.get_mut(&id) {
            if row.late_fee_centavos == 0 {
                row.late_fee_centavos = fee_centavos;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn mark_paid(&self, id: Uuid, paid_at: DateTime<Utc>) -> DbResult<()> {
        if let Some(mut row) = self.invoices.get_mut(&id) {
            row.status = "paid".to_string();
            row.paid_at = Some(paid_at);
        }
        Ok(())
    }
}

/// In-memory payment repository for testing
#[derive(Default, Clone)]
pub struct MockPaymentRepository {
    payments: Arc<DashMap<Uuid, PaymentRow>>,
}

impl MockPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.payments.len()
    }
}

#[async_trait]
impl PaymentRepository for MockPaymentRepository {
    async fn find_by_invoice_id(&self, invoice_id: Uuid) -> DbResult<Vec<PaymentRow>> {
        let mut rows: Vec<PaymentRow> = self
            .payments
            .iter()
            .filter(|r| r.invoice_id == invoice_id)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by_key(|r| r.paid_at);
        Ok(rows)
    }

    async fn create(&self, payment: CreatePayment) -> DbResult<PaymentRow> {
        let row = PaymentRow {
            id: payment.id,
            invoice_id: payment.invoice_id,
            amount_centavos: payment.amount_centavos,
            method: payment.method,
            reference: payment.reference,
            paid_at: payment.paid_at,
        };
        self.payments.insert(row.id, row.clone());
        Ok(row)
    }

    async fn total_for_invoice(&self, invoice_id: Uuid) -> DbResult<i64> {
        Ok(self
            .payments
            .iter()
            .filter(|r| r.invoice_id == invoice_id)
            .map(|r| r.amount_centavos)
            .sum())
    }
}
