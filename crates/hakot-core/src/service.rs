//! Lifecycle service: the committing authority.
//!
//! Every subscription status write in the system flows through this
//! service: it validates the transition first, then commits with an
//! optimistic version check so that two near-simultaneous confirmations
//! resolve to exactly one winner. The loser re-reads, and either no-ops
//! (the desired state already holds) or fails with a conflict.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use hakot_db::{
    CreatePayment, InvoiceRepository, InvoiceRow, PaymentRepository, SubscriptionRepository,
    SubscriptionRow,
};
use hakot_types::{
    Invoice, InvoiceId, InvoiceStatus, InvoiceView, PaymentChannel, PaymentId, SubscriptionId,
    SubscriptionStatus,
};

use crate::config::BillingPolicy;
use crate::error::CoreError;
use crate::invoice::InvoiceEngine;
use crate::transition::validate_transition;

/// Payment details accepted from a verified gateway event or receipt
#[derive(Debug, Clone)]
pub struct ConfirmPayment {
    /// Paid amount in centavos
    pub amount_centavos: i64,
    /// Channel the payment arrived through
    pub method: PaymentChannel,
    /// Gateway or receipt reference
    pub reference: String,
    /// When the payment was made
    pub paid_at: DateTime<Utc>,
}

/// Result of a payment confirmation
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    /// Invoice the payment applied to
    pub invoice_id: InvoiceId,
    /// Whether the invoice is now fully paid
    pub invoice_paid: bool,
    /// Subscription status after the commit
    pub subscription_status: SubscriptionStatus,
    /// True when a concurrent commit had already applied the same outcome
    pub already_applied: bool,
}

/// Lifecycle service over the billing repositories
pub struct LifecycleService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    payments: Arc<dyn PaymentRepository>,
    engine: InvoiceEngine,
}

impl LifecycleService {
    /// Create a new lifecycle service
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        payments: Arc<dyn PaymentRepository>,
        policy: BillingPolicy,
    ) -> Self {
        Self {
            subscriptions,
            invoices,
            payments,
            engine: InvoiceEngine::new(policy),
        }
    }

    /// The invoice engine this service evaluates with
    pub fn engine(&self) -> &InvoiceEngine {
        &self.engine
    }

    /// Record a confirmed payment against an invoice.
    ///
    /// Appends the payment, and once total payments cover the amount plus
    /// any late fee, marks the invoice paid and commits the subscription
    /// transition to active. Idempotent for an already-paid invoice.
    #[instrument(skip(self, payment), fields(invoice_id = %invoice_id))]
    pub async fn confirm_payment(
        &self,
        invoice_id: InvoiceId,
        payment: ConfirmPayment,
    ) -> Result<PaymentOutcome, CoreError> {
        let row = self
            .invoices
            .find_by_id(invoice_id.0)
            .await?
            .ok_or(CoreError::InvoiceNotFound)?;

        let sub_row = self
            .subscriptions
            .find_by_id(row.subscription_id)
            .await?
            .ok_or(CoreError::SubscriptionNotFound)?;

        if InvoiceStatus::parse_lenient(&row.status) == InvoiceStatus::Paid {
            info!(invoice_id = %invoice_id, "payment confirmation for already-paid invoice, no-op");
            return Ok(PaymentOutcome {
                invoice_id,
                invoice_paid: true,
                subscription_status: SubscriptionStatus::parse_lenient(&sub_row.status),
                already_applied: true,
            });
        }

        self.payments
            .create(CreatePayment {
                id: PaymentId::new().0,
                invoice_id: invoice_id.0,
                amount_centavos: payment.amount_centavos,
                method: payment.method.as_str().to_string(),
                reference: payment.reference,
                paid_at: payment.paid_at,
            })
            .await?;

        let total_paid = self.payments.total_for_invoice(invoice_id.0).await?;
        let owed = row.amount_centavos + row.late_fee_centavos;

        if total_paid < owed {
            info!(total_paid, owed, "partial payment recorded, invoice still open");
            return Ok(PaymentOutcome {
                invoice_id,
                invoice_paid: false,
                subscription_status: SubscriptionStatus::parse_lenient(&sub_row.status),
                already_applied: false,
            });
        }

        self.invoices.mark_paid(invoice_id.0, payment.paid_at).await?;

        let status = self
            .commit_transition(&sub_row, SubscriptionStatus::Active)
            .await?;

        info!(invoice_id = %invoice_id, "invoice paid, subscription active");

        Ok(PaymentOutcome {
            invoice_id,
            invoice_paid: true,
            subscription_status: status,
            already_applied: false,
        })
    }

    /// Record a failed payment attempt for a subscription.
    pub async fn record_payment_failure(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<SubscriptionStatus, CoreError> {
        let row = self.load_subscription(subscription_id).await?;
        self.commit_transition(&row, SubscriptionStatus::PaymentFailed)
            .await
    }

    /// Cancel a subscription.
    pub async fn request_cancellation(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<SubscriptionStatus, CoreError> {
        let row = self.load_subscription(subscription_id).await?;
        self.commit_transition(&row, SubscriptionStatus::Cancelled)
            .await
    }

    /// Suspend a subscription for non-payment.
    pub async fn suspend(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<SubscriptionStatus, CoreError> {
        let row = self.load_subscription(subscription_id).await?;
        self.commit_transition(&row, SubscriptionStatus::Suspended)
            .await
    }

    /// Expire a subscription at end of term.
    pub async fn expire(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<SubscriptionStatus, CoreError> {
        let row = self.load_subscription(subscription_id).await?;
        self.commit_transition(&row, SubscriptionStatus::Expired)
            .await
    }

    /// Reactivate a lapsed subscription through the pending state of the
    /// chosen payment channel. Never transitions directly to active.
    pub async fn reactivate(
        &self,
        subscription_id: SubscriptionId,
        method: PaymentChannel,
    ) -> Result<SubscriptionStatus, CoreError> {
        let row = self.load_subscription(subscription_id).await?;
        self.commit_transition(&row, method.pending_status()).await
    }

    /// Evaluate the current invoice for a subscription and persist the late
    /// fee the first time it becomes non-zero.
    ///
    /// Re-evaluating an invoice that already carries the fee never adds it
    /// again; the repository write is guarded too.
    #[instrument(skip(self), fields(subscription_id = %subscription_id))]
    pub async fn evaluate_current_invoice(
        &self,
        subscription_id: SubscriptionId,
        now: DateTime<Utc>,
    ) -> Result<Option<InvoiceView>, CoreError> {
        let Some(row) = self
            .invoices
            .find_current_for_subscription(subscription_id.0)
            .await?
        else {
            return Ok(None);
        };

        let invoice = invoice_from_row(&row);
        let view = self.engine.evaluate(&invoice, now);

        if view.late_fee_centavos > 0 && invoice.late_fee_centavos == 0 {
            let applied = self
                .invoices
                .apply_late_fee(invoice.id.0, view.late_fee_centavos)
                .await?;
            if applied {
                info!(invoice_id = %invoice.id, fee = view.late_fee_centavos, "late fee applied");
            }
        }

        if view.status == InvoiceStatus::Overdue && invoice.status == InvoiceStatus::Unpaid {
            self.invoices
                .update_status(invoice.id.0, InvoiceStatus::Overdue.as_str())
                .await?;
        }

        Ok(Some(view))
    }

    /// Evaluate one invoice by ID, without persisting anything.
    ///
    /// The reminder reconcile pass uses this to rebuild views for invoices
    /// that still carry schedule rows, whether or not they are the current
    /// invoice of their subscription.
    pub async fn evaluate_invoice(
        &self,
        invoice_id: InvoiceId,
        now: DateTime<Utc>,
    ) -> Result<Option<InvoiceView>, CoreError> {
        let Some(row) = self.invoices.find_by_id(invoice_id.0).await? else {
            return Ok(None);
        };
        Ok(Some(self.engine.evaluate(&invoice_from_row(&row), now)))
    }

    async fn load_subscription(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<SubscriptionRow, CoreError> {
        self.subscriptions
            .find_by_id(subscription_id.0)
            .await?
            .ok_or(CoreError::SubscriptionNotFound)
    }

    /// Validate and commit a status transition with an optimistic version
    /// check. On a lost race, re-reads: if the desired status already
    /// holds the commit is a no-op, otherwise it is a conflict.
    async fn commit_transition(
        &self,
        row: &SubscriptionRow,
        to: SubscriptionStatus,
    ) -> Result<SubscriptionStatus, CoreError> {
        let from = SubscriptionStatus::parse_lenient(&row.status);

        if from == to {
            return Ok(from);
        }

        let check = validate_transition(from, to);
        if !check.is_valid {
            return Err(CoreError::InvalidTransition {
                from,
                to,
                reason: check.reason.unwrap_or_default(),
            });
        }

        let committed = self
            .subscriptions
            .update_status_checked(row.id, to.as_str(), row.version)
            .await?;

        if committed {
            return Ok(to);
        }

        // Lost the race; re-read and re-validate.
        warn!(subscription_id = %row.id, "optimistic commit lost, re-reading");
        let fresh = self
            .subscriptions
            .find_by_id(row.id)
            .await?
            .ok_or(CoreError::SubscriptionNotFound)?;
        let current = SubscriptionStatus::parse_lenient(&fresh.status);

        if current == to {
            Ok(current)
        } else {
            Err(CoreError::Conflict)
        }
    }
}

/// Convert an invoice row into the domain invoice
pub fn invoice_from_row(row: &InvoiceRow) -> Invoice {
    Invoice {
        id: InvoiceId(row.id),
        subscription_id: SubscriptionId(row.subscription_id),
        amount_centavos: row.amount_centavos,
        due_date: row.due_date,
        status: InvoiceStatus::parse_lenient(&row.status),
        late_fee_centavos: row.late_fee_centavos,
        generated_at: row.generated_at,
        paid_at: row.paid_at,
    }
}
