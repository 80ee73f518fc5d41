//! PostgreSQL payment repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::PaymentRow;
use crate::repo::{CreatePayment, PaymentRepository};

/// PostgreSQL payment repository
#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    /// Create a new payment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn find_by_invoice_id(&self, invoice_id: Uuid) -> DbResult<Vec<PaymentRow>> {
        let payments = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, invoice_id, amount_centavos, method, reference, paid_at
            FROM payments
            WHERE invoice_id = $1
            ORDER BY paid_at ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    async fn create(&self, payment: CreatePayment) -> DbResult<PaymentRow> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            INSERT INTO payments (id, invoice_id, amount_centavos, method, reference, paid_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, invoice_id, amount_centavos, method, reference, paid_at
            "#,
        )
        .bind(payment.id)
        .bind(payment.invoice_id)
        .bind(payment.amount_centavos)
        .bind(&payment.method)
        .bind(&payment.reference)
        .bind(payment.paid_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn total_for_invoice(&self, invoice_id: Uuid) -> DbResult<i64> {
        let total: (i64,) = sqlx::query_as(
            "SELECT COALESCE(SUM(amount_centavos), 0) FROM payments WHERE invoice_id = $1",
        )
        .bind(invoice_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.0)
    }
}
