//! PostgreSQL invoice repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::InvoiceRow;
use crate::repo::{CreateInvoice, InvoiceRepository};

/// PostgreSQL invoice repository
#[derive(Clone)]
pub struct PgInvoiceRepository {
    pool: PgPool,
}

impl PgInvoiceRepository {
    /// Create a new invoice repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvoiceRepository for PgInvoiceRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<InvoiceRow>> {
        let invoice = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT id, subscription_id, amount_centavos, due_date, status,
                   late_fee_centavos, generated_at, paid_at
            FROM invoices
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    async fn find_current_for_subscription(
        &self,
        subscription_id: Uuid,
    ) -> DbResult<Option<InvoiceRow>> {
        let invoice = sqlx::query_as::<_, InvoiceRow>(
            r#"
            SELECT id, subscription_id, amount_centavos, due_date, status,
                   late_fee_centavos, generated_at, paid_at
            FROM invoices
            WHERE subscription_id = $1 AND status <> 'voided'
            ORDER BY generated_at DESC
            LIMIT 1
            "#,
        )
        .bind(subscription_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    async fn create(&self, invoice: CreateInvoice) -> DbResult<InvoiceRow> {
        let row = sqlx::query_as::<_, InvoiceRow>(
            r#"
            INSERT INTO invoices (id, subscription_id, amount_centavos, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING id, subscription_id, amount_centavos, due_date, status,
                      late_fee_centavos, generated_at, paid_at
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.subscription_id)
        .bind(invoice.amount_centavos)
        .bind(invoice.due_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<()> {
        sqlx::query("UPDATE invoices SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn apply_late_fee(&self, id: Uuid, fee_centavos: i64) -> DbResult<bool> {
        // The fee is set at most once; a second evaluation matches no rows.
        let result = sqlx::query(
            "UPDATE invoices SET late_fee_centavos = $1 WHERE id = $2 AND late_fee_centavos = 0",
        )
        .bind(fee_centavos)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_paid(&self, id: Uuid, paid_at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query("UPDATE invoices SET status = 'paid', paid_at = $1 WHERE id = $2")
            .bind(paid_at)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
