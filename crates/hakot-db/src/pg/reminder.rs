//! PostgreSQL reminder schedule repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::ReminderRow;
use crate::repo::ReminderRepository;

/// PostgreSQL reminder schedule repository
#[derive(Clone)]
pub struct PgReminderRepository {
    pool: PgPool,
}

impl PgReminderRepository {
    /// Create a new reminder repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReminderRepository for PgReminderRepository {
    async fn find_by_invoice_id(&self, invoice_id: Uuid) -> DbResult<Vec<ReminderRow>> {
        let rows = sqlx::query_as::<_, ReminderRow>(
            r#"
            SELECT invoice_id, offset_key, scheduled_at, notification_id
            FROM reminder_schedule
            WHERE invoice_id = $1
            ORDER BY scheduled_at ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn insert(&self, row: ReminderRow) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO reminder_schedule (invoice_id, offset_key, scheduled_at, notification_id)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(row.invoice_id)
        .bind(&row.offset_key)
        .bind(row.scheduled_at)
        .bind(&row.notification_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_for_invoice(&self, invoice_id: Uuid) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM reminder_schedule WHERE invoice_id = $1")
            .bind(invoice_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_by_notification_id(&self, notification_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM reminder_schedule WHERE notification_id = $1")
            .bind(notification_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn distinct_invoice_ids(&self) -> DbResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            "SELECT DISTINCT invoice_id FROM reminder_schedule",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
