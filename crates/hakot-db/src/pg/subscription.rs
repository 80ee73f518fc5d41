//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::SubscriptionRow;
use crate::repo::{CreateSubscription, SubscriptionRepository};

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, account_id, plan_id, status, payment_method,
                   billing_start_date, version, created_at, updated_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_by_account_id(&self, account_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, account_id, plan_id, status, payment_method,
                   billing_start_date, version, created_at, updated_at
            FROM subscriptions
            WHERE account_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn create(&self, sub: CreateSubscription) -> DbResult<SubscriptionRow> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscriptions (id, account_id, plan_id, status,
                                       payment_method, billing_start_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, account_id, plan_id, status, payment_method,
                      billing_start_date, version, created_at, updated_at
            "#,
        )
        .bind(sub.id)
        .bind(sub.account_id)
        .bind(sub.plan_id)
        .bind(&sub.status)
        .bind(&sub.payment_method)
        .bind(sub.billing_start_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update_status_checked(
        &self,
        id: Uuid,
        status: &str,
        expected_version: i64,
    ) -> DbResult<bool> {
        // The version guard makes two near-simultaneous commits resolve to
        // exactly one winner; the loser sees zero rows affected.
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = $1, version = version + 1, updated_at = NOW()
            WHERE id = $2 AND version = $3
            "#,
        )
        .bind(status)
        .bind(id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
