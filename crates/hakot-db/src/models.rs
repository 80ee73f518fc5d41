//! Database row models
//!
//! These types map directly to database rows using SQLx's FromRow derive.
//! Status columns are stored as text; conversion to the typed enums happens
//! at the edge via `parse_lenient`.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Subscription row from the database
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub plan_id: Uuid,
    pub status: String,
    pub payment_method: String,
    pub billing_start_date: NaiveDate,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Plan row from the database
#[derive(Debug, Clone, FromRow)]
pub struct PlanRow {
    pub id: Uuid,
    pub name: String,
    pub price_centavos: i64,
    pub frequency: String,
}

/// Invoice row from the database
#[derive(Debug, Clone, FromRow)]
pub struct InvoiceRow {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub amount_centavos: i64,
    pub due_date: DateTime<Utc>,
    pub status: String,
    pub late_fee_centavos: i64,
    pub generated_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Payment row from the database
#[derive(Debug, Clone, FromRow)]
pub struct PaymentRow {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub amount_centavos: i64,
    pub method: String,
    pub reference: String,
    pub paid_at: DateTime<Utc>,
}

/// Active reminder row from the database
#[derive(Debug, Clone, FromRow)]
pub struct ReminderRow {
    pub invoice_id: Uuid,
    pub offset_key: String,
    pub scheduled_at: DateTime<Utc>,
    pub notification_id: String,
}
