//! Reminder schedule handlers

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::handlers::shared::{current_invoice_view, parse_account_id, record_op_duration};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApplyRemindersRequest {
    pub account_id: String,
}

#[derive(Debug, Serialize)]
pub struct ApplyRemindersResponse {
    pub invoice_id: String,
    pub scheduled: usize,
}

#[derive(Debug, Deserialize)]
pub struct SnoozeRequest {
    pub account_id: String,
    pub days: i64,
}

#[derive(Debug, Serialize)]
pub struct SnoozeResponse {
    pub invoice_id: String,
    pub snoozed_until: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CancelRemindersRequest {
    pub account_id: String,
}

#[derive(Debug, Serialize)]
pub struct CancelRemindersResponse {
    pub invoice_id: String,
    pub cancelled: u64,
}

/// POST /api/v1/billing/reminders/apply
///
/// Replaces the reminder schedule for the account's current invoice with
/// the plan derived from its due date. Idempotent.
pub async fn apply_reminders(
    State(state): State<AppState>,
    Json(req): Json<ApplyRemindersRequest>,
) -> ApiResult<Json<ApplyRemindersResponse>> {
    let start = Instant::now();
    let account_id = parse_account_id(&req.account_id)?;

    let view = current_invoice_view(&state, &account_id).await?;
    let result = state.scheduler.apply(&view, Utc::now()).await;
    record_op_duration("apply_reminders", start, result.is_ok());
    let scheduled = result?;

    Ok(Json(ApplyRemindersResponse {
        invoice_id: view.invoice_id.to_string(),
        scheduled,
    }))
}

/// POST /api/v1/billing/reminders/snooze
///
/// Adds one extra reminder `days` from now, leaving the plan untouched.
pub async fn snooze_reminders(
    State(state): State<AppState>,
    Json(req): Json<SnoozeRequest>,
) -> ApiResult<Json<SnoozeResponse>> {
    let start = Instant::now();
    let account_id = parse_account_id(&req.account_id)?;

    let view = current_invoice_view(&state, &account_id).await?;
    let result = state.scheduler.snooze(&view, req.days, Utc::now()).await;
    record_op_duration("snooze_reminders", start, result.is_ok());
    let snoozed_until = result?;

    Ok(Json(SnoozeResponse {
        invoice_id: view.invoice_id.to_string(),
        snoozed_until,
    }))
}

/// POST /api/v1/billing/reminders/cancel
///
/// Cancels every reminder for the account's current invoice.
pub async fn cancel_reminders(
    State(state): State<AppState>,
    Json(req): Json<CancelRemindersRequest>,
) -> ApiResult<Json<CancelRemindersResponse>> {
    let start = Instant::now();
    let account_id = parse_account_id(&req.account_id)?;

    let view = current_invoice_view(&state, &account_id).await?;
    let result = state.scheduler.cancel_all(view.invoice_id).await;
    record_op_duration("cancel_reminders", start, result.is_ok());
    let cancelled = result?;

    Ok(Json(CancelRemindersResponse {
        invoice_id: view.invoice_id.to_string(),
        cancelled,
    }))
}
