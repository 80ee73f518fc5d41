//! Shared handler utilities

use std::time::Instant;

use hakot_db::SubscriptionRepository;
use hakot_types::{AccountId, InvoiceView, SubscriptionId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Parse an account ID from a query or body string.
pub fn parse_account_id(raw: &str) -> Result<AccountId, ApiError> {
    AccountId::parse(raw).map_err(|_| ApiError::BadRequest("Invalid account_id".to_string()))
}

/// Look up the local subscription row for an account.
pub async fn subscription_for_account(
    state: &AppState,
    account_id: &AccountId,
) -> ApiResult<hakot_db::SubscriptionRow> {
    state
        .repos
        .subscriptions
        .find_by_account_id(account_id.0)
        .await?
        .ok_or(ApiError::SubscriptionNotFound)
}

/// Evaluate the current invoice for an account, requiring one to exist.
pub async fn current_invoice_view(
    state: &AppState,
    account_id: &AccountId,
) -> ApiResult<InvoiceView> {
    let sub = subscription_for_account(state, account_id).await?;
    state
        .lifecycle
        .evaluate_current_invoice(SubscriptionId(sub.id), chrono::Utc::now())
        .await?
        .ok_or(ApiError::InvoiceNotFound)
}

/// Record HTTP operation duration with result label.
///
/// Labels: operation, result (ok/err)
#[inline]
pub fn record_op_duration(operation: &'static str, start: Instant, success: bool) {
    let result = if success { "ok" } else { "err" };
    metrics::histogram!(
        "billing_operation_duration_seconds",
        "operation" => operation,
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}
