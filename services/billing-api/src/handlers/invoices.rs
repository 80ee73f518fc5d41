//! Current invoice handler

use std::time::Instant;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use hakot_types::InvoiceView;

use crate::error::ApiResult;
use crate::handlers::shared::{current_invoice_view, parse_account_id, record_op_duration};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InvoiceQuery {
    pub account_id: String,
}

/// GET /api/v1/billing/invoice
///
/// Evaluates the account's current invoice as of now. Evaluation persists
/// the late fee the first time it applies and promotes the stored status to
/// overdue when the due date has passed.
pub async fn get_invoice(
    State(state): State<AppState>,
    Query(query): Query<InvoiceQuery>,
) -> ApiResult<Json<InvoiceView>> {
    let start = Instant::now();
    let account_id = parse_account_id(&query.account_id)?;

    let result = current_invoice_view(&state, &account_id).await;
    record_op_duration("get_invoice", start, result.is_ok());

    Ok(Json(result?))
}
