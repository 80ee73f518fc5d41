//! Normalized subscription status handler

use std::time::Instant;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use hakot_core::NormalizedStatus;

use crate::error::ApiResult;
use crate::handlers::shared::{parse_account_id, record_op_duration};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub account_id: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub account_id: String,
    #[serde(flatten)]
    pub status: NormalizedStatus,
}

/// GET /api/v1/billing/status
///
/// Fetches the account's raw subscription document from the billing source
/// (through the cache) and returns the normalized status record.
pub async fn get_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<StatusResponse>> {
    let start = Instant::now();
    let account_id = parse_account_id(&query.account_id)?;

    let result = state.billing_source.get_status(&account_id).await;
    record_op_duration("get_status", start, result.is_ok());
    let status = result?;

    Ok(Json(StatusResponse {
        account_id: account_id.to_string(),
        status,
    }))
}
