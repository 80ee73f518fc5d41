//! Action resolution handler

use std::time::Instant;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use hakot_core::resolve_actions;
use hakot_db::SubscriptionRepository;
use hakot_types::{Action, SubscriptionId};

use crate::error::ApiResult;
use crate::handlers::shared::{parse_account_id, record_op_duration};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ActionsQuery {
    pub account_id: String,
}

#[derive(Debug, Serialize)]
pub struct ActionsResponse {
    pub account_id: String,
    pub actions: Vec<Action>,
}

/// GET /api/v1/billing/actions
///
/// Resolves the ordered action list from the normalized status and the
/// evaluated current invoice. An account with no local subscription or no
/// current invoice still resolves; the invoice is simply absent.
pub async fn get_actions(
    State(state): State<AppState>,
    Query(query): Query<ActionsQuery>,
) -> ApiResult<Json<ActionsResponse>> {
    let start = Instant::now();
    let account_id = parse_account_id(&query.account_id)?;

    let normalized = match state.billing_source.get_status(&account_id).await {
        Ok(status) => status,
        Err(e) => {
            record_op_duration("get_actions", start, false);
            return Err(e.into());
        }
    };

    let invoice = match state
        .repos
        .subscriptions
        .find_by_account_id(account_id.0)
        .await?
    {
        Some(sub) => {
            state
                .lifecycle
                .evaluate_current_invoice(SubscriptionId(sub.id), chrono::Utc::now())
                .await?
        }
        None => None,
    };

    let actions = resolve_actions(&normalized, invoice.as_ref());
    record_op_duration("get_actions", start, true);

    Ok(Json(ActionsResponse {
        account_id: account_id.to_string(),
        actions,
    }))
}
