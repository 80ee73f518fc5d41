//! Payment gateway webhook handler

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use std::time::Instant;

use hakot_core::{ConfirmPayment, CoreError, GatewayEventType, PaymentEventData};
use hakot_db::InvoiceRepository;
use hakot_types::SubscriptionId;

use crate::state::AppState;

/// POST /webhooks/payment
///
/// Handles gateway payment events with signature verification. Every status
/// change flows through the lifecycle service, so an event can never force
/// an invalid transition.
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let start = Instant::now();

    let Some(sig_header) = headers.get("x-gateway-signature") else {
        tracing::warn!("Missing X-Gateway-Signature header");
        return StatusCode::BAD_REQUEST;
    };

    let Ok(signature) = sig_header.to_str() else {
        tracing::warn!("Invalid X-Gateway-Signature header encoding");
        return StatusCode::BAD_REQUEST;
    };

    let event = match state.webhook.verify_and_parse(&body, signature) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "Webhook verification failed");
            metrics::counter!("billing_webhooks_processed_total", "status" => "rejected")
                .increment(1);
            return StatusCode::BAD_REQUEST;
        }
    };

    let result = match (&event.event_type, event.payment.clone()) {
        (GatewayEventType::PaymentConfirmed | GatewayEventType::ReceiptVerified, Some(data)) => {
            confirm(&state, data).await
        }
        (GatewayEventType::PaymentFailed | GatewayEventType::ReceiptRejected, Some(data)) => {
            fail(&state, data).await
        }
        (GatewayEventType::Unknown(_), _) => Ok(()),
        (_, None) => Err(CoreError::WebhookError("missing payment data".to_string())),
    };

    match result {
        Ok(()) => {
            metrics::counter!("billing_webhooks_processed_total", "status" => "success")
                .increment(1);
            metrics::histogram!(
                "billing_operation_duration_seconds",
                "operation" => "process_webhook"
            )
            .record(start.elapsed().as_secs_f64());
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(event_id = %event.id, error = %e, "Webhook processing failed");
            metrics::counter!("billing_webhooks_processed_total", "status" => "error").increment(1);
            failure_status(&e)
        }
    }
}

fn failure_status(e: &CoreError) -> StatusCode {
    match e {
        CoreError::WebhookError(_) => StatusCode::BAD_REQUEST,
        CoreError::InvoiceNotFound | CoreError::SubscriptionNotFound => StatusCode::NOT_FOUND,
        CoreError::Conflict => StatusCode::CONFLICT,
        // A transition the graph forbids will never start succeeding; a
        // 4xx stops the gateway from retrying it forever.
        CoreError::InvalidTransition { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn confirm(state: &AppState, data: PaymentEventData) -> Result<(), CoreError> {
    let invoice_id = data.invoice_id;
    let outcome = state
        .lifecycle
        .confirm_payment(
            invoice_id,
            ConfirmPayment {
                amount_centavos: data.amount_centavos,
                method: data.method,
                reference: data.reference,
                paid_at: data.paid_at,
            },
        )
        .await?;

    if outcome.invoice_paid {
        // A paid invoice must not keep nagging; reminder cleanup failures
        // are logged, not surfaced to the gateway.
        if let Err(e) = state.scheduler.cancel_all(invoice_id).await {
            tracing::warn!(invoice_id = %invoice_id, error = %e, "failed to cancel reminders");
        }
    }

    Ok(())
}

async fn fail(state: &AppState, data: PaymentEventData) -> Result<(), CoreError> {
    let row = state
        .repos
        .invoices
        .find_by_id(data.invoice_id.0)
        .await?
        .ok_or(CoreError::InvoiceNotFound)?;

    state
        .lifecycle
        .record_payment_failure(SubscriptionId(row.subscription_id))
        .await?;

    Ok(())
}
