//! Payment gateway webhook handling
//!
//! Verifies and parses payment-confirmation signals from the GCash gateway
//! and the manual receipt-verification queue. Every event that would change
//! subscription state is still routed through the transition validator by
//! `LifecycleService`; this module only establishes authenticity and shape.

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, error, info, warn};

use hakot_types::{InvoiceId, PaymentChannel};

use crate::error::CoreError;

/// Maximum age of a webhook timestamp, in seconds
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Webhook event types we handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEventType {
    /// Gateway confirmed an automatic payment
    PaymentConfirmed,
    /// Gateway reported a failed payment attempt
    PaymentFailed,
    /// Staff verified an uploaded receipt
    ReceiptVerified,
    /// Staff rejected an uploaded receipt
    ReceiptRejected,
    /// Unknown event type
    Unknown(String),
}

impl From<&str> for GatewayEventType {
    fn from(s: &str) -> Self {
        match s {
            "payment.confirmed" => Self::PaymentConfirmed,
            "payment.failed" => Self::PaymentFailed,
            "receipt.verified" => Self::ReceiptVerified,
            "receipt.rejected" => Self::ReceiptRejected,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Parsed webhook event
#[derive(Debug, Clone)]
pub struct GatewayEvent {
    /// Event ID
    pub id: String,
    /// Event type
    pub event_type: GatewayEventType,
    /// Payment data, absent for unknown events
    pub payment: Option<PaymentEventData>,
    /// When the event was created (Unix timestamp)
    pub created: i64,
}

/// Payment data carried by confirmation/failure events
#[derive(Debug, Clone)]
pub struct PaymentEventData {
    /// Invoice the payment applies to
    pub invoice_id: InvoiceId,
    /// Paid amount in centavos
    pub amount_centavos: i64,
    /// Channel the payment arrived through
    pub method: PaymentChannel,
    /// Gateway or receipt reference
    pub reference: String,
    /// When the payment was made
    pub paid_at: DateTime<Utc>,
}

/// Webhook handler for verifying and parsing gateway events
#[derive(Clone)]
pub struct WebhookHandler {
    webhook_secret: String,
}

impl WebhookHandler {
    /// Create a new webhook handler
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        Self {
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Verify and parse a webhook payload
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<GatewayEvent, CoreError> {
        self.verify_signature(payload, signature)?;

        let raw_event: RawGatewayEvent = serde_json::from_slice(payload)
            .map_err(|e| CoreError::WebhookError(e.to_string()))?;

        debug!(event_id = %raw_event.id, event_type = %raw_event.event_type, "parsed webhook event");

        let event_type = GatewayEventType::from(raw_event.event_type.as_str());
        let payment = match &event_type {
            GatewayEventType::Unknown(other) => {
                info!(event_type = %other, "ignoring unknown webhook event type");
                None
            }
            _ => Some(Self::parse_payment_data(raw_event.data.object)?),
        };

        Ok(GatewayEvent {
            id: raw_event.id,
            event_type,
            payment,
            created: raw_event.created,
        })
    }

    /// Verify the gateway signature header: `t=timestamp,v1=signature`
    fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<(), CoreError> {
        let mut timestamp: Option<&str> = None;
        let mut sig_v1: Option<&str> = None;

        for part in signature.split(',') {
            if let Some((key, value)) = part.split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => sig_v1 = Some(value),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            warn!("missing timestamp in webhook signature");
            CoreError::WebhookError("missing timestamp".to_string())
        })?;

        let sig_v1 = sig_v1.ok_or_else(|| {
            warn!("missing v1 signature in webhook signature");
            CoreError::WebhookError("missing signature".to_string())
        })?;

        let signed_payload = format!(
            "{}.{}",
            timestamp,
            std::str::from_utf8(payload)
                .map_err(|_| CoreError::WebhookError("invalid payload encoding".to_string()))?
        );

        let mut mac = Hmac::<Sha256>::new_from_slice(self.webhook_secret.as_bytes())
            .map_err(|_| CoreError::Internal("HMAC error".to_string()))?;
        mac.update(signed_payload.as_bytes());
        let expected = hex::encode(mac.finalize().into_bytes());

        if !constant_time_eq(sig_v1.as_bytes(), expected.as_bytes()) {
            error!("webhook signature verification failed");
            return Err(CoreError::WebhookError(
                "signature verification failed".to_string(),
            ));
        }

        let ts: i64 = timestamp
            .parse()
            .map_err(|_| CoreError::WebhookError("invalid timestamp format".to_string()))?;
        let now = Utc::now().timestamp();
        if (now - ts).abs() > TIMESTAMP_TOLERANCE_SECS {
            warn!(timestamp = ts, now = now, "webhook timestamp too old");
            return Err(CoreError::WebhookError("timestamp too old".to_string()));
        }

        Ok(())
    }

    fn parse_payment_data(object: serde_json::Value) -> Result<PaymentEventData, CoreError> {
        let raw: RawPaymentObject = serde_json::from_value(object)
            .map_err(|e| CoreError::WebhookError(e.to_string()))?;

        let invoice_id = InvoiceId::parse(&raw.invoice_id)
            .map_err(|_| CoreError::WebhookError("invalid invoice_id".to_string()))?;

        let method: PaymentChannel = raw
            .method
            .parse()
            .map_err(|_| CoreError::WebhookError(format!("invalid method: {}", raw.method)))?;

        let paid_at = Utc
            .timestamp_opt(raw.paid_at, 0)
            .single()
            .ok_or_else(|| CoreError::WebhookError("invalid paid_at timestamp".to_string()))?;

        Ok(PaymentEventData {
            invoice_id,
            amount_centavos: raw.amount_centavos,
            method,
            reference: raw.reference,
            paid_at,
        })
    }
}

/// Constant-time comparison
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

// Raw gateway event for parsing
#[derive(Debug, Deserialize)]
struct RawGatewayEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
    created: i64,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RawPaymentObject {
    invoice_id: String,
    amount_centavos: i64,
    method: String,
    reference: String,
    paid_at: i64,
}
