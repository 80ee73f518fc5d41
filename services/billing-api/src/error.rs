//! Error types for the Billing API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use hakot_client::ClientError;
use hakot_core::CoreError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Subscription not found")]
    SubscriptionNotFound,

    #[error("Invoice not found")]
    InvoiceNotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Concurrent update conflict")]
    Conflict,

    #[error("Webhook error: {0}")]
    WebhookError(String),

    #[error("Billing source session expired")]
    SessionExpired,

    #[error("Billing source unavailable")]
    SourceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error")]
    Database(#[from] hakot_db::DbError),

    #[error("Reminder error: {0}")]
    Reminder(hakot_reminders::ReminderError),
}

impl From<hakot_reminders::ReminderError> for ApiError {
    fn from(err: hakot_reminders::ReminderError) -> Self {
        match err {
            hakot_reminders::ReminderError::InvalidSnooze(msg) => Self::BadRequest(msg),
            other => Self::Reminder(other),
        }
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::SubscriptionNotFound | Self::InvoiceNotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::WebhookError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict => StatusCode::CONFLICT,
            Self::SessionExpired | Self::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) | Self::Database(_) | Self::Reminder(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
            Self::InvoiceNotFound => "INVOICE_NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::InvalidTransition(_) => "INVALID_TRANSITION",
            Self::Conflict => "CONFLICT",
            Self::WebhookError(_) => "WEBHOOK_ERROR",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::SourceUnavailable(_) => "SOURCE_UNAVAILABLE",
            Self::Internal(_) | Self::Database(_) | Self::Reminder(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::SubscriptionNotFound => Self::SubscriptionNotFound,
            CoreError::InvoiceNotFound => Self::InvoiceNotFound,
            CoreError::InvalidTransition { .. } => Self::InvalidTransition(err.to_string()),
            CoreError::Conflict => Self::Conflict,
            CoreError::WebhookError(msg) => Self::WebhookError(msg),
            CoreError::Database(e) => Self::Database(e),
            CoreError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::SessionExpired { .. } => Self::SessionExpired,
            ClientError::NotFound(_) => Self::SubscriptionNotFound,
            other => Self::SourceUnavailable(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log internal errors
        if matches!(
            self,
            Self::Internal(_) | Self::Database(_) | Self::Reminder(_)
        ) {
            tracing::error!(error = ?self, "Internal API error");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
