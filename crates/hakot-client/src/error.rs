//! Client errors
//!
//! Error taxonomy for billing source operations, with mapping from HTTP
//! status codes and transport failures.

use thiserror::Error;

/// Client errors for billing source operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Failed to reach the billing source at all.
    #[error("connection error: {message}")]
    Connection {
        /// Error message
        message: String,
        /// Whether the error is retryable
        retryable: bool,
    },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// A single request was rejected as unauthorized.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The session with the billing source has expired.
    ///
    /// Raised only after the configured number of consecutive 401s; a lone
    /// 401 stays [`ClientError::Unauthorized`].
    #[error("session expired after {consecutive_unauthorized} consecutive unauthorized responses")]
    SessionExpired {
        /// How many 401s in a row preceded this
        consecutive_unauthorized: u32,
    },

    /// Resource not found upstream.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limited by the billing source.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Upstream returned a server error.
    #[error("upstream error (HTTP {status}): {message}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Response body or status text
        message: String,
    },

    /// Response body was not the JSON we expected.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl ClientError {
    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection { retryable, .. } => *retryable,
            Self::Timeout => true,
            Self::RateLimited(_) => true,
            Self::Upstream { status, .. } => *status >= 500,
            Self::Unauthorized(_) => false,
            Self::SessionExpired { .. } => false,
            Self::NotFound(_) => false,
            Self::InvalidResponse(_) => false,
            Self::Config(_) => false,
        }
    }

    /// Map an HTTP error status to a client error.
    pub(crate) fn from_status(status: u16, message: String) -> Self {
        match status {
            401 => Self::Unauthorized(message),
            404 => Self::NotFound(message),
            429 => Self::RateLimited(message),
            _ => Self::Upstream { status, message },
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection {
                message: err.to_string(),
                retryable: true,
            }
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Connection {
                message: err.to_string(),
                retryable: false,
            }
        }
    }
}
