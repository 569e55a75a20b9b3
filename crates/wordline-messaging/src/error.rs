//! Error types for outbound platform calls.
//!
//! Reply failures are always scoped to one event: the dispatcher records
//! them in the report and moves on to the next event.

use thiserror::Error;

/// Result type alias for messaging operations.
pub type Result<T> = std::result::Result<T, MessagingError>;

/// Failures from the reply and storage clients.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagingError {
    /// Transport failed before any response arrived.
    #[error("platform unreachable: {message}")]
    NetworkError {
        /// Transport error text
        message: String,
    },

    /// No response within the client timeout.
    #[error("request timeout after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout in milliseconds
        timeout_ms: u64,
    },

    /// Platform rejected the request (4xx other than 429).
    ///
    /// Expired and already-used reply tokens land here with status 400.
    #[error("platform rejected request: HTTP {status_code}")]
    ClientError {
        /// Status code
        status_code: u16,
        /// Response body content, truncated
        body: String,
    },

    /// Platform failed to process the request (5xx).
    #[error("platform failure: HTTP {status_code}")]
    ServerError {
        /// Status code
        status_code: u16,
        /// Response body content, truncated
        body: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited {
        /// Seconds from the `Retry-After` header, when present
        retry_after_seconds: Option<u64>,
    },

    /// Client could not be constructed from its configuration.
    #[error("invalid client configuration: {message}")]
    ConfigurationError {
        /// What was wrong
        message: String,
    },
}

impl MessagingError {
    /// Transport failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError { message: message.into() }
    }

    /// Timeout after `timeout_ms`.
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::Timeout { timeout_ms }
    }

    /// 4xx response other than 429.
    pub fn client_error(status_code: u16, body: impl Into<String>) -> Self {
        Self::ClientError { status_code, body: body.into() }
    }

    /// 5xx response.
    pub fn server_error(status_code: u16, body: impl Into<String>) -> Self {
        Self::ServerError { status_code, body: body.into() }
    }

    /// 429 response.
    pub fn rate_limited(retry_after_seconds: Option<u64>) -> Self {
        Self::RateLimited { retry_after_seconds }
    }

    /// Invalid client setup.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError { message: message.into() }
    }

    /// Whether the failure is transient.
    ///
    /// Reply tokens are single-use so the dispatcher never retries, but the
    /// flag is logged to tell platform outages apart from rejected tokens.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkError { .. }
            | Self::Timeout { .. }
            | Self::ServerError { .. }
            | Self::RateLimited { .. } => true,
            Self::ClientError { .. } | Self::ConfigurationError { .. } => false,
        }
    }

    /// HTTP status returned by the platform, if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ClientError { status_code, .. } | Self::ServerError { status_code, .. } => {
                Some(*status_code)
            },
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}
