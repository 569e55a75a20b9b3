//! Error taxonomy for webhook ingestion and event dispatch.
//!
//! Errors are split by blast radius. Request-level errors (E1xxx, E3xxx,
//! E9999) decide the HTTP status of the whole webhook call. Event-level
//! errors (E2xxx) affect a single event in a batch and are only logged and
//! recorded in the dispatch report.

use thiserror::Error;

use crate::events::{EventKind, EventParseError};

/// Result type alias using `WordlineError`.
pub type Result<T> = std::result::Result<T, WordlineError>;

/// Wordline error types with stable codes.
#[derive(Debug, Error)]
pub enum WordlineError {
    // Request Errors (E1001-E1003)
    /// Signature header or body missing (E1001).
    #[error("[E1001] Malformed request: {reason}")]
    MalformedRequest {
        /// What was missing from the request
        reason: String,
    },

    /// HMAC signature validation failed (E1002).
    #[error("[E1002] Invalid signature")]
    InvalidSignature,

    /// Verified body is not a webhook envelope (E1003).
    #[error("[E1003] Malformed payload: {reason}")]
    MalformedPayload {
        /// Decoder message
        reason: String,
    },

    // Event Errors (E2001-E2003)
    /// Event kind has no handler (E2001).
    #[error("[E2001] Unknown event kind: {tag}")]
    UnknownEventKind {
        /// Event discriminant as received
        tag: String,
    },

    /// Handler failed while processing one event (E2002).
    #[error("[E2002] Handler failure for {kind} event: {reason}")]
    HandlerFailure {
        /// Kind of the event being handled
        kind: EventKind,
        /// Failure description
        reason: String,
    },

    /// A known event kind with missing or mistyped fields (E2003).
    #[error("[E2003] Malformed {tag} event: {reason}")]
    MalformedEvent {
        /// Event discriminant as received
        tag: String,
        /// Decoder message
        reason: String,
    },

    // System Errors (E3001)
    /// A process-wide dependency was not configured (E3001).
    #[error("[E3001] Dependency not initialized: {name}")]
    UninitializedDependency {
        /// Name of the missing dependency
        name: &'static str,
    },

    /// Generic error for wrapping other errors.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl WordlineError {
    /// Returns the error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MalformedRequest { .. } => "E1001",
            Self::InvalidSignature => "E1002",
            Self::MalformedPayload { .. } => "E1003",
            Self::UnknownEventKind { .. } => "E2001",
            Self::HandlerFailure { .. } => "E2002",
            Self::MalformedEvent { .. } => "E2003",
            Self::UninitializedDependency { .. } => "E3001",
            Self::Internal(_) => "E9999",
        }
    }

    /// Returns whether the error is scoped to a single event in a batch.
    pub const fn is_event_level(&self) -> bool {
        matches!(
            self,
            Self::UnknownEventKind { .. } | Self::HandlerFailure { .. } | Self::MalformedEvent { .. }
        )
    }

    /// Creates a malformed-request error.
    pub fn malformed_request(reason: impl Into<String>) -> Self {
        Self::MalformedRequest { reason: reason.into() }
    }

    /// Creates a handler-failure error.
    pub fn handler_failure(kind: EventKind, reason: impl Into<String>) -> Self {
        Self::HandlerFailure { kind, reason: reason.into() }
    }
}

impl From<EventParseError> for WordlineError {
    fn from(err: EventParseError) -> Self {
        match err {
            EventParseError::UnknownKind { tag } => Self::UnknownEventKind { tag },
            EventParseError::Malformed { tag, reason } => Self::MalformedEvent { tag, reason },
        }
    }
}
