//! Webhook gateway: the HTTP face of the dispatcher.
//!
//! Maps request-level outcomes to status codes:
//!
//! | Outcome | Status | Body |
//! |---|---|---|
//! | signature or body missing | 400 | `{"error","code"}` |
//! | dispatcher not configured | 200 | `{"status":"handler not initialized"}` |
//! | signature rejected | 400 | `{"error","code"}` |
//! | payload not an envelope | 500 | `{"error","code"}` |
//! | events dispatched | 200 | `{"status":"success"}` |
//!
//! Per-event failures never change the status. The platform treats non-2xx
//! answers as delivery failures and would resend the whole batch.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use wordline_core::WordlineError;

use crate::{
    config::Environment,
    crypto::{InboundRequest, SIGNATURE_HEADER},
    dispatch::Dispatcher,
    server::AppState,
};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Acknowledgement body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AckResponse {
    /// `success` or `handler not initialized`.
    pub status: &'static str,
}

/// Error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// Human-readable description, generic for server errors in production.
    pub error: String,
    /// Error code from the taxonomy.
    pub code: &'static str,
}

/// Body of a webhook response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WebhookBody {
    /// Request accepted.
    Ack(AckResponse),
    /// Request rejected.
    Error(ErrorResponse),
}

/// Status and body produced by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// JSON body.
    pub body: WebhookBody,
}

impl WebhookResponse {
    fn ack(status: &'static str) -> Self {
        Self { status: StatusCode::OK, body: WebhookBody::Ack(AckResponse { status }) }
    }
}

impl IntoResponse for WebhookResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Status code for a request-level error.
pub fn status_for(err: &WordlineError) -> StatusCode {
    match err {
        WordlineError::MalformedRequest { .. } | WordlineError::InvalidSignature => {
            StatusCode::BAD_REQUEST
        },
        WordlineError::UninitializedDependency { .. } => StatusCode::OK,
        WordlineError::MalformedPayload { .. }
        | WordlineError::UnknownEventKind { .. }
        | WordlineError::HandlerFailure { .. }
        | WordlineError::MalformedEvent { .. }
        | WordlineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Webhook entry point shared by all requests.
#[derive(Debug)]
pub struct WebhookGateway {
    dispatcher: Option<Arc<Dispatcher>>,
    environment: Environment,
}

impl WebhookGateway {
    /// Creates a gateway. Without a dispatcher every well-formed request is
    /// acknowledged with `handler not initialized`.
    pub fn new(dispatcher: Option<Arc<Dispatcher>>, environment: Environment) -> Self {
        Self { dispatcher, environment }
    }

    /// Whether a dispatcher is configured.
    pub fn is_ready(&self) -> bool {
        self.dispatcher.is_some()
    }

    /// Handles one webhook call.
    pub async fn handle(&self, signature: Option<&str>, body: Bytes) -> WebhookResponse {
        let request = match InboundRequest::new(signature, body) {
            Ok(request) => request,
            Err(e) => {
                warn!(reason = %e, "Rejecting incomplete webhook request");
                return self.error_response(&WordlineError::from(e));
            },
        };

        let Some(dispatcher) = &self.dispatcher else {
            warn!("Webhook received but dispatcher is not initialized");
            return self
                .error_response(&WordlineError::UninitializedDependency { name: "dispatcher" });
        };

        match dispatcher.dispatch(request).await {
            Ok(report) => {
                info!(
                    events = report.len(),
                    replied = report.replied(),
                    skipped = report.skipped(),
                    failed = report.failed(),
                    "Webhook processed"
                );
                WebhookResponse::ack("success")
            },
            Err(e) => self.error_response(&e),
        }
    }

    fn error_response(&self, err: &WordlineError) -> WebhookResponse {
        let status = status_for(err);

        if let WordlineError::UninitializedDependency { .. } = err {
            return WebhookResponse::ack("handler not initialized");
        }

        let message = if status.is_server_error() {
            error!(error_code = err.code(), error = %err, "Webhook processing failed");
            if self.environment.is_production() {
                INTERNAL_ERROR_MESSAGE.to_string()
            } else {
                err.to_string()
            }
        } else {
            err.to_string()
        };

        WebhookResponse {
            status,
            body: WebhookBody::Error(ErrorResponse { error: message, code: err.code() }),
        }
    }
}

/// `POST /webhook`.
#[instrument(
    name = "handle_webhook",
    skip(state, headers, body),
    fields(
        body_len = body.len(),
        has_signature = headers.contains_key(SIGNATURE_HEADER),
    )
)]
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> WebhookResponse {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok());
    state.gateway.handle(signature, body).await
}

#[cfg(test)]
mod tests {
    use wordline_testing::{RecordingReplyClient, WebhookBuilder};

    use super::*;
    use crate::{crypto::SignatureVerifier, dispatch::HandlerRegistry};

    const SECRET: &str = "gateway-secret";

    fn gateway(environment: Environment) -> WebhookGateway {
        let registry = HandlerRegistry::standard(Arc::new(RecordingReplyClient::new()));
        let dispatcher =
            Dispatcher::new(SignatureVerifier::new(SECRET).unwrap(), Arc::new(registry));
        WebhookGateway::new(Some(Arc::new(dispatcher)), environment)
    }

    fn sign(body: &[u8]) -> String {
        wordline_testing::sign(SECRET, body)
    }

    #[tokio::test]
    async fn missing_signature_checked_before_dispatcher() {
        let gateway = WebhookGateway::new(None, Environment::Development);

        let response = gateway.handle(None, Bytes::from_static(b"{}")).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unconfigured_gateway_acknowledges() {
        let gateway = WebhookGateway::new(None, Environment::Development);

        let response = gateway.handle(Some("sig"), Bytes::from_static(b"{}")).await;

        assert_eq!(response, WebhookResponse::ack("handler not initialized"));
        assert!(!gateway.is_ready());
    }

    #[tokio::test]
    async fn malformed_payload_detail_hidden_in_production() {
        let body = Bytes::from_static(b"[1, 2, 3]");
        let signature = sign(&body);

        let dev = gateway(Environment::Development).handle(Some(&signature), body.clone()).await;
        let prod = gateway(Environment::Production).handle(Some(&signature), body).await;

        assert_eq!(dev.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(prod.status, StatusCode::INTERNAL_SERVER_ERROR);

        let WebhookBody::Error(dev_body) = dev.body else { panic!("expected error body") };
        let WebhookBody::Error(prod_body) = prod.body else { panic!("expected error body") };
        assert!(dev_body.error.contains("Malformed payload"));
        assert_eq!(prod_body.error, INTERNAL_ERROR_MESSAGE);
        assert_eq!(prod_body.code, "E1003");
    }

    #[tokio::test]
    async fn invalid_signature_is_bad_request_in_any_mode() {
        let body = WebhookBuilder::new().build();

        let response = gateway(Environment::Production).handle(Some("AAAA"), body).await;

        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            response.body,
            WebhookBody::Error(ErrorResponse {
                error: "[E1002] Invalid signature".to_string(),
                code: "E1002",
            })
        );
    }

    #[test]
    fn status_mapping() {
        assert_eq!(status_for(&WordlineError::InvalidSignature), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&WordlineError::malformed_request("missing body")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&WordlineError::MalformedPayload { reason: String::new() }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&WordlineError::UninitializedDependency { name: "dispatcher" }),
            StatusCode::OK
        );
    }
}
