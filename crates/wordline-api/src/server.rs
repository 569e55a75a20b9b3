//! HTTP server configuration and request routing.
//!
//! Requests flow through middleware in order:
//! 1. Request ID generation
//! 2. Request/response tracing
//! 3. CORS (permissive)
//! 4. Timeout enforcement
//! 5. Body size limit (webhook route only)
//! 6. Handler execution
//!
//! # Graceful Shutdown
//!
//! On CTRL+C or SIGTERM the server stops accepting connections and waits for
//! in-flight requests to finish.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use uuid::Uuid;
use wordline_core::Clock;
use wordline_messaging::StorageClient;

use crate::{config::Environment, handlers, handlers::WebhookGateway};

/// Header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Shared application state.
///
/// Every field is built once at startup and never reassigned.
#[derive(Clone)]
pub struct AppState {
    /// Webhook entry point.
    pub gateway: Arc<WebhookGateway>,
    /// Storage client, when configured.
    pub storage: Option<Arc<dyn StorageClient>>,
    /// Time source for timestamps and latency.
    pub clock: Arc<dyn Clock>,
    /// Deployment mode.
    pub environment: Environment,
}

/// Bounds applied by the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Largest accepted webhook body.
    pub max_body_bytes: usize,
}

impl RequestLimits {
    /// Time allowed for the handlers of one webhook batch.
    ///
    /// Four fifths of the request timeout, leaving room to write the
    /// acknowledgement before the timeout layer answers 408.
    pub fn dispatch_deadline(&self) -> Duration {
        self.timeout * 4 / 5
    }
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self { timeout: Duration::from_secs(10), max_body_bytes: 1024 * 1024 }
    }
}

/// Creates the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use wordline_api::{
///     config::Environment, create_router, server::RequestLimits, AppState, WebhookGateway,
/// };
/// use wordline_core::RealClock;
///
/// let state = AppState {
///     gateway: Arc::new(WebhookGateway::new(None, Environment::Development)),
///     storage: None,
///     clock: Arc::new(RealClock::new()),
///     environment: Environment::Development,
/// };
/// let app = create_router(state, RequestLimits::default());
/// ```
pub fn create_router(state: AppState, limits: RequestLimits) -> Router {
    let probe_routes = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/live", get(handlers::liveness_check));

    let webhook_routes = Router::new()
        .route("/webhook", post(handlers::handle_webhook))
        .layer(DefaultBodyLimit::max(limits.max_body_bytes));

    Router::new()
        .merge(probe_routes)
        .merge(webhook_routes)
        .fallback(handlers::not_found)
        .layer(TimeoutLayer::new(limits.timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

/// Middleware to inject request ID into all responses.
async fn inject_request_id(mut req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    response
}

/// Starts the HTTP server with graceful shutdown support.
///
/// # Errors
///
/// Returns `std::io::Error` if the address cannot be bound or the server
/// fails while running.
pub async fn start_server(
    state: AppState,
    limits: RequestLimits,
    addr: SocketAddr,
) -> Result<(), std::io::Error> {
    let app = create_router(state, limits);

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("HTTP server listening on {}", actual_addr);
    info!("Webhook URL: http://{}/webhook", actual_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}

/// Waits for shutdown signal (CTRL+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }

    warn!("Waiting for in-flight requests to complete");
}
