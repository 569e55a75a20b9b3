//! Service info and health probes.
//!
//! `/health` always answers 200 and reports `degraded` when a component is
//! down or unconfigured. `/ready` answers 503 until the webhook dispatcher is
//! configured and, when storage is configured, storage answers its ping.
//! `/live` does not touch any dependency.

use std::sync::Arc;

use axum::{
    extract::{OriginalUri, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, instrument, warn};
use wordline_core::Clock;
use wordline_messaging::StorageClient;

use crate::{config::Environment, server::AppState};

const SERVICE_NAME: &str = "wordline";
const SERVICE_DESCRIPTION: &str = "LINE Bot English Learning API";

/// Health check response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service health status
    pub status: HealthStatus,
    /// Timestamp when health check was performed
    pub timestamp: DateTime<Utc>,
    /// Deployment mode
    pub environment: Environment,
    /// Service version
    pub version: &'static str,
    /// Individual component health checks
    pub checks: HealthChecks,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// All components up
    Healthy,
    /// At least one component down or unconfigured
    Degraded,
}

/// Individual component health check results.
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    /// Backing store connectivity
    pub storage: ComponentHealth,
    /// Webhook verification and reply pipeline
    pub messaging: ComponentHealth,
}

/// Health status for individual components.
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    /// Component status
    pub status: ComponentStatus,
    /// Detail when the component is not up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Time spent checking the component in milliseconds
    pub response_time_ms: u64,
}

impl ComponentHealth {
    fn up(response_time_ms: u64) -> Self {
        Self { status: ComponentStatus::Up, message: None, response_time_ms }
    }

    fn with_message(status: ComponentStatus, message: &str, response_time_ms: u64) -> Self {
        Self { status, message: Some(message.to_string()), response_time_ms }
    }
}

/// Component-level health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    /// Component is working
    Up,
    /// Component is configured but failing
    Down,
    /// Component has no configuration
    NotConfigured,
}

/// Health service with injected clock and dependencies.
pub struct HealthService {
    clock: Arc<dyn Clock>,
    storage: Option<Arc<dyn StorageClient>>,
    messaging_configured: bool,
    environment: Environment,
}

impl HealthService {
    /// Creates a health service.
    pub fn new(
        clock: Arc<dyn Clock>,
        storage: Option<Arc<dyn StorageClient>>,
        messaging_configured: bool,
        environment: Environment,
    ) -> Self {
        Self { clock, storage, messaging_configured, environment }
    }

    fn from_state(state: &AppState) -> Self {
        Self::new(
            Arc::clone(&state.clock),
            state.storage.clone(),
            state.gateway.is_ready(),
            state.environment,
        )
    }

    /// Checks every component.
    pub async fn health_check(&self) -> HealthResponse {
        debug!("Performing health check");

        let timestamp = DateTime::<Utc>::from(self.clock.now_system());
        let storage = self.check_storage().await;
        let messaging = self.check_messaging();

        let status = if storage.status == ComponentStatus::Down
            || messaging.status != ComponentStatus::Up
        {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        HealthResponse {
            status,
            timestamp,
            environment: self.environment,
            version: env!("CARGO_PKG_VERSION"),
            checks: HealthChecks { storage, messaging },
        }
    }

    async fn check_storage(&self) -> ComponentHealth {
        let Some(storage) = &self.storage else {
            return ComponentHealth::with_message(
                ComponentStatus::NotConfigured,
                "storage credentials not set",
                0,
            );
        };

        let start = self.clock.now();
        let reachable = storage.ping().await;
        let elapsed = self.clock.now().saturating_duration_since(start);
        let response_time_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        if reachable {
            ComponentHealth::up(response_time_ms)
        } else {
            warn!(storage = storage.name(), "Storage health check failed");
            ComponentHealth::with_message(
                ComponentStatus::Down,
                "storage did not answer",
                response_time_ms,
            )
        }
    }

    fn check_messaging(&self) -> ComponentHealth {
        if self.messaging_configured {
            ComponentHealth::up(0)
        } else {
            ComponentHealth::with_message(
                ComponentStatus::NotConfigured,
                "LINE channel credentials not set",
                0,
            )
        }
    }
}

/// Whether the service can take webhook traffic given a health report.
pub fn is_ready(response: &HealthResponse) -> bool {
    response.checks.messaging.status == ComponentStatus::Up
        && response.checks.storage.status != ComponentStatus::Down
}

/// `GET /`.
#[instrument(name = "index", skip(app_state))]
pub async fn index(State(app_state): State<AppState>) -> Response {
    let response = json!({
        "message": SERVICE_DESCRIPTION,
        "status": "running",
        "timestamp": DateTime::<Utc>::from(app_state.clock.now_system()),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": app_state.environment,
    });

    (StatusCode::OK, Json(response)).into_response()
}

/// `GET /health`.
#[instrument(name = "health_check", skip(app_state))]
pub async fn health_check(State(app_state): State<AppState>) -> Response {
    let response = HealthService::from_state(&app_state).health_check().await;

    debug!(
        status = ?response.status,
        storage_status = ?response.checks.storage.status,
        messaging_status = ?response.checks.messaging.status,
        "Health check completed"
    );

    (StatusCode::OK, Json(response)).into_response()
}

/// `GET /ready`.
#[instrument(name = "readiness_check", skip(app_state))]
pub async fn readiness_check(State(app_state): State<AppState>) -> Response {
    let response = HealthService::from_state(&app_state).health_check().await;

    let status_code =
        if is_ready(&response) { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (status_code, Json(response)).into_response()
}

/// `GET /live`.
#[instrument(name = "liveness_check", skip(app_state))]
pub async fn liveness_check(State(app_state): State<AppState>) -> Response {
    debug!("Performing liveness check");

    let response = json!({
        "status": "alive",
        "timestamp": DateTime::<Utc>::from(app_state.clock.now_system()),
        "service": SERVICE_NAME,
    });

    (StatusCode::OK, Json(response)).into_response()
}

/// Fallback for unknown routes.
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> Response {
    let response = json!({
        "error": "Route not found",
        "path": uri.path(),
        "method": method.as_str(),
    });

    (StatusCode::NOT_FOUND, Json(response)).into_response()
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use wordline_core::TestClock;
    use wordline_testing::FakeStorage;

    use super::*;

    fn service(storage: Option<Arc<dyn StorageClient>>, messaging: bool) -> HealthService {
        let clock = TestClock::with_start_time(UNIX_EPOCH + Duration::from_secs(1_700_000_000));
        HealthService::new(Arc::new(clock), storage, messaging, Environment::Development)
    }

    #[tokio::test]
    async fn healthy_when_everything_up() {
        let response = service(Some(Arc::new(FakeStorage::new(true))), true).health_check().await;

        assert_eq!(response.status, HealthStatus::Healthy);
        assert!(is_ready(&response));
        assert_eq!(response.timestamp.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn storage_down_degrades_and_blocks_readiness() {
        let storage = Arc::new(FakeStorage::new(false));
        let response = service(Some(storage.clone()), true).health_check().await;

        assert_eq!(response.status, HealthStatus::Degraded);
        assert_eq!(response.checks.storage.status, ComponentStatus::Down);
        assert!(!is_ready(&response));
        assert_eq!(storage.ping_count(), 1);
    }

    #[tokio::test]
    async fn unconfigured_storage_does_not_block_readiness() {
        let response = service(None, true).health_check().await;

        assert_eq!(response.status, HealthStatus::Degraded);
        assert_eq!(response.checks.storage.status, ComponentStatus::NotConfigured);
        assert!(is_ready(&response));
    }

    #[tokio::test]
    async fn missing_line_credentials_block_readiness() {
        let response = service(Some(Arc::new(FakeStorage::new(true))), false).health_check().await;

        assert_eq!(response.checks.messaging.status, ComponentStatus::NotConfigured);
        assert!(!is_ready(&response));
    }

    #[test]
    fn component_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(ComponentStatus::NotConfigured).unwrap(),
            json!("not_configured")
        );
    }
}
