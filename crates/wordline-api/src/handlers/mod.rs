//! HTTP request handlers.
//!
//! - `webhook` - platform callback endpoint and its gateway
//! - `health` - service info, health, readiness and liveness probes
//!
//! Error bodies are JSON with a taxonomy code (E1001-E9999). Server-error
//! detail is replaced by a generic message in production.

pub mod health;
pub mod webhook;

pub use health::{health_check, index, liveness_check, not_found, readiness_check, HealthService};
pub use webhook::{handle_webhook, WebhookGateway, WebhookResponse};
