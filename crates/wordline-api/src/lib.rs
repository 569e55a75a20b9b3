//! Wordline HTTP API.
//!
//! Receives platform webhooks, verifies their signatures, dispatches each
//! event to its handler and answers with a single keyword-based reply.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod crypto;
pub mod dispatch;
pub mod handlers;
pub mod server;

pub use config::{Config, Environment};
pub use crypto::{InboundRequest, SignatureVerifier, VerificationError, VerifiedPayload};
pub use dispatch::{DispatchReport, Dispatcher, EventHandler, HandlerRegistry, Outcome};
pub use handlers::WebhookGateway;
pub use server::{create_router, start_server, AppState, RequestLimits};
