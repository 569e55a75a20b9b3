//! Wordline webhook responder.
//!
//! Main entry point for the Wordline server. Loads configuration, wires the
//! reply pipeline and serves until CTRL+C or SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};
use wordline_api::{
    start_server, AppState, Config, Dispatcher, HandlerRegistry, SignatureVerifier, WebhookGateway,
};
use wordline_core::RealClock;
use wordline_messaging::{LineReplyClient, StorageClient, SupabaseClient};

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Failed to read .env file: {e}");
        }
    }

    let config = Config::load()?;
    init_tracing(&config)?;

    info!("Starting Wordline webhook responder");
    info!(config = ?config, "Configuration loaded");

    let addr = config.parse_server_addr()?;
    let dispatcher = build_dispatcher(&config)?;
    let storage = build_storage(&config).await?;

    let state = AppState {
        gateway: Arc::new(WebhookGateway::new(dispatcher, config.app_env)),
        storage,
        clock: Arc::new(RealClock::new()),
        environment: config.app_env,
    };

    start_server(state, config.request_limits(), addr).await.context("Server failed")?;

    info!("Wordline shutdown complete");
    Ok(())
}

/// Initializes tracing from the configured filter. Production logs are JSON.
fn init_tracing(config: &Config) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_new(&config.rust_log).context("Invalid RUST_LOG filter")?;

    let registry = tracing_subscriber::registry().with(filter);

    if config.app_env.is_production() {
        registry.with(fmt::layer().json().with_current_span(true).with_target(true)).try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(true).with_file(true).with_line_number(true))
            .try_init()?;
    }

    Ok(())
}

/// Builds the dispatcher when both LINE credentials are present.
fn build_dispatcher(config: &Config) -> Result<Option<Arc<Dispatcher>>> {
    let Some((channel_secret, access_token)) = config.line_credentials() else {
        warn!(
            "LINE_CHANNEL_SECRET or LINE_CHANNEL_ACCESS_TOKEN not set; \
             webhook calls will be acknowledged without processing"
        );
        return Ok(None);
    };

    let verifier =
        SignatureVerifier::new(channel_secret).context("Failed to initialize signature verifier")?;
    let reply_client = LineReplyClient::new(access_token, config.reply_client_config())
        .context("Failed to initialize LINE reply client")?;
    let registry = HandlerRegistry::standard(Arc::new(reply_client));
    let deadline = config.request_limits().dispatch_deadline();

    info!(
        handlers = registry.len(),
        deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
        "Webhook dispatcher initialized"
    );
    let dispatcher = Dispatcher::new(verifier, Arc::new(registry)).with_deadline(deadline);
    Ok(Some(Arc::new(dispatcher)))
}

/// Builds the storage client and reports whether it answers.
async fn build_storage(config: &Config) -> Result<Option<Arc<dyn StorageClient>>> {
    let Some(storage_config) = config.storage_config() else {
        warn!("SUPABASE_URL or SUPABASE_ANON_KEY not set; storage checks disabled");
        return Ok(None);
    };

    let client = SupabaseClient::new(storage_config).context("Failed to initialize storage")?;
    if client.ping().await {
        info!(admin = client.has_admin_access(), "Storage connection established");
    } else {
        warn!("Storage did not answer; continuing without it");
    }

    Ok(Some(Arc::new(client)))
}
