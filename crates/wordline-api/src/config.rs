//! Configuration management for the Wordline webhook responder.

use std::{fmt, net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use wordline_messaging::{ClientConfig, StorageConfig, DEFAULT_LINE_API_BASE_URL};

use crate::server::RequestLimits;

const CONFIG_FILE: &str = "config.toml";

/// Deployment mode.
///
/// Production switches logs to JSON and hides internal error detail from
/// HTTP responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development.
    #[default]
    Development,
    /// Deployed service.
    Production,
}

impl Environment {
    /// Name as reported by the index and health endpoints.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// Whether this is a production deployment.
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete service configuration with defaults, file, and environment
/// overrides.
///
/// Configuration is loaded in priority order:
/// 1. Environment variables (highest priority)
/// 2. Configuration file (`config.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// Without LINE credentials the server still starts; the webhook endpoint
/// then acknowledges requests with `handler not initialized`.
///
/// # Example
///
/// ```no_run
/// use wordline_api::Config;
///
/// let config = Config::load().expect("Failed to load configuration");
///
/// println!("Server will bind to {}:{}", config.host, config.port);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Deployment mode, `development` or `production`.
    ///
    /// Environment variable: `APP_ENV`
    #[serde(default, alias = "APP_ENV")]
    pub app_env: Environment,

    // Server
    /// Server bind address.
    ///
    /// Environment variable: `HOST`
    #[serde(default = "default_host", alias = "HOST")]
    pub host: String,
    /// Server bind port.
    ///
    /// Environment variable: `PORT`
    #[serde(default = "default_port", alias = "PORT")]
    pub port: u16,
    /// Whole-request timeout in seconds.
    ///
    /// Environment variable: `REQUEST_TIMEOUT`
    #[serde(default = "default_request_timeout", alias = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,
    /// Largest accepted request body in bytes.
    ///
    /// Environment variable: `MAX_BODY_BYTES`
    #[serde(default = "default_max_body_bytes", alias = "MAX_BODY_BYTES")]
    pub max_body_bytes: usize,

    // LINE
    /// Channel secret used to verify `X-Line-Signature`.
    ///
    /// Environment variable: `LINE_CHANNEL_SECRET`
    #[serde(default, alias = "LINE_CHANNEL_SECRET", skip_serializing_if = "Option::is_none")]
    pub line_channel_secret: Option<String>,
    /// Channel access token for the reply API.
    ///
    /// Environment variable: `LINE_CHANNEL_ACCESS_TOKEN`
    #[serde(default, alias = "LINE_CHANNEL_ACCESS_TOKEN", skip_serializing_if = "Option::is_none")]
    pub line_channel_access_token: Option<String>,
    /// Messaging API origin.
    ///
    /// Environment variable: `LINE_API_BASE_URL`
    #[serde(default = "default_line_api_base_url", alias = "LINE_API_BASE_URL")]
    pub line_api_base_url: String,
    /// Timeout for one reply call in seconds.
    ///
    /// Environment variable: `REPLY_TIMEOUT_SECONDS`
    #[serde(default = "default_reply_timeout", alias = "REPLY_TIMEOUT_SECONDS")]
    pub reply_timeout_seconds: u64,

    // Storage
    /// Supabase project URL.
    ///
    /// Environment variable: `SUPABASE_URL`
    #[serde(default, alias = "SUPABASE_URL", skip_serializing_if = "Option::is_none")]
    pub supabase_url: Option<String>,
    /// Supabase anon key.
    ///
    /// Environment variable: `SUPABASE_ANON_KEY`
    #[serde(default, alias = "SUPABASE_ANON_KEY", skip_serializing_if = "Option::is_none")]
    pub supabase_anon_key: Option<String>,
    /// Supabase service-role key.
    ///
    /// Environment variable: `SUPABASE_SERVICE_KEY`
    #[serde(default, alias = "SUPABASE_SERVICE_KEY", skip_serializing_if = "Option::is_none")]
    pub supabase_service_key: Option<String>,
    /// Timeout for storage calls in seconds.
    ///
    /// Environment variable: `STORAGE_TIMEOUT_SECONDS`
    #[serde(default = "default_storage_timeout", alias = "STORAGE_TIMEOUT_SECONDS")]
    pub storage_timeout_seconds: u64,

    // Logging
    /// Log filter directives.
    ///
    /// Environment variable: `RUST_LOG`
    #[serde(default = "default_log_level", alias = "RUST_LOG")]
    pub rust_log: String,
}

impl Config {
    /// Load configuration from defaults, config file, and environment variable
    /// overrides.
    ///
    /// # Errors
    ///
    /// Fails when a source cannot be parsed or the merged values are invalid.
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(""));

        let config: Self = figment.extract().context("Failed to load configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Parse server socket address from host and port configuration.
    pub fn parse_server_addr(&self) -> Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.host, self.port);
        SocketAddr::from_str(&addr_str).context("Invalid server address")
    }

    /// Channel secret and access token, when both are set.
    pub fn line_credentials(&self) -> Option<(&str, &str)> {
        let secret = non_empty(self.line_channel_secret.as_deref())?;
        let token = non_empty(self.line_channel_access_token.as_deref())?;
        Some((secret, token))
    }

    /// Convert to reply client configuration.
    pub fn reply_client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.line_api_base_url.clone(),
            timeout: Duration::from_secs(self.reply_timeout_seconds),
            ..ClientConfig::default()
        }
    }

    /// Convert to storage configuration, when URL and anon key are set.
    pub fn storage_config(&self) -> Option<StorageConfig> {
        let url = non_empty(self.supabase_url.as_deref())?;
        let anon_key = non_empty(self.supabase_anon_key.as_deref())?;

        Some(StorageConfig {
            url: url.to_string(),
            anon_key: anon_key.to_string(),
            service_key: non_empty(self.supabase_service_key.as_deref()).map(str::to_string),
            timeout: Duration::from_secs(self.storage_timeout_seconds),
        })
    }

    /// Convert to HTTP layer limits.
    pub fn request_limits(&self) -> RequestLimits {
        RequestLimits {
            timeout: Duration::from_secs(self.request_timeout),
            max_body_bytes: self.max_body_bytes,
        }
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be greater than 0");
        }

        if self.request_timeout == 0 {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        if self.reply_timeout_seconds == 0 {
            anyhow::bail!("reply_timeout_seconds must be greater than 0");
        }

        if self.storage_timeout_seconds == 0 {
            anyhow::bail!("storage_timeout_seconds must be greater than 0");
        }

        if self.reply_timeout_seconds >= self.request_timeout {
            anyhow::bail!("reply_timeout_seconds must be less than request_timeout");
        }

        if self.max_body_bytes == 0 {
            anyhow::bail!("max_body_bytes must be greater than 0");
        }

        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_env", &self.app_env)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("request_timeout", &self.request_timeout)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("line_channel_secret", &mask(self.line_channel_secret.as_deref()))
            .field("line_channel_access_token", &mask(self.line_channel_access_token.as_deref()))
            .field("line_api_base_url", &self.line_api_base_url)
            .field("reply_timeout_seconds", &self.reply_timeout_seconds)
            .field("supabase_url", &self.supabase_url)
            .field("supabase_anon_key", &mask(self.supabase_anon_key.as_deref()))
            .field("supabase_service_key", &mask(self.supabase_service_key.as_deref()))
            .field("storage_timeout_seconds", &self.storage_timeout_seconds)
            .field("rust_log", &self.rust_log)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_env: Environment::default(),
            host: default_host(),
            port: default_port(),
            request_timeout: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
            line_channel_secret: None,
            line_channel_access_token: None,
            line_api_base_url: default_line_api_base_url(),
            reply_timeout_seconds: default_reply_timeout(),
            supabase_url: None,
            supabase_anon_key: None,
            supabase_service_key: None,
            storage_timeout_seconds: default_storage_timeout(),
            rust_log: default_log_level(),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn mask(value: Option<&str>) -> &'static str {
    match non_empty(value) {
        Some(_) => "[set]",
        None => "[unset]",
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u64 {
    10
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_line_api_base_url() -> String {
    DEFAULT_LINE_API_BASE_URL.to_string()
}

fn default_reply_timeout() -> u64 {
    5
}

fn default_storage_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info,wordline=debug,tower_http=debug".to_string()
}
