//! Storage connectivity client.
//!
//! The responder does not persist anything yet. The storage client is built
//! at startup so health and readiness probes can report whether the backing
//! Supabase project answers.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{info_span, Instrument};

use crate::{
    error::{MessagingError, Result},
    DEFAULT_TIMEOUT_SECONDS,
};

/// Backing store as seen by health checks.
#[async_trait]
pub trait StorageClient: Send + Sync + fmt::Debug {
    /// Returns `true` when the store answered and accepted the credentials.
    async fn ping(&self) -> bool;

    /// Short name reported in health output.
    fn name(&self) -> &'static str;
}

/// Connection settings for a Supabase project.
#[derive(Clone)]
pub struct StorageConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Public anon key used for the connectivity check.
    pub anon_key: String,
    /// Service-role key, kept for admin operations when present.
    pub service_key: Option<String>,
    /// Timeout for one request.
    pub timeout: Duration,
}

impl StorageConfig {
    /// Creates a config with the default timeout and no service key.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            service_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("url", &self.url)
            .field("anon_key", &"[REDACTED]")
            .field("service_key", &self.service_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// `StorageClient` for a Supabase PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    client: reqwest::Client,
    config: StorageConfig,
}

impl SupabaseClient {
    /// Creates a client for the configured project.
    ///
    /// # Errors
    ///
    /// Returns `MessagingError::ConfigurationError` if the URL or anon key is
    /// empty, or the HTTP client cannot be built.
    pub fn new(config: StorageConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(MessagingError::configuration("storage url is empty"));
        }
        if config.anon_key.trim().is_empty() {
            return Err(MessagingError::configuration("storage anon key is empty"));
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build().map_err(|e| {
            MessagingError::configuration(format!("failed to build HTTP client: {e}"))
        })?;

        Ok(Self { client, config })
    }

    /// Whether a service-role key was supplied.
    pub fn has_admin_access(&self) -> bool {
        self.config.service_key.as_deref().is_some_and(|key| !key.is_empty())
    }

    fn rest_url(&self) -> String {
        format!("{}/rest/v1/", self.config.url.trim_end_matches('/'))
    }
}

#[async_trait]
impl StorageClient for SupabaseClient {
    async fn ping(&self) -> bool {
        let span = info_span!("storage_ping", storage = self.name());

        async move {
            let response = self
                .client
                .get(self.rest_url())
                .header("apikey", &self.config.anon_key)
                .bearer_auth(&self.config.anon_key)
                .send()
                .await;

            match response {
                Ok(response) => {
                    let status = response.status();
                    let reachable = !status.is_server_error()
                        && status != StatusCode::UNAUTHORIZED
                        && status != StatusCode::FORBIDDEN;
                    if !reachable {
                        tracing::warn!(status = status.as_u16(), "Storage ping rejected");
                    }
                    reachable
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Storage ping failed");
                    false
                },
            }
        }
        .instrument(span)
        .await
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_settings_rejected() {
        assert!(SupabaseClient::new(StorageConfig::new("", "key")).is_err());
        assert!(SupabaseClient::new(StorageConfig::new("https://x.supabase.co", "")).is_err());
    }

    #[test]
    fn admin_access_follows_service_key() {
        let mut config = StorageConfig::new("https://x.supabase.co", "anon");
        assert!(!SupabaseClient::new(config.clone()).unwrap().has_admin_access());

        config.service_key = Some("service".into());
        assert!(SupabaseClient::new(config).unwrap().has_admin_access());
    }

    #[test]
    fn debug_output_redacts_keys() {
        let mut config = StorageConfig::new("https://x.supabase.co", "anon-secret");
        config.service_key = Some("service-secret".into());
        let debug = format!("{config:?}");

        assert!(!debug.contains("anon-secret"));
        assert!(!debug.contains("service-secret"));
    }
}
