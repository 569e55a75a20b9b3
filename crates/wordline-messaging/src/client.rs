//! Reply client for the LINE Messaging API.
//!
//! Handles request construction, response categorization and truncation of
//! error bodies. Each call sends exactly one request: reply tokens are
//! single-use, so a failed reply is reported rather than retried.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Response, StatusCode};
use serde::Serialize;
use tracing::{info_span, Instrument};
use wordline_core::{ReplyMessage, ReplyToken};

use crate::{
    error::{MessagingError, Result},
    DEFAULT_LINE_API_BASE_URL, DEFAULT_TIMEOUT_SECONDS,
};

const REPLY_PATH: &str = "/v2/bot/message/reply";
const MAX_ERROR_BODY_SIZE: usize = 1024;

/// Sends the reply permitted by a reply token.
#[async_trait]
pub trait ReplyClient: Send + Sync + fmt::Debug {
    /// Sends `message` as the reply for `token`.
    ///
    /// # Errors
    ///
    /// Returns a `MessagingError` describing why the platform did not accept
    /// the reply. An expired or reused token is a `ClientError`.
    async fn reply(&self, token: &ReplyToken, message: &ReplyMessage) -> Result<()>;
}

/// Configuration for the LINE reply client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API origin, overridden in tests to point at a mock server.
    pub base_url: String,
    /// Total timeout for one reply call.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LINE_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            user_agent: format!("Wordline/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// `ReplyClient` backed by the LINE Messaging API.
#[derive(Clone)]
pub struct LineReplyClient {
    client: reqwest::Client,
    access_token: String,
    reply_url: String,
    config: ClientConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: [WireMessage<'a>; 1],
}

#[derive(Serialize)]
struct WireMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

impl LineReplyClient {
    /// Creates a reply client authenticated with the channel access token.
    ///
    /// # Errors
    ///
    /// Returns `MessagingError::ConfigurationError` if the token is empty or
    /// the HTTP client cannot be built.
    pub fn new(access_token: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(MessagingError::configuration("channel access token is empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                MessagingError::configuration(format!("failed to build HTTP client: {e}"))
            })?;

        let reply_url = format!("{}{REPLY_PATH}", config.base_url.trim_end_matches('/'));

        Ok(Self { client, access_token, reply_url, config })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.config.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl fmt::Debug for LineReplyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineReplyClient")
            .field("reply_url", &self.reply_url)
            .field("access_token", &"[REDACTED]")
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

#[async_trait]
impl ReplyClient for LineReplyClient {
    async fn reply(&self, token: &ReplyToken, message: &ReplyMessage) -> Result<()> {
        let start_time = std::time::Instant::now();
        let span = info_span!("line_reply", reply_token = %token.redacted());

        async move {
            let body = ReplyRequest {
                reply_token: token.as_str(),
                messages: [WireMessage { kind: "text", text: &message.text }],
            };

            let response = match self
                .client
                .post(&self.reply_url)
                .bearer_auth(&self.access_token)
                .json(&body)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!(
                        duration_ms = start_time.elapsed().as_millis(),
                        "Reply request failed: {}",
                        e
                    );
                    if e.is_timeout() {
                        return Err(MessagingError::timeout(self.timeout_ms()));
                    }
                    return Err(MessagingError::network(e.to_string()));
                },
            };

            let status = response.status();
            tracing::debug!(
                status = status.as_u16(),
                duration_ms = start_time.elapsed().as_millis(),
                "Received reply response"
            );

            if status.is_success() {
                return Ok(());
            }

            Err(categorize(response).await)
        }
        .instrument(span)
        .await
    }
}

async fn categorize(response: Response) -> MessagingError {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());
        return MessagingError::rate_limited(retry_after);
    }

    let body = read_truncated_body(response).await;
    if status.is_server_error() {
        MessagingError::server_error(status.as_u16(), body)
    } else {
        MessagingError::client_error(status.as_u16(), body)
    }
}

async fn read_truncated_body(response: Response) -> String {
    match response.bytes().await {
        Ok(bytes) if bytes.len() > MAX_ERROR_BODY_SIZE => {
            let truncated = String::from_utf8_lossy(&bytes[..MAX_ERROR_BODY_SIZE]);
            format!("{truncated}... (truncated)")
        },
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => format!("[Failed to read response body: {e}]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_access_token_rejected() {
        let err = LineReplyClient::new("  ", ClientConfig::default()).unwrap_err();
        assert!(matches!(err, MessagingError::ConfigurationError { .. }));
    }

    #[test]
    fn debug_output_redacts_token() {
        let client = LineReplyClient::new("very-secret-token", ClientConfig::default()).unwrap();
        let debug = format!("{client:?}");

        assert!(!debug.contains("very-secret-token"));
        assert!(debug.contains("https://api.line.me/v2/bot/message/reply"));
    }

    #[test]
    fn base_url_trailing_slash_ignored() {
        let config = ClientConfig { base_url: "http://localhost:9000/".into(), ..Default::default() };
        let client = LineReplyClient::new("token", config).unwrap();
        assert_eq!(client.reply_url, "http://localhost:9000/v2/bot/message/reply");
    }

    #[test]
    fn wire_format_matches_platform() {
        let body = ReplyRequest {
            reply_token: "abc",
            messages: [WireMessage { kind: "text", text: "hello" }],
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "replyToken": "abc",
                "messages": [{ "type": "text", "text": "hello" }]
            })
        );
    }
}
