//! Builders for signed platform webhook payloads.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

/// Channel secret used across tests.
pub const TEST_CHANNEL_SECRET: &str = "test-channel-secret-abcdef";

/// Computes the `X-Line-Signature` value for `body`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Builder for a webhook envelope with one or more events.
#[derive(Debug, Clone)]
pub struct WebhookBuilder {
    destination: String,
    events: Vec<Value>,
}

impl WebhookBuilder {
    /// Creates an envelope with no events.
    pub fn new() -> Self {
        Self { destination: "Ubot0000000000000000000000000000".to_string(), events: Vec::new() }
    }

    /// Appends a text message event.
    #[must_use]
    pub fn text_message(self, user_id: &str, reply_token: &str, text: &str) -> Self {
        self.raw(json!({
            "type": "message",
            "mode": "active",
            "timestamp": 1_700_000_000_000_u64,
            "webhookEventId": event_id(),
            "deliveryContext": { "isRedelivery": false },
            "replyToken": reply_token,
            "source": { "type": "user", "userId": user_id },
            "message": { "id": "468789577898262530", "type": "text", "text": text }
        }))
    }

    /// Appends a follow event.
    #[must_use]
    pub fn follow(self, user_id: &str, reply_token: &str) -> Self {
        self.raw(json!({
            "type": "follow",
            "mode": "active",
            "timestamp": 1_700_000_000_000_u64,
            "webhookEventId": event_id(),
            "deliveryContext": { "isRedelivery": false },
            "replyToken": reply_token,
            "source": { "type": "user", "userId": user_id }
        }))
    }

    /// Appends an unfollow event.
    #[must_use]
    pub fn unfollow(self, user_id: &str) -> Self {
        self.raw(json!({
            "type": "unfollow",
            "mode": "active",
            "timestamp": 1_700_000_000_000_u64,
            "webhookEventId": event_id(),
            "deliveryContext": { "isRedelivery": false },
            "source": { "type": "user", "userId": user_id }
        }))
    }

    /// Appends a postback event.
    #[must_use]
    pub fn postback(self, user_id: &str, reply_token: &str, data: &str) -> Self {
        self.raw(json!({
            "type": "postback",
            "mode": "active",
            "timestamp": 1_700_000_000_000_u64,
            "webhookEventId": event_id(),
            "deliveryContext": { "isRedelivery": false },
            "replyToken": reply_token,
            "source": { "type": "user", "userId": user_id },
            "postback": { "data": data }
        }))
    }

    /// Appends an arbitrary event object.
    #[must_use]
    pub fn raw(mut self, event: Value) -> Self {
        self.events.push(event);
        self
    }

    /// Serializes the envelope.
    pub fn build(self) -> Bytes {
        Bytes::from(json!({ "destination": self.destination, "events": self.events }).to_string())
    }

    /// Serializes the envelope and signs it with `secret`.
    pub fn signed(self, secret: &str) -> (Bytes, String) {
        let body = self.build();
        let signature = sign(secret, &body);
        (body, signature)
    }
}

impl Default for WebhookBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn event_id() -> String {
    Uuid::new_v4().simple().to_string().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic() {
        assert_eq!(sign("secret", b"body"), sign("secret", b"body"));
        assert_ne!(sign("secret", b"body"), sign("secret", b"body!"));
        assert_ne!(sign("secret", b"body"), sign("other", b"body"));
    }

    #[test]
    fn builder_preserves_event_order() {
        let body = WebhookBuilder::new()
            .follow("U1", "r1")
            .text_message("U2", "r2", "help")
            .unfollow("U3")
            .build();

        let value: Value = serde_json::from_slice(&body).unwrap();
        let kinds: Vec<_> =
            value["events"].as_array().unwrap().iter().map(|e| e["type"].clone()).collect();

        assert_eq!(kinds, vec![json!("follow"), json!("message"), json!("unfollow")]);
    }
}
