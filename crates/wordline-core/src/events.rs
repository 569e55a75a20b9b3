//! Platform webhook events.
//!
//! The platform posts an envelope holding an array of event objects, each
//! tagged by a `type` field:
//!
//! ```text
//! {
//!   "destination": "Uxxxxxxxx",
//!   "events": [
//!     { "type": "message", "replyToken": "...", "source": {...}, "message": {...} },
//!     { "type": "unfollow", "source": {...} }
//!   ]
//! }
//! ```
//!
//! Events are decoded one at a time from raw JSON values, so a single unknown
//! or malformed entry is reported on its own instead of failing the batch.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{ReplyToken, UserId};

/// Event kinds the responder can route to a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Text message sent by a user.
    TextMessage,
    /// User added the bot as a friend or unblocked it.
    Follow,
    /// User blocked the bot.
    Unfollow,
    /// User tapped a postback action.
    Postback,
}

impl EventKind {
    /// Every routable kind.
    pub const ALL: [Self; 4] = [Self::TextMessage, Self::Follow, Self::Unfollow, Self::Postback];

    /// Discriminant as it appears in the platform's `type` field.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::TextMessage => "message",
            Self::Follow => "follow",
            Self::Unfollow => "unfollow",
            Self::Postback => "postback",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Metadata carried by every event variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventContext {
    /// Originating user. Group and room sources may omit it.
    pub user_id: Option<UserId>,
    /// Platform-assigned event id, useful for correlating logs.
    pub webhook_event_id: Option<String>,
    /// Whether the platform is re-sending an event it could not deliver.
    pub is_redelivery: bool,
}

/// A decoded platform event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Text message.
    TextMessage {
        /// Event metadata.
        context: EventContext,
        /// Token for the single permitted reply.
        reply_token: ReplyToken,
        /// Message text exactly as sent.
        text: String,
    },
    /// Follow (friend add).
    Follow {
        /// Event metadata.
        context: EventContext,
        /// Token for the single permitted reply.
        reply_token: ReplyToken,
    },
    /// Unfollow (block). No reply is possible.
    Unfollow {
        /// Event metadata.
        context: EventContext,
    },
    /// Postback action.
    Postback {
        /// Event metadata.
        context: EventContext,
        /// Token for the single permitted reply.
        reply_token: ReplyToken,
        /// Opaque action payload.
        data: String,
    },
}

impl Event {
    /// Returns the routing kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::TextMessage { .. } => EventKind::TextMessage,
            Self::Follow { .. } => EventKind::Follow,
            Self::Unfollow { .. } => EventKind::Unfollow,
            Self::Postback { .. } => EventKind::Postback,
        }
    }

    /// Returns the metadata shared by all variants.
    pub fn context(&self) -> &EventContext {
        match self {
            Self::TextMessage { context, .. }
            | Self::Follow { context, .. }
            | Self::Unfollow { context }
            | Self::Postback { context, .. } => context,
        }
    }

    /// Returns the originating user, when the source carried one.
    pub fn user_id(&self) -> Option<&UserId> {
        self.context().user_id.as_ref()
    }

    /// Returns the reply token. Unfollow events never carry one.
    pub fn reply_token(&self) -> Option<&ReplyToken> {
        match self {
            Self::TextMessage { reply_token, .. }
            | Self::Follow { reply_token, .. }
            | Self::Postback { reply_token, .. } => Some(reply_token),
            Self::Unfollow { .. } => None,
        }
    }

    /// Decodes one event object from the envelope's `events` array.
    ///
    /// # Errors
    ///
    /// Returns `EventParseError::UnknownKind` for event types (and message
    /// types) the responder does not route, and `EventParseError::Malformed`
    /// when a known kind is missing required fields.
    pub fn from_value(value: Value) -> Result<Self, EventParseError> {
        let tag_hint = value.get("type").and_then(Value::as_str).unwrap_or("<missing>").to_string();

        let raw: RawEvent = serde_json::from_value(value)
            .map_err(|e| EventParseError::malformed(&tag_hint, e.to_string()))?;

        let context = EventContext {
            user_id: raw
                .source
                .and_then(|source| source.user_id)
                .filter(|id| !id.is_empty())
                .map(UserId::from),
            webhook_event_id: raw.webhook_event_id,
            is_redelivery: raw.delivery_context.is_some_and(|ctx| ctx.is_redelivery),
        };

        match raw.kind.as_str() {
            "message" => {
                let message = raw
                    .message
                    .ok_or_else(|| EventParseError::malformed("message", "missing message object"))?;

                if message.kind != "text" {
                    return Err(EventParseError::UnknownKind {
                        tag: format!("message/{}", message.kind),
                    });
                }

                let text = message
                    .text
                    .ok_or_else(|| EventParseError::malformed("message", "missing message text"))?;
                let reply_token = require_reply_token("message", raw.reply_token)?;

                Ok(Self::TextMessage { context, reply_token, text })
            },
            "follow" => {
                let reply_token = require_reply_token("follow", raw.reply_token)?;
                Ok(Self::Follow { context, reply_token })
            },
            "unfollow" => Ok(Self::Unfollow { context }),
            "postback" => {
                let postback = raw
                    .postback
                    .ok_or_else(|| EventParseError::malformed("postback", "missing postback object"))?;
                let reply_token = require_reply_token("postback", raw.reply_token)?;

                Ok(Self::Postback { context, reply_token, data: postback.data })
            },
            other => Err(EventParseError::UnknownKind { tag: other.to_string() }),
        }
    }
}

fn require_reply_token(tag: &str, token: Option<String>) -> Result<ReplyToken, EventParseError> {
    match token {
        Some(token) if !token.is_empty() => Ok(ReplyToken::new(token)),
        _ => Err(EventParseError::malformed(tag, "missing replyToken")),
    }
}

/// Reasons a single event object could not be routed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventParseError {
    /// The event type is not one the responder handles.
    #[error("unknown event kind: {tag}")]
    UnknownKind {
        /// Discriminant as received, `message/<type>` for non-text messages.
        tag: String,
    },

    /// The event type is known but required fields are missing or mistyped.
    #[error("malformed {tag} event: {reason}")]
    Malformed {
        /// Discriminant as received.
        tag: String,
        /// Decoder message.
        reason: String,
    },
}

impl EventParseError {
    fn malformed(tag: &str, reason: impl Into<String>) -> Self {
        Self::Malformed { tag: tag.to_string(), reason: reason.into() }
    }

    /// Discriminant of the offending event.
    pub fn tag(&self) -> &str {
        match self {
            Self::UnknownKind { tag } | Self::Malformed { tag, .. } => tag,
        }
    }
}

/// Top-level webhook body.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    /// Bot user id the events were sent to.
    #[serde(default)]
    pub destination: Option<String>,
    /// Raw event objects, decoded individually by [`Event::from_value`].
    pub events: Vec<Value>,
}

impl WebhookEnvelope {
    /// Parses the envelope from the raw (already verified) body.
    ///
    /// # Errors
    ///
    /// Returns the JSON error when the body is not an object with an
    /// `events` array.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Number of event objects in the envelope.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the envelope carries no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Decodes each event independently, preserving order.
    pub fn into_events(self) -> impl Iterator<Item = Result<Event, EventParseError>> {
        self.events.into_iter().map(Event::from_value)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    reply_token: Option<String>,
    source: Option<RawSource>,
    message: Option<RawMessage>,
    postback: Option<RawPostback>,
    webhook_event_id: Option<String>,
    delivery_context: Option<RawDeliveryContext>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSource {
    user_id: Option<String>,
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct RawPostback {
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDeliveryContext {
    #[serde(default)]
    is_redelivery: bool,
}
