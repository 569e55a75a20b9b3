//! Standard handlers, one per event kind.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument};
use wordline_core::{Event, EventKind, ReplyMessage, ReplyToken};
use wordline_messaging::ReplyClient;

use super::{
    registry::{EventHandler, HandlerError, HandlerOutcome},
    responses,
};

async fn send(
    reply: &dyn ReplyClient,
    token: &ReplyToken,
    text: &str,
) -> Result<HandlerOutcome, HandlerError> {
    reply.reply(token, &ReplyMessage::new(text)).await?;
    Ok(HandlerOutcome::Replied)
}

fn unexpected(expected: EventKind, event: &Event) -> HandlerError {
    HandlerError::UnexpectedEvent { expected, actual: event.kind() }
}

/// Answers text messages from the keyword table.
#[derive(Debug)]
pub struct TextMessageHandler {
    reply: Arc<dyn ReplyClient>,
}

impl TextMessageHandler {
    /// Creates the handler.
    pub fn new(reply: Arc<dyn ReplyClient>) -> Self {
        Self { reply }
    }
}

#[async_trait]
impl EventHandler for TextMessageHandler {
    fn kind(&self) -> EventKind {
        EventKind::TextMessage
    }

    #[instrument(name = "text_message_handler", skip_all)]
    async fn handle(&self, event: &Event) -> Result<HandlerOutcome, HandlerError> {
        let Event::TextMessage { reply_token, text, .. } = event else {
            return Err(unexpected(self.kind(), event));
        };

        let normalized = responses::normalize(text);
        let command = responses::lookup(&normalized);
        debug!(text = %normalized, "Received text message");
        info!(command = command.map_or("none", |c| c.en), "Text message matched");

        let reply = command.map_or(responses::DEFAULT_REPLY, |c| c.reply);
        send(self.reply.as_ref(), reply_token, reply).await
    }
}

/// Greets users who add the bot.
#[derive(Debug)]
pub struct FollowHandler {
    reply: Arc<dyn ReplyClient>,
}

impl FollowHandler {
    /// Creates the handler.
    pub fn new(reply: Arc<dyn ReplyClient>) -> Self {
        Self { reply }
    }
}

#[async_trait]
impl EventHandler for FollowHandler {
    fn kind(&self) -> EventKind {
        EventKind::Follow
    }

    #[instrument(name = "follow_handler", skip_all)]
    async fn handle(&self, event: &Event) -> Result<HandlerOutcome, HandlerError> {
        let Event::Follow { reply_token, .. } = event else {
            return Err(unexpected(self.kind(), event));
        };

        info!("New follower");
        send(self.reply.as_ref(), reply_token, responses::WELCOME_REPLY).await
    }
}

/// Logs users who block the bot. No reply is possible.
#[derive(Debug, Default)]
pub struct UnfollowHandler;

impl UnfollowHandler {
    /// Creates the handler.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventHandler for UnfollowHandler {
    fn kind(&self) -> EventKind {
        EventKind::Unfollow
    }

    async fn handle(&self, event: &Event) -> Result<HandlerOutcome, HandlerError> {
        if !matches!(event, Event::Unfollow { .. }) {
            return Err(unexpected(self.kind(), event));
        }

        info!("User unfollowed");
        Ok(HandlerOutcome::NoReply)
    }
}

/// Answers postback actions with a placeholder.
#[derive(Debug)]
pub struct PostbackHandler {
    reply: Arc<dyn ReplyClient>,
}

impl PostbackHandler {
    /// Creates the handler.
    pub fn new(reply: Arc<dyn ReplyClient>) -> Self {
        Self { reply }
    }
}

#[async_trait]
impl EventHandler for PostbackHandler {
    fn kind(&self) -> EventKind {
        EventKind::Postback
    }

    #[instrument(name = "postback_handler", skip_all)]
    async fn handle(&self, event: &Event) -> Result<HandlerOutcome, HandlerError> {
        let Event::Postback { reply_token, data, .. } = event else {
            return Err(unexpected(self.kind(), event));
        };

        info!(data = %data, "Received postback");
        send(self.reply.as_ref(), reply_token, responses::POSTBACK_REPLY).await
    }
}
