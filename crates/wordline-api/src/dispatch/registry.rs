//! Event handler trait and the kind-to-handler registry.

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use wordline_core::{Event, EventKind};
use wordline_messaging::{MessagingError, ReplyClient};

use super::handlers::{FollowHandler, PostbackHandler, TextMessageHandler, UnfollowHandler};

/// Result of a handler that completed without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// A reply was accepted by the platform.
    Replied,
    /// The handler intentionally sent nothing.
    NoReply,
}

/// Failures raised inside a handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The reply call failed.
    #[error("reply failed: {0}")]
    Reply(#[from] MessagingError),

    /// The handler was routed an event of another kind.
    #[error("handler for {expected} received {actual} event")]
    UnexpectedEvent {
        /// Kind the handler serves
        expected: EventKind,
        /// Kind it received
        actual: EventKind,
    },
}

impl HandlerError {
    /// Returns the error code.
    pub const fn code(&self) -> &'static str {
        "E2002"
    }
}

/// Processes one kind of event and produces at most one reply.
#[async_trait]
pub trait EventHandler: Send + Sync + fmt::Debug {
    /// Kind this handler is registered under.
    fn kind(&self) -> EventKind;

    /// Handles one event.
    ///
    /// # Errors
    ///
    /// Returns `HandlerError` when the reply could not be delivered. The
    /// dispatcher records the failure and continues with the next event.
    async fn handle(&self, event: &Event) -> Result<HandlerOutcome, HandlerError>;
}

/// Immutable map from event kind to handler.
///
/// Built once at startup through [`HandlerRegistryBuilder`] and shared
/// read-only across requests.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<EventKind, Arc<dyn EventHandler>>,
}

impl HandlerRegistry {
    /// Starts an empty registry.
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Registry with the four standard handlers sharing one reply client.
    pub fn standard(reply: Arc<dyn ReplyClient>) -> Self {
        Self::builder()
            .register(TextMessageHandler::new(Arc::clone(&reply)))
            .register(FollowHandler::new(Arc::clone(&reply)))
            .register(UnfollowHandler::new())
            .register(PostbackHandler::new(reply))
            .build()
    }

    /// Handler for `kind`, if one is registered.
    pub fn resolve(&self, kind: EventKind) -> Option<&Arc<dyn EventHandler>> {
        self.handlers.get(&kind)
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Builder for [`HandlerRegistry`].
#[derive(Debug, Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<EventKind, Arc<dyn EventHandler>>,
}

impl HandlerRegistryBuilder {
    /// Registers a handler under its kind, replacing any earlier one.
    #[must_use]
    pub fn register(self, handler: impl EventHandler + 'static) -> Self {
        self.register_arc(Arc::new(handler))
    }

    /// Registers a shared handler under its kind, replacing any earlier one.
    #[must_use]
    pub fn register_arc(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let kind = handler.kind();
        if self.handlers.insert(kind, handler).is_some() {
            tracing::debug!(event_kind = %kind, "Replaced previously registered handler");
        }
        self
    }

    /// Freezes the registry.
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry { handlers: self.handlers }
    }
}

#[cfg(test)]
mod tests {
    use wordline_testing::RecordingReplyClient;

    use super::*;

    #[test]
    fn standard_registry_covers_every_kind() {
        let registry = HandlerRegistry::standard(Arc::new(RecordingReplyClient::new()));

        assert_eq!(registry.len(), EventKind::ALL.len());
        for kind in EventKind::ALL {
            let handler = registry.resolve(kind).expect("handler registered");
            assert_eq!(handler.kind(), kind);
        }
    }

    #[test]
    fn empty_registry_resolves_nothing() {
        let registry = HandlerRegistry::builder().build();

        assert!(registry.is_empty());
        assert!(registry.resolve(EventKind::Follow).is_none());
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let registry = HandlerRegistry::builder()
            .register(UnfollowHandler::new())
            .register(UnfollowHandler::new())
            .build();

        assert_eq!(registry.len(), 1);
    }
}
