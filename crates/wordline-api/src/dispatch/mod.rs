//! Event dispatch: verify, parse, route, handle.
//!
//! The [`Dispatcher`] owns the signature verifier and the handler registry.
//! One webhook call is processed as:
//!
//! 1. **Verify** the body signature. A mismatch rejects the whole request.
//! 2. **Parse** the envelope. A body that is not an envelope rejects the
//!    whole request.
//! 3. **Route** each event by kind. Unknown or malformed events are skipped.
//! 4. **Handle** all events concurrently under one deadline. Handler errors,
//!    panics and events still pending at the deadline are recorded in the
//!    [`DispatchReport`], which keeps envelope order.
//!
//! Only steps 1 and 2 can fail the request. Everything after is scoped to a
//! single event, so reply latency never turns into a request-level error.

pub mod handlers;
pub mod registry;
pub mod responses;

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use bytes::Bytes;
use futures::{future::join_all, FutureExt};
use tracing::{debug, error, info, instrument, warn};
use wordline_core::{Event, EventParseError, UserId, WordlineError};

pub use self::registry::{
    EventHandler, HandlerError, HandlerOutcome, HandlerRegistry, HandlerRegistryBuilder,
};
use crate::crypto::{InboundRequest, SignatureVerifier, VerifiedPayload};

/// What happened to one event in a batch.
#[derive(Debug)]
pub enum Outcome {
    /// Handler sent a reply.
    Replied,
    /// Handler completed without replying.
    NoReply,
    /// Event was not routed to any handler.
    Skipped(WordlineError),
    /// Handler failed or panicked.
    Failed(WordlineError),
}

impl Outcome {
    /// Short label used in logs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Replied => "replied",
            Self::NoReply => "no_reply",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }

    /// Error behind a skipped or failed event.
    pub fn error(&self) -> Option<&WordlineError> {
        match self {
            Self::Skipped(err) | Self::Failed(err) => Some(err),
            Self::Replied | Self::NoReply => None,
        }
    }
}

/// Result for one event, with the identifiers needed to trace it.
#[derive(Debug)]
pub struct EventOutcome {
    /// Position in the envelope's `events` array.
    pub index: usize,
    /// Event discriminant as received.
    pub kind: String,
    /// Originating user, when known.
    pub user_id: Option<UserId>,
    /// Platform event id, when known.
    pub webhook_event_id: Option<String>,
    /// What happened.
    pub outcome: Outcome,
}

impl EventOutcome {
    /// Emits one structured log line for this event.
    pub fn log(&self) {
        let user_id = self.user_id.as_ref().map_or("unknown", UserId::as_str);
        let webhook_event_id = self.webhook_event_id.as_deref().unwrap_or("none");

        match &self.outcome {
            Outcome::Replied | Outcome::NoReply => info!(
                event_index = self.index,
                event_kind = %self.kind,
                user_id,
                webhook_event_id,
                outcome = self.outcome.as_str(),
                "Event processed"
            ),
            Outcome::Skipped(err) => warn!(
                event_index = self.index,
                event_kind = %self.kind,
                user_id,
                webhook_event_id,
                outcome = self.outcome.as_str(),
                error_code = err.code(),
                error = %err,
                "Event skipped"
            ),
            Outcome::Failed(err) => error!(
                event_index = self.index,
                event_kind = %self.kind,
                user_id,
                webhook_event_id,
                outcome = self.outcome.as_str(),
                error_code = err.code(),
                error = %err,
                "Event failed"
            ),
        }
    }
}

/// Per-event results for one webhook call, in envelope order.
#[derive(Debug, Default)]
pub struct DispatchReport {
    outcomes: Vec<EventOutcome>,
}

impl DispatchReport {
    /// All event outcomes.
    pub fn outcomes(&self) -> &[EventOutcome] {
        &self.outcomes
    }

    /// Number of events in the batch.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether the batch was empty.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of events that produced a reply.
    pub fn replied(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Replied))
    }

    /// Number of events skipped before reaching a handler.
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped(_)))
    }

    /// Number of events whose handler failed.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&Outcome) -> bool) -> usize {
        self.outcomes.iter().filter(|event| predicate(&event.outcome)).count()
    }
}

/// Default bound on handling one batch.
pub const DEFAULT_DISPATCH_DEADLINE: Duration = Duration::from_secs(8);

/// Verifies webhook calls and routes their events to handlers.
#[derive(Debug)]
pub struct Dispatcher {
    verifier: SignatureVerifier,
    registry: Arc<HandlerRegistry>,
    deadline: Duration,
}

impl Dispatcher {
    /// Creates a dispatcher from a verifier and a frozen registry.
    pub fn new(verifier: SignatureVerifier, registry: Arc<HandlerRegistry>) -> Self {
        Self { verifier, registry, deadline: DEFAULT_DISPATCH_DEADLINE }
    }

    /// Sets how long handlers of one batch may run. Must stay below the
    /// HTTP request timeout.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Frames, verifies and dispatches a raw webhook call.
    ///
    /// # Errors
    ///
    /// Returns `MalformedRequest` when the signature or body is missing,
    /// `InvalidSignature` when verification fails and `MalformedPayload`
    /// when the verified body is not an envelope.
    pub async fn verify_and_dispatch(
        &self,
        body: Bytes,
        signature: Option<&str>,
    ) -> Result<DispatchReport, WordlineError> {
        let request = InboundRequest::new(signature, body)?;
        self.dispatch(request).await
    }

    /// Verifies a framed request and dispatches its events.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSignature` or `MalformedPayload`. Per-event failures
    /// are reported in the `DispatchReport` instead.
    #[instrument(name = "dispatch_webhook", skip_all, fields(body_len = request.body().len()))]
    pub async fn dispatch(&self, request: InboundRequest) -> Result<DispatchReport, WordlineError> {
        let payload = self.verifier.verify(request).map_err(|e| {
            warn!(reason = %e, "Webhook signature rejected");
            WordlineError::from(e)
        })?;

        self.dispatch_verified(&payload).await
    }

    async fn dispatch_verified(
        &self,
        payload: &VerifiedPayload,
    ) -> Result<DispatchReport, WordlineError> {
        let envelope = payload.parse()?;
        debug!(
            event_count = envelope.len(),
            destination = envelope.destination.as_deref().unwrap_or("unknown"),
            "Webhook envelope parsed"
        );

        let pending = envelope
            .into_events()
            .enumerate()
            .map(|(index, event)| self.dispatch_event(index, event));

        // join_all yields results in input order regardless of completion order.
        let outcomes = join_all(pending).await;
        for outcome in &outcomes {
            outcome.log();
        }

        Ok(DispatchReport { outcomes })
    }

    async fn dispatch_event(
        &self,
        index: usize,
        parsed: Result<Event, EventParseError>,
    ) -> EventOutcome {
        let event = match parsed {
            Ok(event) => event,
            Err(err) => {
                return EventOutcome {
                    index,
                    kind: err.tag().to_string(),
                    user_id: None,
                    webhook_event_id: None,
                    outcome: Outcome::Skipped(err.into()),
                };
            },
        };

        let kind = event.kind();
        let context = event.context();
        if context.is_redelivery {
            debug!(event_index = index, event_kind = %kind, "Handling redelivered event");
        }

        let mut outcome = EventOutcome {
            index,
            kind: kind.tag().to_string(),
            user_id: context.user_id.clone(),
            webhook_event_id: context.webhook_event_id.clone(),
            outcome: Outcome::NoReply,
        };

        let Some(handler) = self.registry.resolve(kind) else {
            outcome.outcome =
                Outcome::Skipped(WordlineError::UnknownEventKind { tag: kind.tag().to_string() });
            return outcome;
        };

        let handled = AssertUnwindSafe(handler.handle(&event)).catch_unwind();
        outcome.outcome = match tokio::time::timeout(self.deadline, handled).await {
            Ok(Ok(Ok(HandlerOutcome::Replied))) => Outcome::Replied,
            Ok(Ok(Ok(HandlerOutcome::NoReply))) => Outcome::NoReply,
            Ok(Ok(Err(err))) => {
                Outcome::Failed(WordlineError::handler_failure(kind, err.to_string()))
            },
            Ok(Err(panic)) => Outcome::Failed(WordlineError::handler_failure(
                kind,
                format!("handler panicked: {}", panic_message(&*panic)),
            )),
            Err(_) => Outcome::Failed(WordlineError::handler_failure(
                kind,
                format!("handler still pending after {}ms", self.deadline.as_millis()),
            )),
        };

        outcome
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
