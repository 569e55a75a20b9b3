//! Test infrastructure for the webhook responder.
//!
//! Provides in-memory fakes for the outbound clients and builders for signed
//! platform payloads. The signer here is written independently of the
//! gateway's verifier so the two check each other.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod fakes;
pub mod fixtures;

pub use fakes::{FakeStorage, RecordedReply, RecordingReplyClient};
pub use fixtures::{sign, WebhookBuilder, TEST_CHANNEL_SECRET};
