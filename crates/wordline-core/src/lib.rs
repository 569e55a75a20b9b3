//! Core domain models and event types.
//!
//! Provides the strongly-typed platform events, reply primitives and error
//! taxonomy shared by the HTTP gateway and the messaging clients. Nothing in
//! this crate performs I/O.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod events;
pub mod models;
pub mod time;

pub use error::{Result, WordlineError};
pub use events::{Event, EventContext, EventKind, EventParseError, WebhookEnvelope};
pub use models::{ReplyMessage, ReplyToken, UserId};
pub use time::{Clock, RealClock, TestClock};
