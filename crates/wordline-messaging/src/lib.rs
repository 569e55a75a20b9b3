//! External collaborators of the webhook responder.
//!
//! Two process-wide clients live here, each behind a trait so the dispatcher
//! and health checks can be exercised with fakes:
//!
//! - [`ReplyClient`] sends the single reply a reply token permits. The
//!   production implementation is [`LineReplyClient`], which talks to the
//!   LINE Messaging API.
//! - [`StorageClient`] reports whether the backing store is reachable. The
//!   production implementation is [`SupabaseClient`]. No records are read or
//!   written yet; only the connectivity check is wired in.
//!
//! Both clients hold a pooled `reqwest::Client` with a bounded timeout and
//! are meant to be built once at startup and shared through an `Arc`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod storage;

pub use client::{ClientConfig, LineReplyClient, ReplyClient};
pub use error::{MessagingError, Result};
pub use storage::{StorageClient, StorageConfig, SupabaseClient};

/// Default timeout for outbound calls in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 5;

/// Default LINE Messaging API base URL.
pub const DEFAULT_LINE_API_BASE_URL: &str = "https://api.line.me";
