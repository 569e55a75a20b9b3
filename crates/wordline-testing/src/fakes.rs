//! In-memory fakes for `ReplyClient` and `StorageClient`.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use async_trait::async_trait;
use serde_json::json;
use wordline_core::{ReplyMessage, ReplyToken};
use wordline_messaging::{MessagingError, ReplyClient, StorageClient};

/// A reply accepted by [`RecordingReplyClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedReply {
    /// Raw reply token.
    pub token: String,
    /// Text that was sent.
    pub text: String,
}

#[derive(Debug, Default)]
struct ReplyLog {
    accepted: Vec<RecordedReply>,
    attempts: HashMap<String, usize>,
}

/// Reply client that records replies and enforces single-use tokens.
///
/// The first reply for a token succeeds. Any later reply for the same token
/// fails with the 400 the platform returns for a reused token.
#[derive(Debug, Default)]
pub struct RecordingReplyClient {
    log: Mutex<ReplyLog>,
    failure: Option<MessagingError>,
}

impl RecordingReplyClient {
    /// Creates a client that accepts each token once.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client that rejects every reply with `error`.
    pub fn failing(error: MessagingError) -> Self {
        Self { log: Mutex::default(), failure: Some(error) }
    }

    /// Replies accepted so far, in call order.
    pub fn replies(&self) -> Vec<RecordedReply> {
        self.lock().accepted.clone()
    }

    /// Texts of accepted replies, in call order.
    pub fn texts(&self) -> Vec<String> {
        self.lock().accepted.iter().map(|reply| reply.text.clone()).collect()
    }

    /// Number of reply calls made with `token`, accepted or not.
    pub fn attempts_for(&self, token: &str) -> usize {
        self.lock().attempts.get(token).copied().unwrap_or(0)
    }

    /// Total number of reply calls made.
    pub fn total_attempts(&self) -> usize {
        self.lock().attempts.values().sum()
    }

    fn lock(&self) -> MutexGuard<'_, ReplyLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ReplyClient for RecordingReplyClient {
    async fn reply(
        &self,
        token: &ReplyToken,
        message: &ReplyMessage,
    ) -> wordline_messaging::Result<()> {
        let mut log = self.lock();
        let attempts = log.attempts.entry(token.as_str().to_string()).or_insert(0);
        *attempts += 1;
        let first_use = *attempts == 1;

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        if !first_use {
            return Err(MessagingError::client_error(
                400,
                json!({ "message": "Invalid reply token" }).to_string(),
            ));
        }

        log.accepted.push(RecordedReply {
            token: token.as_str().to_string(),
            text: message.text.clone(),
        });
        Ok(())
    }
}

/// Storage fake with a switchable reachability flag.
#[derive(Debug)]
pub struct FakeStorage {
    reachable: AtomicBool,
    pings: AtomicUsize,
}

impl FakeStorage {
    /// Creates a storage fake that answers pings with `reachable`.
    pub fn new(reachable: bool) -> Self {
        Self { reachable: AtomicBool::new(reachable), pings: AtomicUsize::new(0) }
    }

    /// Changes the ping answer.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Number of pings received.
    pub fn ping_count(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn ping(&self) -> bool {
        self.pings.fetch_add(1, Ordering::SeqCst);
        self.reachable.load(Ordering::SeqCst)
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}
