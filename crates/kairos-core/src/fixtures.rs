//! Test fixtures for code built on Kairos calls.
//!
//! [`ScriptedHttpClient`] answers each URL with a canned reply after a fixed
//! simulated latency. Combined with `#[tokio::test(start_paused = true)]`
//! the latencies are exact, which makes race selection deterministic.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use kairos_core::fixtures::{ScriptedHttpClient, ScriptedReply};
//! use kairos_core::HttpReply;
//!
//! let client = ScriptedHttpClient::new()
//!     .route("http://fast", ScriptedReply::after(Duration::from_millis(80), HttpReply::ok("a")))
//!     .route("http://slow", ScriptedReply::after(Duration::from_millis(120), HttpReply::ok("b")));
//! assert_eq!(client.hits("http://fast"), 0);
//! ```

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::client::{HttpClient, HttpReply};
use crate::error::{CallError, CallResult};

/// A canned answer for one URL.
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    delay: Duration,
    result: CallResult<HttpReply>,
}

impl ScriptedReply {
    /// Answers immediately.
    pub fn now(reply: HttpReply) -> Self {
        Self::after(Duration::ZERO, reply)
    }

    /// Answers after `delay`.
    pub fn after(delay: Duration, reply: HttpReply) -> Self {
        Self {
            delay,
            result: Ok(reply),
        }
    }

    /// Fails with `error` after `delay`.
    pub fn fail(delay: Duration, error: CallError) -> Self {
        Self {
            delay,
            result: Err(error),
        }
    }

    /// Never answers within any reasonable deadline.
    pub fn hang() -> Self {
        Self::fail(Duration::from_secs(24 * 60 * 60), CallError::transport("hung"))
    }
}

/// An [`HttpClient`] that replays scripted replies per URL.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    routes: HashMap<String, ScriptedReply>,
    hits: Mutex<HashMap<String, usize>>,
}

impl ScriptedHttpClient {
    /// Creates a client with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the reply for `url`.
    #[must_use]
    pub fn route(mut self, url: impl Into<String>, reply: ScriptedReply) -> Self {
        self.routes.insert(url.into(), reply);
        self
    }

    /// Number of requests received for `url`.
    #[must_use]
    pub fn hits(&self, url: &str) -> usize {
        self.hits.lock().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn get(&self, url: &str, _deadline: Option<Instant>) -> CallResult<HttpReply> {
        *self.hits.lock().entry(url.to_string()).or_insert(0) += 1;

        let Some(reply) = self.routes.get(url).cloned() else {
            return Err(CallError::transport(format!("no route for {url}")));
        };

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.result
    }
}
