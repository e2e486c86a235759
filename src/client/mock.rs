//! Mock transport for testing
//!
//! Scripted replies without a network. Queued replies are consumed first,
//! then the fallback reply answers every remaining call.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{ApiRequest, RawResponse, Transport};
use crate::error::ApiError;

/// One scripted answer
#[derive(Debug, Clone)]
struct MockReply {
    delay: Option<Duration>,
    outcome: Result<RawResponse, ApiError>,
}

impl MockReply {
    fn response(status: u16, body: &str) -> Self {
        Self {
            delay: None,
            outcome: Ok(RawResponse {
                status,
                body: body.to_string(),
            }),
        }
    }
}

/// Mock transport for testing.
///
/// # Example
/// ```ignore
/// let mock = MockTransport::new()
///     .then_reply(500, "down")
///     .with_reply(200, r#"{"ok":true,"result":[]}"#);
/// ```
pub struct MockTransport {
    /// Replies consumed in order before the fallback
    queue: Mutex<VecDeque<MockReply>>,
    /// Reply used once the queue is empty
    fallback: Mutex<MockReply>,
    /// Number of `send` calls
    calls: AtomicUsize,
    /// Captured requests for test assertions
    requests: Mutex<Vec<ApiRequest>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(MockReply::response(200, r#"{"ok":true,"result":null}"#)),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl MockTransport {
    /// Create a mock answering `{"ok":true,"result":null}` to everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback reply
    pub fn with_reply(self, status: u16, body: &str) -> Self {
        *self.fallback.lock().unwrap() = MockReply::response(status, body);
        self
    }

    /// Make the fallback a transport-level failure
    pub fn with_failure(self, error: ApiError) -> Self {
        self.fallback.lock().unwrap().outcome = Err(error);
        self
    }

    /// Delay every fallback reply
    pub fn with_delay(self, delay: Duration) -> Self {
        self.fallback.lock().unwrap().delay = Some(delay);
        self
    }

    /// Queue a one-shot reply
    pub fn then_reply(self, status: u16, body: &str) -> Self {
        self.queue
            .lock()
            .unwrap()
            .push_back(MockReply::response(status, body));
        self
    }

    /// Queue a one-shot reply that arrives after `delay`
    pub fn then_reply_after(self, delay: Duration, status: u16, body: &str) -> Self {
        let mut reply = MockReply::response(status, body);
        reply.delay = Some(delay);
        self.queue.lock().unwrap().push_back(reply);
        self
    }

    /// Number of requests sent so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// All requests sent so far
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Bodies of the POST requests sent so far, parsed as JSON
    pub fn posted_bodies(&self) -> Vec<serde_json::Value> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                ApiRequest::Post { body, .. } => serde_json::from_str(&body).ok(),
                ApiRequest::Get { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        let reply = {
            let queued = self.queue.lock().unwrap().pop_front();
            queued.unwrap_or_else(|| self.fallback.lock().unwrap().clone())
        };

        if let Some(delay) = reply.delay {
            tokio::time::sleep(delay).await;
        }
        reply.outcome
    }
}
