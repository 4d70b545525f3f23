//! In-memory transport for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::transport::{Method, Transport, UpdateRequest, UpdateResponse};

const OK_BODY: &str = r#"{"responseHeader":{"status":0,"QTime":1}}"#;

#[derive(Debug, Clone)]
enum Reply {
    Respond(UpdateResponse),
    Fail(TransportError),
}

/// Transport that records every request and replies from a script.
///
/// Scripted replies are consumed first, in order. After that, POST requests
/// get the configured submission reply and everything else gets the
/// default reply, which is a 200 unless changed.
pub struct MockTransport {
    requests: Mutex<Vec<UpdateRequest>>,
    script: Mutex<VecDeque<Reply>>,
    default_reply: UpdateResponse,
    post_reply: Option<UpdateResponse>,
    delay: Option<Duration>,
}

impl MockTransport {
    /// A transport that accepts everything with HTTP 200.
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            default_reply: UpdateResponse::new(200, OK_BODY),
            post_reply: None,
            delay: None,
        }
    }

    /// Answer every unscripted request with `status`.
    pub fn with_status(mut self, status: u16, body: impl Into<String>) -> Self {
        self.default_reply = UpdateResponse::new(status, body);
        self
    }

    /// Answer unscripted document submissions (POSTs) with `status`.
    pub fn with_post_status(mut self, status: u16, body: impl Into<String>) -> Self {
        self.post_reply = Some(UpdateResponse::new(status, body));
        self
    }

    /// Fail the next `times` requests with a transient error.
    pub fn fail_transiently(self, times: usize) -> Self {
        {
            let mut script = self.lock_script();
            for i in 0..times {
                script.push_back(Reply::Fail(TransportError::Transient(format!(
                    "connection reset by peer (scripted failure {})",
                    i + 1
                ))));
            }
        }
        self
    }

    /// Answer the next unanswered scripted slot with `status`.
    pub fn then_respond(self, status: u16, body: impl Into<String>) -> Self {
        self.lock_script()
            .push_back(Reply::Respond(UpdateResponse::new(status, body)));
        self
    }

    /// Fail the next request with a non-retryable error.
    pub fn fail_permanently(self, message: impl Into<String>) -> Self {
        self.lock_script()
            .push_back(Reply::Fail(TransportError::Request(message.into())));
        self
    }

    /// Sleep before answering each request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All requests seen so far, in arrival order.
    pub fn requests(&self) -> Vec<UpdateRequest> {
        self.lock_requests().clone()
    }

    /// Number of round trips attempted, retries included.
    pub fn attempts(&self) -> usize {
        self.lock_requests().len()
    }

    /// Number of commit requests seen.
    pub fn commits(&self) -> usize {
        self.lock_requests().iter().filter(|r| r.is_commit()).count()
    }

    /// Documents of every POSTed batch, parsed back from the request bodies.
    ///
    /// Bodies that are not a JSON array are skipped.
    pub fn posted_batches(&self) -> Vec<Vec<serde_json::Value>> {
        self.lock_requests()
            .iter()
            .filter(|r| r.method == Method::Post)
            .filter_map(|r| r.body.as_deref())
            .filter_map(|body| serde_json::from_str(body).ok())
            .collect()
    }

    /// Total number of documents across all POSTed batches.
    pub fn posted_documents(&self) -> usize {
        self.posted_batches().iter().map(|b| b.len()).sum()
    }

    fn lock_requests(&self) -> std::sync::MutexGuard<'_, Vec<UpdateRequest>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Reply>> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &UpdateRequest) -> Result<UpdateResponse, TransportError> {
        self.lock_requests().push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.lock_script().pop_front();
        match scripted {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(err)) => Err(err),
            None => match (&self.post_reply, request.method) {
                (Some(reply), Method::Post) => Ok(reply.clone()),
                _ => Ok(self.default_reply.clone()),
            },
        }
    }
}
