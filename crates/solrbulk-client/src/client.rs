//! Retrying client for the update handler.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use solrbulk_types::{Batch, Options};

use crate::dump::dump_payload;
use crate::error::ClientError;
use crate::retry::backoff_for;
use crate::transport::{HttpTransport, Transport, UpdateRequest, UpdateResponse};

/// Client for one Solr update handler.
///
/// Cheap to clone; clones share the transport and options. Every request,
/// whether a document submission or a commit, goes through the same retry
/// loop: transient transport errors are retried with backoff up to
/// `options.retry.max_retries` attempts, HTTP error statuses are not.
#[derive(Clone)]
pub struct SolrClient {
    transport: Arc<dyn Transport>,
    options: Arc<Options>,
    cancel: CancellationToken,
}

impl SolrClient {
    /// Create a client backed by reqwest.
    pub fn new(options: Arc<Options>) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(&options)?;
        Ok(Self::with_transport(options, Arc::new(transport)))
    }

    /// Create a client on top of any transport.
    pub fn with_transport(options: Arc<Options>, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight requests and backoff sleeps once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Index a batch of documents.
    ///
    /// Whitespace-only documents are dropped first; if nothing is left no
    /// request is made. On a non-2xx answer the payload is written to a dump
    /// file and [`ClientError::Rejected`] is returned. A successful return
    /// means the server accepted the batch, not that it was committed.
    pub async fn submit(&self, mut batch: Batch) -> Result<(), ClientError> {
        batch.retain_non_blank();
        if batch.is_empty() {
            return Ok(());
        }

        let url = self.options.update_url();
        let request = UpdateRequest::post_json(&url, batch.to_payload());
        let response = self.execute(&request).await?;

        if response.is_success() {
            debug!(docs = batch.len(), status = response.status, "Batch accepted");
            return Ok(());
        }

        let payload = request.body.as_deref().unwrap_or_default();
        let dump = match dump_payload(self.options.dump_dir.as_deref(), payload) {
            Ok(path) => {
                warn!(path = %path.display(), "Failed payload written");
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, "Failed to write failed request payload to debug file");
                None
            }
        };

        error!(
            url = %url,
            status = response.status,
            body = %response.body,
            "Batch rejected"
        );

        Err(ClientError::Rejected {
            url,
            status: response.status,
            body: response.body,
            dump,
        })
    }

    /// Ask the server to commit pending documents.
    pub async fn commit(&self) -> Result<UpdateResponse, ClientError> {
        let request = UpdateRequest::get(self.options.update_url()).with_query("commit", "true");
        self.execute(&request).await
    }

    /// Delete every document matching `query`. Not committed.
    pub async fn delete_by_query(&self, query: &str) -> Result<UpdateResponse, ClientError> {
        let request = UpdateRequest::get(self.options.update_url()).with_query(
            "stream.body",
            format!("<delete><query>{}</query></delete>", query),
        );
        self.execute(&request).await
    }

    /// Commit through a streamed `<commit/>` command.
    pub async fn stream_commit(&self) -> Result<UpdateResponse, ClientError> {
        let request =
            UpdateRequest::get(self.options.update_url()).with_query("stream.body", "<commit/>");
        self.execute(&request).await
    }

    /// Compact the index.
    pub async fn optimize(&self) -> Result<UpdateResponse, ClientError> {
        let request =
            UpdateRequest::get(self.options.update_url()).with_query("stream.body", "<optimize/>");
        self.execute(&request).await
    }

    /// Run a request through the retry loop.
    pub async fn execute(&self, request: &UpdateRequest) -> Result<UpdateResponse, ClientError> {
        let max_attempts = self.options.retry.max_retries.max(1);
        let mut backoff = backoff_for(&self.options.retry);
        let mut attempts = 0;

        loop {
            attempts += 1;
            debug!(attempt = attempts, url = %request.url, "Sending update request");

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
                result = self.transport.execute(request) => result,
            };

            let err = match result {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() => e,
                Err(e) => {
                    error!(error = %e, url = %request.display_url(), "Request failed");
                    return Err(ClientError::Transport(e));
                }
            };

            if attempts >= max_attempts {
                error!(error = %err, attempts, "Max retries exceeded");
                return Err(ClientError::RetriesExhausted {
                    url: request.display_url(),
                    attempts,
                    source: err,
                });
            }

            match backoff.next_backoff() {
                Some(duration) => {
                    warn!(
                        error = %err,
                        retry_in_ms = duration.as_millis() as u64,
                        "Update request failed, retrying"
                    );
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
                        _ = tokio::time::sleep(duration) => {}
                    }
                }
                None => {
                    error!(error = %err, "Backoff exhausted");
                    return Err(ClientError::RetriesExhausted {
                        url: request.display_url(),
                        attempts,
                        source: err,
                    });
                }
            }
        }
    }
}
