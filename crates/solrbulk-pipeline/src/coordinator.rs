//! Purge, commit and optimize requests around the indexing hot path.
//!
//! Non-2xx answers to these requests are logged and tolerated; only a
//! transport failure (after retries) stops the pipeline.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use solrbulk_client::{ClientError, SolrClient, UpdateResponse};

use crate::error::PipelineError;

pub struct Coordinator {
    client: SolrClient,
    cancel: CancellationToken,
}

impl Coordinator {
    pub fn new(client: SolrClient, cancel: CancellationToken) -> Self {
        Self { client, cancel }
    }

    /// Delete documents matching the configured purge query, commit, then
    /// pause. Does nothing when purging is not configured.
    ///
    /// Returns whether a purge was issued.
    pub async fn purge(&self) -> Result<bool, PipelineError> {
        let Some(purge) = self.client.options().purge.clone() else {
            return Ok(false);
        };

        let response = self.client.delete_by_query(&purge.query).await;
        self.log("delete", &response);
        response.map_err(|e| PipelineError::lifecycle("purge", e))?;

        let response = self.client.stream_commit().await;
        self.log("purge commit", &response);
        response.map_err(|e| PipelineError::lifecycle("purge", e))?;

        info!(query = %purge.query, pause_ms = purge.pause.as_millis() as u64, "Index purged");
        self.pause(purge.pause).await?;
        Ok(true)
    }

    /// Commit issued by the dispatcher every `commit_interval` documents.
    ///
    /// Documents still sitting in a worker's partial batch are not covered.
    pub async fn periodic_commit(&self, docs: u64) -> Result<(), PipelineError> {
        if self.client.options().verbose {
            info!(docs, "Periodic commit");
        }
        let response = self.client.commit().await;
        self.log("commit", &response);
        response
            .map(|_| ())
            .map_err(|e| PipelineError::lifecycle("commit", e))
    }

    /// Commit once all workers have drained.
    pub async fn final_commit(&self) -> Result<(), PipelineError> {
        let response = self.client.commit().await;
        self.log("final commit", &response);
        response
            .map(|_| ())
            .map_err(|e| PipelineError::lifecycle("final commit", e))
    }

    /// Compact the index.
    pub async fn optimize(&self) -> Result<(), PipelineError> {
        let response = self.client.optimize().await;
        self.log("optimize", &response);
        response
            .map(|_| ())
            .map_err(|e| PipelineError::lifecycle("optimize", e))
    }

    async fn pause(&self, pause: Duration) -> Result<(), PipelineError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PipelineError::Cancelled),
            _ = tokio::time::sleep(pause) => Ok(()),
        }
    }

    fn log(&self, operation: &str, response: &Result<UpdateResponse, ClientError>) {
        let url = self.client.options().update_url();
        match response {
            Ok(r) if r.is_success() => info!(operation, status = r.status, url = %url, "Done"),
            Ok(r) => warn!(operation, status = r.status, url = %url, body = %r.body, "Server returned an error status"),
            Err(e) => warn!(operation, url = %url, error = %e, "Request failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Instant;

    use solrbulk_client::{MockTransport, Method};
    use solrbulk_types::{Options, PurgeOptions, RetryOptions};

    fn coordinator(options: Options, mock: Arc<MockTransport>) -> Coordinator {
        let options = options.with_retry(RetryOptions {
            max_retries: 2,
            wait: Duration::from_millis(1),
            ..Default::default()
        });
        let client = SolrClient::with_transport(Arc::new(options), mock);
        Coordinator::new(client, CancellationToken::new())
    }

    #[tokio::test]
    async fn test_purge_disabled_is_noop() {
        let mock = Arc::new(MockTransport::new());
        let coordinator = coordinator(Options::new("http://localhost:8983/solr"), mock.clone());

        assert!(!coordinator.purge().await.unwrap());
        assert_eq!(mock.attempts(), 0);
    }

    #[tokio::test]
    async fn test_purge_deletes_commits_and_pauses() {
        let mock = Arc::new(MockTransport::new());
        let options = Options::new("http://localhost:8983/solr").with_purge(PurgeOptions {
            pause: Duration::from_millis(50),
            ..Default::default()
        });
        let coordinator = coordinator(options, mock.clone());

        let start = Instant::now();
        assert!(coordinator.purge().await.unwrap());
        assert!(start.elapsed() >= Duration::from_millis(50));

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0].query_param("stream.body"),
            Some("<delete><query>*:*</query></delete>")
        );
        assert_eq!(requests[1].query_param("stream.body"), Some("<commit/>"));
    }

    #[tokio::test]
    async fn test_purge_pause_is_cancellable() {
        let mock = Arc::new(MockTransport::new());
        let options = Options::new("http://localhost:8983/solr").with_purge(PurgeOptions {
            pause: Duration::from_secs(60),
            ..Default::default()
        });
        let client = SolrClient::with_transport(Arc::new(options), mock);
        let cancel = CancellationToken::new();
        let coordinator = Coordinator::new(client, cancel.clone());

        cancel.cancel();
        let result = tokio::time::timeout(Duration::from_secs(5), coordinator.purge())
            .await
            .unwrap();
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[tokio::test]
    async fn test_commit_error_status_is_tolerated() {
        let mock = Arc::new(MockTransport::new().with_status(500, "busy"));
        let coordinator = coordinator(Options::new("http://localhost:8983/solr"), mock.clone());

        coordinator.periodic_commit(1000).await.unwrap();
        coordinator.final_commit().await.unwrap();
        coordinator.optimize().await.unwrap();
        assert_eq!(mock.attempts(), 3);
    }

    #[tokio::test]
    async fn test_commit_transport_failure_is_fatal() {
        let mock = Arc::new(MockTransport::new().fail_transiently(5));
        let coordinator = coordinator(Options::new("http://localhost:8983/solr"), mock.clone());

        let err = coordinator.final_commit().await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Lifecycle {
                operation: "final commit",
                source: ClientError::RetriesExhausted { .. }
            }
        ));
    }

    #[tokio::test]
    async fn test_optimize_request() {
        let mock = Arc::new(MockTransport::new());
        let coordinator = coordinator(Options::new("http://localhost:8983/solr"), mock.clone());

        coordinator.optimize().await.unwrap();
        let requests = mock.requests();
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].query_param("stream.body"), Some("<optimize/>"));
    }
}
