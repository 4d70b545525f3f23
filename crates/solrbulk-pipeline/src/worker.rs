//! Batch accumulator.
//!
//! Each worker owns its pending batch exclusively. A full batch is moved
//! out and submitted while a fresh one starts filling, so no buffer is ever
//! shared with a request in flight.

use std::mem;

use async_channel::Receiver;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use solrbulk_client::{ClientError, SolrClient};
use solrbulk_types::Batch;

use crate::error::PipelineError;

/// Counters for one worker's run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    /// Documents received from the queue
    pub documents: u64,
    /// Batches submitted
    pub batches: u64,
}

impl WorkerStats {
    pub fn merge(&mut self, other: &WorkerStats) {
        self.documents += other.documents;
        self.batches += other.batches;
    }
}

/// One consumer of the shared document queue.
pub struct Worker {
    name: String,
    queue: Receiver<String>,
    client: SolrClient,
    batch_size: usize,
    verbose: bool,
    cancel: CancellationToken,
}

impl Worker {
    pub fn new(
        id: usize,
        queue: Receiver<String>,
        client: SolrClient,
        cancel: CancellationToken,
    ) -> Self {
        let batch_size = client.options().batch_size.max(1);
        let verbose = client.options().verbose;
        Self {
            name: format!("worker-{}", id),
            queue,
            client,
            batch_size,
            verbose,
            cancel,
        }
    }

    /// Run on the tokio runtime. A failure cancels `cancel` so the rest of
    /// the pipeline stops too.
    pub fn spawn(self) -> JoinHandle<Result<WorkerStats, PipelineError>> {
        tokio::spawn(async move {
            let cancel = self.cancel.clone();
            let result = self.run().await;
            if let Err(e) = &result {
                if !e.is_cancelled() {
                    cancel.cancel();
                }
            }
            result
        })
    }

    /// Consume documents until the queue is closed and drained, submitting
    /// every `batch_size` documents and once more for the remainder.
    pub async fn run(self) -> Result<WorkerStats, PipelineError> {
        let mut stats = WorkerStats::default();
        let mut pending = Batch::with_capacity(self.batch_size);

        debug!(worker = %self.name, "Worker started");

        loop {
            let received = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(PipelineError::Cancelled),
                received = self.queue.recv() => received,
            };

            // recv fails only once the queue is closed and empty
            let Ok(doc) = received else {
                break;
            };

            pending.push(doc);
            stats.documents += 1;

            if pending.len() >= self.batch_size {
                let batch = mem::replace(&mut pending, Batch::with_capacity(self.batch_size));
                self.flush(batch, &mut stats).await?;
            }
        }

        if !pending.is_empty() {
            self.flush(pending, &mut stats).await?;
        }

        debug!(
            worker = %self.name,
            docs = stats.documents,
            batches = stats.batches,
            "Worker finished"
        );
        Ok(stats)
    }

    async fn flush(&self, batch: Batch, stats: &mut WorkerStats) -> Result<(), PipelineError> {
        self.client.submit(batch).await.map_err(|source| match source {
            ClientError::Cancelled => PipelineError::Cancelled,
            source => PipelineError::Submission {
                worker: self.name.clone(),
                source,
            },
        })?;
        stats.batches += 1;

        if self.verbose {
            info!(worker = %self.name, docs = stats.documents, "Batch indexed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use solrbulk_client::MockTransport;
    use solrbulk_types::{Options, RetryOptions};

    fn setup(batch_size: usize, mock: Arc<MockTransport>) -> SolrClient {
        let options = Options::new("http://localhost:8983/solr")
            .with_batch_size(batch_size)
            .with_retry(RetryOptions {
                max_retries: 2,
                wait: Duration::from_millis(1),
                ..Default::default()
            });
        SolrClient::with_transport(Arc::new(options), mock)
    }

    async fn run_worker(docs: usize, batch_size: usize) -> (WorkerStats, Arc<MockTransport>) {
        let mock = Arc::new(MockTransport::new());
        let client = setup(batch_size, mock.clone());
        let (tx, rx) = async_channel::unbounded();
        for i in 0..docs {
            tx.send(format!(r#"{{"id":"{}"}}"#, i)).await.unwrap();
        }
        tx.close();

        let stats = Worker::new(0, rx, client, CancellationToken::new())
            .run()
            .await
            .unwrap();
        (stats, mock)
    }

    #[tokio::test]
    async fn test_full_batches_and_remainder() {
        let (stats, mock) = run_worker(25, 10).await;

        assert_eq!(stats.documents, 25);
        assert_eq!(stats.batches, 3);
        let sizes: Vec<usize> = mock.posted_batches().iter().map(|b| b.len()).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
    }

    #[tokio::test]
    async fn test_exact_multiple_has_no_empty_tail() {
        let (stats, mock) = run_worker(20, 10).await;

        assert_eq!(stats.batches, 2);
        assert_eq!(mock.attempts(), 2);
    }

    #[tokio::test]
    async fn test_empty_queue_submits_nothing() {
        let (stats, mock) = run_worker(0, 10).await;

        assert_eq!(stats, WorkerStats::default());
        assert_eq!(mock.attempts(), 0);
    }

    #[tokio::test]
    async fn test_order_preserved_within_worker() {
        let (_, mock) = run_worker(7, 3).await;

        let ids: Vec<String> = mock
            .posted_batches()
            .into_iter()
            .flatten()
            .map(|doc| doc["id"].as_str().unwrap().to_string())
            .collect();
        let expected: Vec<String> = (0..7).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_rejection_fails_worker() {
        let dumps = tempfile::TempDir::new().unwrap();
        let mock = Arc::new(MockTransport::new().with_post_status(400, "bad doc"));
        let options = Options::new("http://localhost:8983/solr")
            .with_batch_size(2)
            .with_dump_dir(dumps.path());
        let client = SolrClient::with_transport(Arc::new(options), mock.clone());
        let (tx, rx) = async_channel::unbounded();
        tx.send(r#"{"id":"1"}"#.to_string()).await.unwrap();
        tx.send(r#"{"id":"2"}"#.to_string()).await.unwrap();
        tx.close();

        let cancel = CancellationToken::new();
        let result = Worker::new(4, rx, client, cancel.clone()).spawn().await.unwrap();

        match result {
            Err(PipelineError::Submission { worker, source }) => {
                assert_eq!(worker, "worker-4");
                assert!(matches!(source, ClientError::Rejected { status: 400, .. }));
            }
            other => panic!("Expected Submission error, got {:?}", other),
        }
        assert!(cancel.is_cancelled(), "failure should cancel the pipeline");
    }

    #[tokio::test]
    async fn test_cancelled_worker_stops_waiting() {
        let mock = Arc::new(MockTransport::new());
        let client = setup(10, mock);
        let (_tx, rx) = async_channel::unbounded::<String>();
        let cancel = CancellationToken::new();

        let handle = Worker::new(0, rx, client, cancel.clone()).spawn();
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }
}
