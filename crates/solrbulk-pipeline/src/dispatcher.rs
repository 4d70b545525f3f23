//! Input fan-out to the worker pool.

use async_channel::Sender;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use solrbulk_client::SolrClient;
use solrbulk_types::normalize_line;

use crate::coordinator::Coordinator;
use crate::error::{record_failure, PipelineError};
use crate::worker::{Worker, WorkerStats};

/// What one dispatch pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Non-blank lines pushed onto the queue
    pub documents: u64,
    /// Blank or whitespace-only lines dropped
    pub skipped: u64,
    /// Commits issued every `commit_interval` documents
    pub periodic_commits: u64,
    /// Totals over all workers
    pub workers: WorkerStats,
}

/// Reads lines, feeds the shared queue and triggers periodic commits.
///
/// The document counter lives here only. It counts documents handed to the
/// queue, not documents the server has accepted.
pub struct Dispatcher {
    client: SolrClient,
    coordinator: Coordinator,
    cancel: CancellationToken,
}

impl Dispatcher {
    pub fn new(client: SolrClient, cancel: CancellationToken) -> Self {
        let coordinator = Coordinator::new(client.clone(), cancel.clone());
        Self {
            client,
            coordinator,
            cancel,
        }
    }

    /// Start the workers, stream `reader` into them, then close the queue and
    /// join every worker.
    ///
    /// The first failure cancels the token handed to [`Dispatcher::new`] and
    /// is returned once all workers have stopped.
    pub async fn dispatch<R>(&self, reader: R) -> Result<DispatchReport, PipelineError>
    where
        R: AsyncBufRead + Unpin,
    {
        let options = self.client.options();
        let workers = options.workers.max(1);
        let (queue, receiver) = async_channel::bounded(options.queue_capacity());

        let handles: Vec<_> = (0..workers)
            .map(|id| {
                Worker::new(id, receiver.clone(), self.client.clone(), self.cancel.clone()).spawn()
            })
            .collect();
        drop(receiver);

        info!(
            workers,
            batch_size = options.batch_size,
            commit_interval = options.commit_interval,
            url = %options.update_url(),
            "Indexing started"
        );

        let mut report = DispatchReport::default();
        let mut failure = None;

        if let Err(e) = self.feed(reader, &queue, &mut report).await {
            if !e.is_cancelled() {
                self.cancel.cancel();
            }
            record_failure(&mut failure, e);
        }
        queue.close();

        for handle in handles {
            match handle.await {
                Ok(Ok(stats)) => report.workers.merge(&stats),
                Ok(Err(e)) => record_failure(&mut failure, e),
                Err(e) => {
                    self.cancel.cancel();
                    record_failure(&mut failure, PipelineError::WorkerPanicked(e.to_string()));
                }
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    async fn feed<R>(
        &self,
        reader: R,
        queue: &Sender<String>,
        report: &mut DispatchReport,
    ) -> Result<(), PipelineError>
    where
        R: AsyncBufRead + Unpin,
    {
        let commit_interval = self.client.options().commit_interval.max(1);
        let mut reader = reader;
        let mut buf = Vec::new();
        let mut line_no: u64 = 0;

        loop {
            buf.clear();
            let read = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(PipelineError::Cancelled),
                read = reader.read_until(b'\n', &mut buf) => read?,
            };
            if read == 0 {
                break;
            }
            line_no += 1;

            let mut line = match String::from_utf8(std::mem::take(&mut buf)) {
                Ok(line) => line,
                Err(e) => {
                    warn!(line = line_no, "Input line is not valid UTF-8, replacing invalid bytes");
                    String::from_utf8_lossy(e.as_bytes()).into_owned()
                }
            };

            let Some(len) = normalize_line(&line).map(str::len) else {
                report.skipped += 1;
                continue;
            };
            line.truncate(len);

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(PipelineError::Cancelled),
                sent = queue.send(line) => {
                    // every worker has exited; the join reports why
                    if sent.is_err() {
                        return Err(PipelineError::Cancelled);
                    }
                }
            }
            report.documents += 1;

            if report.documents % commit_interval == 0 {
                self.coordinator.periodic_commit(report.documents).await?;
                report.periodic_commits += 1;
            }
        }

        debug!(
            docs = report.documents,
            skipped = report.skipped,
            "End of input, closing queue"
        );
        Ok(())
    }
}
