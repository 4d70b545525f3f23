//! One complete load: purge, dispatch, final commit, optimize.

use std::time::{Duration, Instant};

use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use solrbulk_client::SolrClient;

use crate::coordinator::Coordinator;
use crate::dispatcher::Dispatcher;
use crate::error::PipelineError;

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    /// Documents handed to the workers
    pub documents: u64,
    /// Blank lines dropped from the input
    pub skipped: u64,
    /// Batches accepted by the server
    pub batches: u64,
    pub periodic_commits: u64,
    pub purged: bool,
    pub final_commit: bool,
    pub optimized: bool,
    pub workers: usize,
    /// From the first document read to the end of the final commit
    pub elapsed: Duration,
}

impl PipelineReport {
    pub fn docs_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.documents as f64 / secs
        } else {
            0.0
        }
    }
}

/// Load every line of `reader` through `client`.
///
/// Cancelling `cancel` aborts in-flight requests, backoff sleeps and the
/// purge pause, and the run returns [`PipelineError::Cancelled`]. Failures
/// inside the pipeline stop it through a child token, so `cancel` itself is
/// never cancelled here.
pub async fn run_pipeline<R>(
    client: SolrClient,
    reader: R,
    cancel: CancellationToken,
) -> Result<PipelineReport, PipelineError>
where
    R: AsyncBufRead + Unpin,
{
    let abort = cancel.child_token();
    let client = client.with_cancellation(abort.clone());

    let result = load(client, reader, abort).await;
    if let Err(e) = &result {
        if e.is_cancelled() {
            info!("Pipeline cancelled");
        } else {
            error!(error = %e, "Pipeline failed");
        }
    }
    result
}

async fn load<R>(
    client: SolrClient,
    reader: R,
    abort: CancellationToken,
) -> Result<PipelineReport, PipelineError>
where
    R: AsyncBufRead + Unpin,
{
    let options = client.options();
    let (workers, verbose) = (options.workers.max(1), options.verbose);
    let (final_commit, optimize) = (options.final_commit, options.optimize);
    let coordinator = Coordinator::new(client.clone(), abort.clone());

    let purged = coordinator.purge().await?;

    let start = Instant::now();
    let dispatch = Dispatcher::new(client.clone(), abort).dispatch(reader).await?;

    if final_commit {
        coordinator.final_commit().await?;
    }

    let mut report = PipelineReport {
        documents: dispatch.documents,
        skipped: dispatch.skipped,
        batches: dispatch.workers.batches,
        periodic_commits: dispatch.periodic_commits,
        purged,
        final_commit,
        optimized: false,
        workers,
        elapsed: start.elapsed(),
    };

    if verbose {
        info!(
            "{} docs in {:?} at {:.3} docs/s with {} workers",
            report.documents,
            report.elapsed,
            report.docs_per_second(),
            workers
        );
    }

    if optimize {
        coordinator.optimize().await?;
        report.optimized = true;
        if verbose {
            info!(elapsed = ?start.elapsed(), "Indexed and optimized");
        }
    }

    Ok(report)
}
