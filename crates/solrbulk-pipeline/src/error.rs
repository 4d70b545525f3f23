//! Error types for the pipeline.

use solrbulk_client::ClientError;
use thiserror::Error;

/// Errors that halt the pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A worker's batch could not be indexed
    #[error("{worker}: {source}")]
    Submission {
        worker: String,
        #[source]
        source: ClientError,
    },

    /// A purge, commit or optimize request failed
    #[error("{operation} failed: {source}")]
    Lifecycle {
        operation: &'static str,
        #[source]
        source: ClientError,
    },

    /// Reading the input failed
    #[error("Input error: {0}")]
    Input(#[from] std::io::Error),

    /// A worker task panicked or was aborted
    #[error("Worker task failed: {0}")]
    WorkerPanicked(String),

    /// The caller cancelled the run
    #[error("Pipeline cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Wrap a lifecycle request failure, keeping cancellation distinct.
    pub(crate) fn lifecycle(operation: &'static str, source: ClientError) -> Self {
        match source {
            ClientError::Cancelled => PipelineError::Cancelled,
            source => PipelineError::Lifecycle { operation, source },
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}

/// Keep the first real failure; a cancellation only fills an empty slot.
pub(crate) fn record_failure(slot: &mut Option<PipelineError>, err: PipelineError) {
    match slot {
        None => *slot = Some(err),
        Some(existing) if existing.is_cancelled() && !err.is_cancelled() => *slot = Some(err),
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::Submission {
            worker: "worker-3".to_string(),
            source: ClientError::Cancelled,
        };
        assert_eq!(err.to_string(), "worker-3: Request cancelled");

        let err = PipelineError::WorkerPanicked("boom".to_string());
        assert_eq!(err.to_string(), "Worker task failed: boom");
    }

    #[test]
    fn test_lifecycle_keeps_cancellation() {
        let err = PipelineError::lifecycle("commit", ClientError::Cancelled);
        assert!(err.is_cancelled());

        let err = PipelineError::lifecycle(
            "commit",
            ClientError::Config("bad".to_string()),
        );
        assert!(matches!(err, PipelineError::Lifecycle { operation: "commit", .. }));
    }

    #[test]
    fn test_record_failure_prefers_real_errors() {
        let mut slot = None;
        record_failure(&mut slot, PipelineError::Cancelled);
        record_failure(&mut slot, PipelineError::WorkerPanicked("first".to_string()));
        record_failure(&mut slot, PipelineError::WorkerPanicked("second".to_string()));

        match slot {
            Some(PipelineError::WorkerPanicked(msg)) => assert_eq!(msg, "first"),
            other => panic!("Expected first real failure, got {:?}", other),
        }
    }
}
