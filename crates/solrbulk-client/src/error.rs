//! Error types for the Solr client.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single HTTP round trip.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection refused or reset, timeout, or a broken body stream.
    /// Worth retrying.
    #[error("Transient network error: {0}")]
    Transient(String),

    /// The request could not be built or sent for a reason retries won't fix
    #[error("Request error: {0}")]
    Request(String),
}

impl TransportError {
    pub fn is_transient(&self) -> bool {
        matches!(self, TransportError::Transient(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() || err.is_request() || err.is_body() {
            TransportError::Transient(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Errors returned by [`crate::SolrClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP client could not be constructed
    #[error("Invalid client configuration: {0}")]
    Config(String),

    /// Non-retryable transport failure
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Transient failures persisted for every allowed attempt
    #[error("Giving up on {url} after {attempts} attempts: {source}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The server answered a submission with a non-2xx status
    #[error("Update rejected by {url}: HTTP {status}: {body}")]
    Rejected {
        url: String,
        status: u16,
        body: String,
        /// Where the rejected payload was written, if the dump succeeded
        dump: Option<PathBuf>,
    },

    /// The request was abandoned because the pipeline is shutting down
    #[error("Request cancelled")]
    Cancelled,
}
