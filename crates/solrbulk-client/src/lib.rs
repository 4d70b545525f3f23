//! HTTP client for Solr update handlers.
//!
//! ## Key Components
//!
//! - [`Transport`]: one HTTP round trip, no retries. [`HttpTransport`] uses
//!   reqwest; [`MockTransport`] records requests for tests.
//! - [`SolrClient`]: retries transient transport errors with backoff and
//!   exposes submit, commit, delete-by-query and optimize.
//! - [`ClientError`]: what callers see once retries are exhausted or the
//!   server rejected a request.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use solrbulk_client::SolrClient;
//! use solrbulk_types::{Batch, Options};
//!
//! let options = Arc::new(Options::new("http://localhost:8983/solr/biblio"));
//! let client = SolrClient::new(options)?;
//! client.submit(Batch::from(vec![r#"{"id":"1"}"#.to_string()])).await?;
//! client.commit().await?;
//! ```

pub mod client;
pub mod dump;
pub mod error;
pub mod mock;
pub mod retry;
pub mod transport;

pub use client::SolrClient;
pub use dump::dump_payload;
pub use error::{ClientError, TransportError};
pub use mock::MockTransport;
pub use retry::{backoff_for, LinearBackoff};
pub use transport::{HttpTransport, Method, Transport, UpdateRequest, UpdateResponse};
