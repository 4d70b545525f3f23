//! Concurrent batching and submission pipeline.
//!
//! ## Key Components
//!
//! - [`Worker`]: drains the shared queue into fixed-size batches and submits them
//! - [`Dispatcher`]: reads input lines, feeds the queue, issues periodic commits,
//!   then closes the queue and joins the workers
//! - [`Coordinator`]: purge, commit and optimize requests around the hot path
//! - [`run_pipeline`]: the whole job, purge to optimize
//!
//! ## Architecture
//!
//! 1. Purge runs first, if configured, followed by a pause
//! 2. N workers start, all receiving from one queue
//! 3. The dispatcher pushes every non-blank line and commits every
//!    `commit_interval` documents
//! 4. At end of input the queue closes; workers flush partial batches
//! 5. A final commit (unless suppressed) and an optional optimize follow
//!
//! The first failure anywhere cancels the rest of the pipeline and is the
//! error returned.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use solrbulk_client::SolrClient;
//! use solrbulk_pipeline::run_pipeline;
//! use solrbulk_types::Options;
//! use tokio_util::sync::CancellationToken;
//!
//! let options = Arc::new(Options::new("http://localhost:8983/solr/biblio"));
//! let client = SolrClient::new(options)?;
//! let input = tokio::io::BufReader::new(tokio::fs::File::open("docs.ndjson").await?);
//! let report = run_pipeline(client, input, CancellationToken::new()).await?;
//! println!("{} docs at {:.0} docs/s", report.documents, report.docs_per_second());
//! ```

pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod pipeline;
pub mod worker;

pub use coordinator::Coordinator;
pub use dispatcher::{DispatchReport, Dispatcher};
pub use error::PipelineError;
pub use pipeline::{run_pipeline, PipelineReport};
pub use worker::{Worker, WorkerStats};
