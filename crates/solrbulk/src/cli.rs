//! CLI argument parsing for solrbulk.
//!
//! Flags override the config file and `SOLRBULK_*` environment variables.

use std::path::PathBuf;

use clap::Parser;

use solrbulk_types::{RetryStrategy, Settings};

/// Bulk load newline-delimited JSON documents into Solr
///
/// Reads FILE, or standard input when FILE is missing or `-`.
#[derive(Parser, Debug)]
#[command(name = "solrbulk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input file with one JSON document per line
    pub file: Option<PathBuf>,

    /// Path to config file (overrides default <config dir>/solrbulk/config.toml)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// URL of the Solr server, including host, port and path to the collection
    #[arg(short, long)]
    pub server: Option<String>,

    /// Solr host (deprecated, use --server)
    #[arg(long)]
    pub host: Option<String>,

    /// Solr port (deprecated, use --server)
    #[arg(long)]
    pub port: Option<u16>,

    /// Solr core or collection (deprecated, use --server)
    #[arg(long)]
    pub collection: Option<String>,

    /// Path of the update request handler
    #[arg(long, alias = "update-request-handler-name")]
    pub update_handler: Option<String>,

    /// Documents per request
    #[arg(long = "size")]
    pub batch_size: Option<usize>,

    /// Commit after this many documents
    #[arg(long)]
    pub commit: Option<u64>,

    /// Number of workers (default: available parallelism)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Log per-worker progress and a final summary
    #[arg(long)]
    pub verbose: bool,

    /// Decompress gzip input on the fly
    #[arg(short = 'z', long)]
    pub gzip: bool,

    /// Remove matching documents before indexing
    #[arg(long, alias = "reset")]
    pub purge: bool,

    /// Query selecting the documents to purge
    #[arg(long)]
    pub purge_query: Option<String>,

    /// Pause after purging, in milliseconds
    #[arg(long)]
    pub purge_pause_ms: Option<u64>,

    /// Do not commit after the last batch
    #[arg(long)]
    pub no_final_commit: bool,

    /// Optimize the index after loading
    #[arg(long)]
    pub optimize: bool,

    /// Basic auth credential as user:password
    #[arg(long)]
    pub auth: Option<String>,

    /// Maximum attempts per request on network errors
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Base wait between retries, in milliseconds
    #[arg(long)]
    pub retry_wait_ms: Option<u64>,

    /// Retry backoff: linear or exponential
    #[arg(long)]
    pub retry_strategy: Option<RetryStrategy>,

    /// Per-request timeout, in seconds
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// Abort the whole run after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Documents buffered between the reader and the workers
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Directory for payloads of rejected batches
    #[arg(long)]
    pub dump_dir: Option<String>,
}

impl Cli {
    /// Apply flags on top of loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(server) = &self.server {
            settings.server = Some(server.clone());
        }
        if let Some(host) = &self.host {
            settings.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(collection) = &self.collection {
            settings.collection = Some(collection.clone());
        }
        if let Some(handler) = &self.update_handler {
            settings.update_handler = handler.clone();
        }
        if let Some(size) = self.batch_size {
            settings.batch_size = size;
        }
        if let Some(commit) = self.commit {
            settings.commit_interval = commit;
        }
        if let Some(workers) = self.workers {
            settings.workers = Some(workers);
        }
        if let Some(query) = &self.purge_query {
            settings.purge_query = query.clone();
        }
        if let Some(pause) = self.purge_pause_ms {
            settings.purge_pause_ms = pause;
        }
        if let Some(auth) = &self.auth {
            settings.basic_auth = Some(auth.clone());
        }
        if let Some(max_retries) = self.max_retries {
            settings.max_retries = max_retries;
        }
        if let Some(wait) = self.retry_wait_ms {
            settings.retry_wait_ms = wait;
        }
        if let Some(strategy) = self.retry_strategy {
            settings.retry_strategy = strategy;
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout_secs = timeout;
        }
        if let Some(capacity) = self.queue_capacity {
            settings.queue_capacity = Some(capacity);
        }
        if let Some(dir) = &self.dump_dir {
            settings.dump_dir = Some(dir.clone());
        }
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }

        // Switches only turn things on; a config file may already have.
        settings.verbose |= self.verbose;
        settings.gzip |= self.gzip;
        settings.purge |= self.purge;
        settings.no_final_commit |= self.no_final_commit;
        settings.optimize |= self.optimize;
    }
}
