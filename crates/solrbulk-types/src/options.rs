//! Resolved, immutable options shared by every pipeline component.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::settings::Settings;

/// How the wait between retries grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetryStrategy {
    /// wait, 2 * wait, 3 * wait, ...
    Linear,
    /// wait, roughly doubling each attempt, with jitter
    #[default]
    Exponential,
}

impl fmt::Display for RetryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryStrategy::Linear => write!(f, "linear"),
            RetryStrategy::Exponential => write!(f, "exponential"),
        }
    }
}

impl FromStr for RetryStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(RetryStrategy::Linear),
            "exponential" | "exp" => Ok(RetryStrategy::Exponential),
            other => Err(format!(
                "unknown retry strategy '{}', expected linear or exponential",
                other
            )),
        }
    }
}

/// Retry policy for transient network errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryOptions {
    /// Upper bound on attempts per request, including the first one
    pub max_retries: u32,
    /// Base interval the strategy grows from
    pub wait: Duration,
    pub strategy: RetryStrategy,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 10,
            wait: Duration::from_secs(1),
            strategy: RetryStrategy::default(),
        }
    }
}

/// Basic auth credential attached to every request.
///
/// Held verbatim, usually `user:password`. A value without a colon is sent
/// as is, not as a username with an empty password.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub credential: SecretString,
}

impl BasicAuth {
    pub fn new(credential: &str) -> Self {
        Self {
            credential: SecretString::from(credential.to_string()),
        }
    }
}

/// Delete-by-query issued before indexing starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeOptions {
    pub query: String,
    /// Sleep after the purge commit so the deletion settles
    pub pause: Duration,
}

impl Default for PurgeOptions {
    fn default() -> Self {
        Self {
            query: "*:*".to_string(),
            pause: Duration::from_secs(2),
        }
    }
}

/// Validated options for a bulk load.
///
/// Built once before the pipeline starts and never mutated afterwards;
/// components share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Options {
    /// Server URL without trailing slash, e.g. `http://localhost:8983/solr/biblio`
    pub server: String,
    /// Update handler path with leading slash, e.g. `/update`
    pub update_handler: String,
    pub batch_size: usize,
    pub commit_interval: u64,
    pub workers: usize,
    pub verbose: bool,
    pub basic_auth: Option<BasicAuth>,
    pub purge: Option<PurgeOptions>,
    pub final_commit: bool,
    pub optimize: bool,
    pub retry: RetryOptions,
    pub request_timeout: Duration,
    pub queue_capacity: Option<usize>,
    pub dump_dir: Option<PathBuf>,
}

/// Available hardware parallelism, at least one.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Prepend `http://` when no scheme is given and drop trailing slashes.
fn normalize_server(server: &str) -> String {
    let server = server.trim().trim_end_matches('/');
    if server.starts_with("http") {
        server.to_string()
    } else {
        format!("http://{}", server)
    }
}

fn normalize_handler(handler: &str) -> String {
    let handler = handler.trim();
    if handler.starts_with('/') {
        handler.to_string()
    } else {
        format!("/{}", handler)
    }
}

impl Options {
    /// Options with defaults for everything but the server.
    pub fn new(server: impl AsRef<str>) -> Self {
        Self {
            server: normalize_server(server.as_ref()),
            update_handler: "/update".to_string(),
            batch_size: 1000,
            commit_interval: 1_000_000,
            workers: default_workers(),
            verbose: false,
            basic_auth: None,
            purge: None,
            final_commit: true,
            optimize: false,
            retry: RetryOptions::default(),
            request_timeout: Duration::from_secs(60),
            queue_capacity: None,
            dump_dir: None,
        }
    }

    /// Validate settings and resolve them into options.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let server = settings.server_url();
        let explicit = settings
            .server
            .as_deref()
            .is_some_and(|s| !s.trim().is_empty());
        if !explicit && settings.host.trim().is_empty() {
            return Err(ConfigError::invalid("server", "no server URL or host given"));
        }
        if settings.batch_size == 0 {
            return Err(ConfigError::invalid("batch_size", "must be > 0"));
        }
        if settings.commit_interval == 0 {
            return Err(ConfigError::invalid("commit_interval", "must be > 0"));
        }
        if settings.workers == Some(0) {
            return Err(ConfigError::invalid("workers", "must be > 0"));
        }
        if settings.max_retries == 0 {
            return Err(ConfigError::invalid("max_retries", "must be >= 1"));
        }
        if settings.queue_capacity == Some(0) {
            return Err(ConfigError::invalid("queue_capacity", "must be > 0"));
        }
        if settings.update_handler.trim().is_empty() {
            return Err(ConfigError::invalid("update_handler", "must not be empty"));
        }

        let purge = settings.purge.then(|| PurgeOptions {
            query: settings.purge_query.clone(),
            pause: Duration::from_millis(settings.purge_pause_ms),
        });

        Ok(Self {
            server: normalize_server(&server),
            update_handler: normalize_handler(&settings.update_handler),
            batch_size: settings.batch_size,
            commit_interval: settings.commit_interval,
            workers: settings.workers.unwrap_or_else(default_workers),
            verbose: settings.verbose,
            basic_auth: settings
                .basic_auth
                .as_deref()
                .filter(|c| !c.is_empty())
                .map(BasicAuth::new),
            purge,
            final_commit: !settings.no_final_commit,
            optimize: settings.optimize,
            retry: RetryOptions {
                max_retries: settings.max_retries,
                wait: Duration::from_millis(settings.retry_wait_ms),
                strategy: settings.retry_strategy,
            },
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
            queue_capacity: settings.queue_capacity,
            dump_dir: settings.dump_dir.as_ref().map(PathBuf::from),
        })
    }

    /// Full URL of the update handler.
    pub fn update_url(&self) -> String {
        format!("{}{}", self.server, self.update_handler)
    }

    /// Capacity of the hand-off queue between reader and workers.
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.workers * 2).max(1)
    }

    pub fn with_update_handler(mut self, handler: impl AsRef<str>) -> Self {
        self.update_handler = normalize_handler(handler.as_ref());
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_commit_interval(mut self, interval: u64) -> Self {
        self.commit_interval = interval;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_basic_auth(mut self, credential: &str) -> Self {
        self.basic_auth = Some(BasicAuth::new(credential));
        self
    }

    pub fn with_purge(mut self, purge: PurgeOptions) -> Self {
        self.purge = Some(purge);
        self
    }

    pub fn with_final_commit(mut self, final_commit: bool) -> Self {
        self.final_commit = final_commit;
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }

    pub fn with_retry(mut self, retry: RetryOptions) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    pub fn with_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_dir = Some(dir.into());
        self
    }
}
