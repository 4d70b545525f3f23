//! Configuration loading for solrbulk.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `<config dir>/solrbulk/config.toml`.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::options::RetryStrategy;

/// Raw settings as read from config sources, before validation.
///
/// Turn into [`crate::Options`] with [`crate::Options::from_settings`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Full server URL including the core/collection path. Takes precedence
    /// over host, port and collection.
    #[serde(default)]
    pub server: Option<String>,

    /// Host used when no server URL is given
    #[serde(default = "default_host")]
    pub host: String,

    /// Port used when no server URL is given
    #[serde(default = "default_port")]
    pub port: u16,

    /// Core or collection used when no server URL is given
    #[serde(default)]
    pub collection: Option<String>,

    /// Path of the update request handler, relative to the server URL
    #[serde(default = "default_update_handler")]
    pub update_handler: String,

    /// Documents per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Documents between commit requests
    #[serde(default = "default_commit_interval")]
    pub commit_interval: u64,

    /// Worker count; defaults to the available parallelism
    #[serde(default)]
    pub workers: Option<usize>,

    /// Log per-worker progress and a final summary
    #[serde(default)]
    pub verbose: bool,

    /// Input is gzip compressed
    #[serde(default)]
    pub gzip: bool,

    /// Delete documents matching `purge_query` before indexing
    #[serde(default)]
    pub purge: bool,

    #[serde(default = "default_purge_query")]
    pub purge_query: String,

    /// Pause after purging, in milliseconds
    #[serde(default = "default_purge_pause_ms")]
    pub purge_pause_ms: u64,

    /// Skip the commit issued after all workers finished
    #[serde(default)]
    pub no_final_commit: bool,

    /// Optimize the index after the final commit
    #[serde(default)]
    pub optimize: bool,

    /// Basic auth credential as `user:password`
    #[serde(default)]
    pub basic_auth: Option<String>,

    /// Maximum attempts per request on transient network errors
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base wait between retries, in milliseconds
    #[serde(default = "default_retry_wait_ms")]
    pub retry_wait_ms: u64,

    #[serde(default)]
    pub retry_strategy: RetryStrategy,

    /// Per-request timeout, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Documents buffered between the reader and the workers
    #[serde(default)]
    pub queue_capacity: Option<usize>,

    /// Directory for payloads of rejected batches; defaults to the system temp dir
    #[serde(default)]
    pub dump_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8983
}

fn default_update_handler() -> String {
    "/update".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_commit_interval() -> u64 {
    1_000_000
}

fn default_purge_query() -> String {
    "*:*".to_string()
}

fn default_purge_pause_ms() -> u64 {
    2000
}

fn default_max_retries() -> u32 {
    10
}

fn default_retry_wait_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: None,
            host: default_host(),
            port: default_port(),
            collection: None,
            update_handler: default_update_handler(),
            batch_size: default_batch_size(),
            commit_interval: default_commit_interval(),
            workers: None,
            verbose: false,
            gzip: false,
            purge: false,
            purge_query: default_purge_query(),
            purge_pause_ms: default_purge_pause_ms(),
            no_final_commit: false,
            optimize: false,
            basic_auth: None,
            max_retries: default_max_retries(),
            retry_wait_ms: default_retry_wait_ms(),
            retry_strategy: RetryStrategy::default(),
            request_timeout_secs: default_request_timeout_secs(),
            queue_capacity: None,
            dump_dir: None,
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (`<config dir>/solrbulk/config.toml`)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (`SOLRBULK_*`, e.g. `SOLRBULK_BATCH_SIZE`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, ConfigError> {
        let config_dir = ProjectDirs::from("", "", "solrbulk")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("host", default_host())?
            .set_default("port", default_port() as i64)?
            .set_default("update_handler", default_update_handler())?
            .set_default("batch_size", default_batch_size() as i64)?
            .set_default("commit_interval", default_commit_interval() as i64)?
            .set_default("log_level", default_log_level())?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Double underscore separates nesting so that single underscores
        // inside key names survive: SOLRBULK_BATCH_SIZE -> batch_size.
        builder = builder.add_source(
            Environment::with_prefix("SOLRBULK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Server URL, either given directly or assembled from host, port and collection.
    pub fn server_url(&self) -> String {
        match &self.server {
            Some(server) if !server.trim().is_empty() => server.trim().to_string(),
            _ => match &self.collection {
                Some(collection) if !collection.is_empty() => {
                    format!("http://{}:{}/solr/{}", self.host, self.port, collection)
                }
                _ => format!("http://{}:{}/solr", self.host, self.port),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.batch_size, 1000);
        assert_eq!(settings.commit_interval, 1_000_000);
        assert_eq!(settings.update_handler, "/update");
        assert_eq!(settings.purge_query, "*:*");
        assert_eq!(settings.purge_pause_ms, 2000);
        assert_eq!(settings.max_retries, 10);
        assert!(!settings.no_final_commit);
    }

    #[test]
    fn test_server_url_from_host_and_port() {
        let settings = Settings::default();
        assert_eq!(settings.server_url(), "http://localhost:8983/solr");
    }

    #[test]
    fn test_server_url_with_collection() {
        let settings = Settings {
            host: "solr.internal".to_string(),
            port: 8080,
            collection: Some("biblio".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.server_url(), "http://solr.internal:8080/solr/biblio");
    }

    #[test]
    fn test_explicit_server_wins() {
        let settings = Settings {
            server: Some("https://example.org/solr/core1".to_string()),
            collection: Some("ignored".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.server_url(), "https://example.org/solr/core1");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
server = "http://10.0.0.1:8983/solr/biblio"
batch_size = 250
retry_strategy = "linear"
purge = true
"#
        )
        .unwrap();

        let settings = Settings::load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(settings.server.as_deref(), Some("http://10.0.0.1:8983/solr/biblio"));
        assert_eq!(settings.batch_size, 250);
        assert_eq!(settings.retry_strategy, RetryStrategy::Linear);
        assert!(settings.purge);
        // Untouched keys keep their defaults
        assert_eq!(settings.commit_interval, 1_000_000);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = Settings::load(Some("/nonexistent/solrbulk/config.toml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_settings_serialization() {
        let settings = Settings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let decoded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.batch_size, settings.batch_size);
        assert_eq!(decoded.retry_strategy, settings.retry_strategy);
    }
}
