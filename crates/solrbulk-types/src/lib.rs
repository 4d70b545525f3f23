//! # solrbulk-types
//!
//! Shared domain types for solrbulk.
//!
//! - [`Batch`]: an ordered group of opaque JSON documents submitted in one request
//! - [`Settings`]: layered configuration (defaults, config file, environment)
//! - [`Options`]: the validated, immutable view of [`Settings`] handed to the pipeline
//!
//! ## Usage
//!
//! ```rust
//! use solrbulk_types::{Batch, Options};
//!
//! let options = Options::new("http://localhost:8983/solr/biblio").with_batch_size(2);
//! let batch: Batch = vec![r#"{"id":"1"}"#.to_string()].into();
//! assert_eq!(options.update_url(), "http://localhost:8983/solr/biblio/update");
//! assert_eq!(batch.to_payload(), "[{\"id\":\"1\"}]\n");
//! ```

pub mod document;
pub mod error;
pub mod options;
pub mod settings;

pub use document::{is_blank, normalize_line, Batch};
pub use error::ConfigError;
pub use options::{BasicAuth, Options, PurgeOptions, RetryOptions, RetryStrategy};
pub use settings::Settings;
