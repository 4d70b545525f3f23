//! solrbulk
//!
//! Bulk load newline-delimited JSON documents into Solr with parallel workers.
//!
//! # Usage
//!
//! ```bash
//! solrbulk --server http://localhost:8983/solr/biblio docs.ndjson
//! zcat docs.ndjson.gz | solrbulk --server localhost:8983/solr/biblio -w 8 --size 5000
//! solrbulk -z --purge --optimize --verbose docs.ndjson.gz
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (<config dir>/solrbulk/config.toml, or --config)
//! 3. Environment variables (SOLRBULK_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use solrbulk::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    run(Cli::parse()).await
}
