//! Command implementation for solrbulk.
//!
//! Loads settings, installs logging, opens the input and runs the pipeline
//! until it finishes, fails, or is interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use solrbulk_client::SolrClient;
use solrbulk_pipeline::{run_pipeline, PipelineReport};
use solrbulk_types::{Options, Settings};

use crate::cli::Cli;
use crate::input::open_input;

/// Load settings from every source and apply the command line on top.
pub fn resolve(cli: &Cli) -> Result<(Settings, Options)> {
    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut settings);

    let options = Options::from_settings(&settings).context("Invalid configuration")?;
    Ok((settings, options))
}

/// Run one load as described by `cli`.
///
/// 1. Resolve configuration
/// 2. Install the tracing subscriber
/// 3. Open the input, plain or gzip
/// 4. Run the pipeline, cancelled on Ctrl+C, SIGTERM or `--timeout`
pub async fn run(cli: Cli) -> Result<()> {
    let (settings, options) = resolve(&cli)?;

    // Logging goes to stderr; stdout may be part of a shell pipeline
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!(
        url = %options.update_url(),
        workers = options.workers,
        batch_size = options.batch_size,
        commit_interval = options.commit_interval,
        retry_strategy = %options.retry.strategy,
        max_retries = options.retry.max_retries,
        "solrbulk starting"
    );

    let input = open_input(cli.file.as_deref(), settings.gzip)
        .await
        .with_context(|| match &cli.file {
            Some(path) => format!("Failed to open {}", path.display()),
            None => "Failed to open standard input".to_string(),
        })?;

    let options = Arc::new(options);
    let client = SolrClient::new(options).context("Failed to create HTTP client")?;

    let cancel = CancellationToken::new();
    let signals = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            cancel.cancel();
        }
    });
    let deadline = cli.timeout.map(|secs| {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            warn!(timeout_secs = secs, "Deadline reached, stopping");
            cancel.cancel();
        })
    });

    let result = run_pipeline(client, input, cancel).await;

    signals.abort();
    if let Some(deadline) = deadline {
        deadline.abort();
    }

    let report = result.context("Indexing failed")?;
    log_report(&report);
    Ok(())
}

fn log_report(report: &PipelineReport) {
    info!(
        docs = report.documents,
        skipped = report.skipped,
        batches = report.batches,
        periodic_commits = report.periodic_commits,
        final_commit = report.final_commit,
        optimized = report.optimized,
        elapsed_ms = report.elapsed.as_millis() as u64,
        docs_per_sec = report.docs_per_second(),
        "Indexing finished"
    );
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping...");
        }
        _ = terminate => {
            info!("Received SIGTERM, stopping...");
        }
    }
}
