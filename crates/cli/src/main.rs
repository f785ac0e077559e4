//! examdl entry point.
//!
//! Loads configuration, reads the catalog and runs the retrieval orchestrator.
//! Logging goes to stderr. Ctrl-C stops the batch before the next certification;
//! a second Ctrl-C exits immediately.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use examdl_client::{Crawler, FetchClient, FetchConfig, HttpProvider, Orchestrator, RemoteCache, RunReport};
use examdl_core::{AppConfig, Catalog, FileSink};

mod args;
mod signals;

use args::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = AppConfig::load(cli.config.as_deref(), |config| cli.apply(config)).context("loading configuration")?;

    let catalog = match Catalog::load(&config.catalog_path) {
        Ok(catalog) => catalog,
        Err(e) if e.is_batch_fatal() => {
            tracing::error!(error = %e, "cannot start batch");
            return Ok(ExitCode::FAILURE);
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(
        catalog = %config.catalog_path.display(),
        rows = catalog.total_rows(),
        valid = catalog.valid_rows(),
        provider = %config.provider,
        "loaded catalog"
    );

    let fetch = FetchClient::new(FetchConfig::from_app(&config)).context("building HTTP client")?;
    let retrieval = config.retrieval();
    let cache = if retrieval.cache_enabled {
        config.cache_url.as_deref().map(|url| RemoteCache::new(fetch.clone(), url))
    } else {
        tracing::info!("remote cache disabled, every certification will be crawled");
        None
    };
    let provider = HttpProvider::new(fetch, &config.provider_url)?;
    let sink = FileSink {
        output_dir: config.output_dir.clone(),
        links_dir: config.links_dir.clone(),
        include_discussion: config.include_discussion,
        format: config.file_format,
    };

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if signals::watch_interrupts(cancel, tokio::signal::ctrl_c).await {
                tracing::warn!("second interrupt received, exiting");
                std::process::exit(130);
            }
        }
    });

    let orchestrator =
        Orchestrator::new(retrieval, cache, Crawler::new(provider, config.max_pages), sink).with_cancellation(cancel);
    let report = orchestrator.run(&catalog).await;

    summarize(&report);
    Ok(ExitCode::SUCCESS)
}

fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    if cli.log_json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

fn summarize(report: &RunReport) {
    tracing::info!(
        total_rows = report.total_rows,
        invalid_rows = report.invalid_rows,
        processed = report.processed(),
        succeeded = report.succeeded,
        skipped = report.skipped,
        failed = report.failed,
        from_cache = report.from_cache,
        delays = report.delays,
        cancelled = report.cancelled,
        "run finished"
    );

    let rerun = report.rerun_codes();
    if !rerun.is_empty() {
        tracing::warn!(codes = %rerun.join(","), "certifications to re-run");
    }
}
