//! linkcat-server - Merge the PDFs a document links to, over HTTP.
//!
//! Accepts PDF uploads, downloads every PDF they link to and serves the
//! merged result.

mod cli;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use linkcat::config::{Config, StorageConfig};
use linkcat::pipeline::Pipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_tracing(&cli);

    let config = to_config(&cli);
    config.validate()?;

    tracing::info!("{} v{}", linkcat::NAME, linkcat::VERSION);
    tracing::info!(
        uploads = %config.storage.uploads_dir.display(),
        merged = %config.storage.merged_dir.display(),
        downloads = %config.storage.downloads_dir.display(),
        "Storage areas"
    );

    let pipeline = Pipeline::new(&config)
        .await
        .context("failed to initialize pipeline")?;
    let cors = routes::cors_layer(&cli.cors_origins)?;
    let app = routes::router(Arc::new(pipeline), config.max_upload_bytes, cors);

    let listener = TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` overrides the CLI verbosity.
fn init_tracing(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Convert CLI arguments into a library configuration.
fn to_config(cli: &Cli) -> Config {
    let defaults = StorageConfig::under(&cli.storage_root);
    let storage = StorageConfig {
        uploads_dir: cli.uploads_dir.clone().unwrap_or(defaults.uploads_dir),
        merged_dir: cli.merged_dir.clone().unwrap_or(defaults.merged_dir),
        downloads_dir: cli.downloads_dir.clone().unwrap_or(defaults.downloads_dir),
    };

    Config {
        storage,
        fetch_timeout: Duration::from_secs(cli.fetch_timeout),
        fetch_jobs: cli.jobs,
        max_upload_bytes: cli.max_upload_bytes(),
        ..Config::default()
    }
}
