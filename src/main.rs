use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use statuswatch::{logging, Settings};
use statuswatch_adapters::build_sources;
use statuswatch_sdk::Exporter;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "statuswatch", version)]
#[command(about = "Prometheus exporter for third-party status pages")]
struct Args {
    /// Path to the YAML config file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Listen address for the metrics server (overrides the config file)
    #[arg(short, long)]
    listen: Option<String>,

    /// Log level: debug|info|warn|error (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(&args.config)?;
    settings.apply_overrides(args.listen.as_deref(), args.log_level.as_deref());

    logging::init(&settings.common.log_level)?;
    info!(
        config = %args.config.display(),
        pages = settings.pages.len(),
        level = %settings.common.log_level,
        "starting statuswatch"
    );

    let targets = build_sources(&settings.pages, &settings.source_defaults())
        .context("invalid page configuration")?;

    let exporter = Exporter::builder()
        .targets(targets)
        .unknown_is_up(settings.common.unknown_is_up)
        .build();

    let server = exporter
        .serve(&settings.prometheus_config())
        .await
        .with_context(|| format!("failed to listen on {}", settings.server.listen))?;

    // Refresh starts after the listener is bound.
    let refresh = exporter.start();

    tokio::select! {
        result = server.run() => {
            if let Err(e) = &result {
                error!(error = %e, "metrics server stopped");
            }
            result.context("metrics server failed")?;
        }
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            info!("shutting down");
        }
    }

    refresh.stop();
    Ok(())
}
