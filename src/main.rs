use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};
use trellis_worker::{config, export::GlbExporter, model::ModelHandle, server, worker::Worker};

/// Validates that a log level string is valid
fn validate_log_level(level: &str) -> Result<()> {
    level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
                level
            )
        })?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (before logging setup)
    let config = match config::load().await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Determine log level: environment variable overrides config
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.server.logs.level.clone());

    if let Err(e) = validate_log_level(&log_level) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))?,
        )
        .json()
        .init();

    info!("Starting TRELLIS worker with log level: {}", log_level);

    // A worker without a model must never accept jobs.
    let model = match ModelHandle::initialize(&config.model, |key| std::env::var(key).ok()).await
    {
        Ok(model) => model,
        Err(e) => {
            error!("Error during model initialization: {}", e);
            std::process::exit(1);
        }
    };

    let worker = Worker::new(model, Arc::new(GlbExporter));
    server::run(config.server, worker).await?;

    Ok(())
}
