use anyhow::{Context, Result};
use clap::Parser;
use job_tracker::cli::{handle_command, TrackerCli};
use job_tracker::config::EnvironmentConfig;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::info;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn init_logging(log_path: Option<&Path>) -> Result<()> {
    let file_layer = match log_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true) // Clear file on startup
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(false)
                    .with_span_list(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("job_tracker=info,rocket::server=off")),
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TrackerCli::parse();

    // The log file location lives in config; a bad config is reported by handle_command
    let log_path = EnvironmentConfig::load().ok().and_then(|c| c.log_path);
    init_logging(log_path.as_deref())?;

    info!("Environment: {}", EnvironmentConfig::get_environment());

    handle_command(cli).await
}
