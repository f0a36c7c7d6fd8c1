// src/cli.rs
use crate::config::{EnvironmentConfig, Secrets};
use crate::export::to_csv;
use crate::query::FilterSpec;
use crate::tracker::JobTracker;
use crate::types::records::now_seconds;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "job-tracker")]
#[command(about = "Track job applications and networking contacts")]
pub struct TrackerCli {
    #[command(subcommand)]
    pub command: Option<TrackerCommand>,
}

#[derive(Subcommand)]
pub enum TrackerCommand {
    /// Run the HTTP API (default)
    Serve,
    /// Write a user's jobs or contacts as CSV
    Export {
        #[arg(long)]
        user: String,
        /// Export the contact log instead of jobs
        #[arg(long)]
        contacts: bool,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        keyword: Option<String>,
        /// Only jobs from the last N days (0-60)
        #[arg(long)]
        days: Option<u32>,
        /// Destination file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// Build the CSV for an export request. Filters apply to jobs only.
pub async fn export_csv(
    tracker: &JobTracker,
    user: &str,
    contacts: bool,
    filters: &FilterSpec,
) -> Result<String> {
    if contacts {
        let records = tracker.contacts(user).await?;
        info!("Exporting {} contacts for {}", records.len(), user);
        to_csv(&records)
    } else {
        let records = tracker.filtered_jobs(user, filters, now_seconds()).await?;
        info!("Exporting {} jobs for {}", records.len(), user);
        to_csv(&records)
    }
}

pub async fn handle_command(cli: TrackerCli) -> Result<()> {
    let config = EnvironmentConfig::load()?;

    match cli.command.unwrap_or(TrackerCommand::Serve) {
        TrackerCommand::Serve => {
            let secrets = Secrets::from_env()?;
            crate::web::start_web_server(config, secrets).await
        }
        TrackerCommand::Export {
            user,
            contacts,
            company,
            keyword,
            days,
            output,
        } => {
            // Export never calls the completion service, so no secrets are required
            let secrets = Secrets {
                openai_api_key: None,
                app_password: String::new(),
            };
            let tracker = crate::build_tracker(&config, &secrets)?;
            let filters = FilterSpec::new(
                company,
                keyword,
                days.unwrap_or(crate::query::DEFAULT_WINDOW_DAYS),
            );

            let csv = export_csv(&tracker, &user, contacts, &filters).await?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, csv)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!("Export written to {}", path.display());
                }
                None => print!("{}", csv),
            }
            Ok(())
        }
    }
}
