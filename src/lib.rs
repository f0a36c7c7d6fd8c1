use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

pub mod auth;
pub mod cli;
pub mod config;
pub mod export;
pub mod extraction;
pub mod query;
pub mod storage;
pub mod tracker;
pub mod types;
pub mod web;

pub use config::{EnvironmentConfig, Secrets};
pub use tracker::{JobTracker, TrackerError};
pub use web::start_web_server;

/// Wire the configured storage backend and completion client into a tracker
pub fn build_tracker(config: &EnvironmentConfig, secrets: &Secrets) -> Result<JobTracker> {
    let store = storage::build_store(&config.storage)?;
    let client = extraction::OpenAiClient::new(&config.completion, secrets.openai_api_key.clone())?;
    if !client.available() {
        warn!("No completion API key; skill fields will record errors");
    }

    let extractor = extraction::FieldExtractor::new(Arc::new(client), config.company_strategy)?;

    Ok(JobTracker::new(store, extractor))
}
