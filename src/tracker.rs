// src/tracker.rs
//! Submit, list and summarize a user's job applications and contacts

use chrono::NaiveDateTime;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::extraction::{CompanyStrategy, FieldExtractor};
use crate::query::{build_insights, filter_jobs, FilterSpec, Insights};
use crate::storage::{self, RecordStore};
use crate::types::records::now_seconds;
use crate::types::{ContactRecord, JobRecord};

#[derive(Debug, Error)]
pub enum TrackerError {
    /// Missing or invalid input; nothing was extracted or stored
    #[error("{0}")]
    Validation(String),
    /// Backend unreachable or rejected the operation
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;

#[derive(Debug, Clone, Deserialize)]
pub struct NewJob {
    pub job_link: String,
    pub job_description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewContact {
    pub job_role: String,
    pub company: String,
    pub job_link: String,
    pub people_contacted: String,
}

pub struct JobTracker {
    store: Arc<dyn RecordStore>,
    extractor: FieldExtractor,
}

fn validate_user(user_id: &str) -> TrackerResult<()> {
    storage::validate_user_id(user_id).map_err(|e| TrackerError::Validation(e.to_string()))
}

fn require(value: &str, message: &str) -> TrackerResult<()> {
    if value.trim().is_empty() {
        Err(TrackerError::Validation(message.to_string()))
    } else {
        Ok(())
    }
}

impl JobTracker {
    pub fn new(store: Arc<dyn RecordStore>, extractor: FieldExtractor) -> Self {
        Self { store, extractor }
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    pub fn company_strategy(&self) -> CompanyStrategy {
        self.extractor.strategy()
    }

    /// Validate, extract fields, then append one row. Extraction faults are
    /// recorded in the row rather than failing the submit.
    pub async fn submit_job(&self, user_id: &str, job: NewJob) -> TrackerResult<JobRecord> {
        validate_user(user_id)?;
        if job.job_link.trim().is_empty() || job.job_description.trim().is_empty() {
            return Err(TrackerError::Validation(
                "Please enter both job link and description.".to_string(),
            ));
        }

        let fields = self
            .extractor
            .extract_fields(&job.job_link, &job.job_description)
            .await;

        let record = JobRecord {
            timestamp: now_seconds(),
            job_link: job.job_link,
            company: fields.company,
            job_description: job.job_description,
            top_skills: fields.top_skills,
            skills_summary: fields.skills_summary,
        };

        let handle = storage::ensure_table::<JobRecord>(self.store(), user_id).await?;
        storage::append(self.store(), &handle, &record).await?;

        info!("User {} added job at {}", user_id, record.company);
        Ok(record)
    }

    pub async fn log_contact(
        &self,
        user_id: &str,
        contact: NewContact,
    ) -> TrackerResult<ContactRecord> {
        validate_user(user_id)?;
        require(&contact.job_role, "Please fill out all fields: job role is missing.")?;
        require(&contact.company, "Please fill out all fields: company is missing.")?;
        require(&contact.job_link, "Please fill out all fields: job link is missing.")?;
        require(
            &contact.people_contacted,
            "Please fill out all fields: people contacted is missing.",
        )?;

        let record = ContactRecord {
            timestamp: now_seconds(),
            job_role: contact.job_role,
            company: contact.company,
            job_link: contact.job_link,
            people_contacted: contact.people_contacted,
        };

        let handle = storage::ensure_table::<ContactRecord>(self.store(), user_id).await?;
        storage::append(self.store(), &handle, &record).await?;

        info!("User {} logged contacts for {}", user_id, record.company);
        Ok(record)
    }

    pub async fn jobs(&self, user_id: &str) -> TrackerResult<Vec<JobRecord>> {
        validate_user(user_id)?;
        let handle = storage::ensure_table::<JobRecord>(self.store(), user_id).await?;
        Ok(storage::read_all(self.store(), &handle).await?)
    }

    /// Contacts newest first
    pub async fn contacts(&self, user_id: &str) -> TrackerResult<Vec<ContactRecord>> {
        validate_user(user_id)?;
        let handle = storage::ensure_table::<ContactRecord>(self.store(), user_id).await?;
        let mut contacts: Vec<ContactRecord> = storage::read_all(self.store(), &handle).await?;
        // Reversed first so rows logged within the same second keep newest-first order
        contacts.reverse();
        contacts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(contacts)
    }

    pub async fn filtered_jobs(
        &self,
        user_id: &str,
        spec: &FilterSpec,
        now: NaiveDateTime,
    ) -> TrackerResult<Vec<JobRecord>> {
        let jobs = self.jobs(user_id).await?;
        Ok(filter_jobs(&jobs, spec, now))
    }

    pub async fn insights(&self, user_id: &str, now: NaiveDateTime) -> TrackerResult<Insights> {
        let jobs = self.jobs(user_id).await?;
        Ok(build_insights(&jobs, now))
    }
}
