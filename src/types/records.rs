// src/types/records.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Format used for timestamps in stored rows
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const JOB_HEADERS: [&str; 6] = [
    "Timestamp",
    "Job Link",
    "Company",
    "Job Description",
    "Top Skills List",
    "Detailed Skills Summary",
];

pub const CONTACT_HEADERS: [&str; 5] = [
    "Timestamp",
    "Job Role",
    "Company",
    "Job Link",
    "People Contacted",
];

/// Which per-user table a record lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Jobs,
    Contacts,
}

/// A record that can be stored as one row of a fixed-column table
pub trait TableRecord: Sized {
    const KIND: TableKind;

    fn headers() -> &'static [&'static str];

    fn to_row(&self) -> Vec<String>;

    /// Rebuild a record from a stored row. Fails on a wrong column count or
    /// an unparseable timestamp.
    fn from_row(row: &[String]) -> Result<Self>;

    fn timestamp(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub timestamp: NaiveDateTime,
    pub job_link: String,
    pub company: String,
    pub job_description: String,
    pub top_skills: String,
    pub skills_summary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub timestamp: NaiveDateTime,
    pub job_role: String,
    pub company: String,
    pub job_link: String,
    pub people_contacted: String,
}

/// Current local time truncated to whole seconds
pub fn now_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored timestamp. Hand-edited spreadsheet cells may carry ISO
/// forms, so those are accepted too.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.naive_local()))
        .with_context(|| format!("Invalid timestamp: {}", value))
}

fn check_width(row: &[String], expected: usize) -> Result<()> {
    if row.len() != expected {
        anyhow::bail!("Expected {} columns, found {}", expected, row.len());
    }
    Ok(())
}

impl TableRecord for JobRecord {
    const KIND: TableKind = TableKind::Jobs;

    fn headers() -> &'static [&'static str] {
        &JOB_HEADERS
    }

    fn to_row(&self) -> Vec<String> {
        vec![
            format_timestamp(&self.timestamp),
            self.job_link.clone(),
            self.company.clone(),
            self.job_description.clone(),
            self.top_skills.clone(),
            self.skills_summary.clone(),
        ]
    }

    fn from_row(row: &[String]) -> Result<Self> {
        check_width(row, JOB_HEADERS.len())?;
        match row {
            [timestamp, job_link, company, job_description, top_skills, skills_summary] => {
                Ok(Self {
                    timestamp: parse_timestamp(timestamp)?,
                    job_link: job_link.clone(),
                    company: company.clone(),
                    job_description: job_description.clone(),
                    top_skills: top_skills.clone(),
                    skills_summary: skills_summary.clone(),
                })
            }
            _ => anyhow::bail!("Malformed job row"),
        }
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

impl TableRecord for ContactRecord {
    const KIND: TableKind = TableKind::Contacts;

    fn headers() -> &'static [&'static str] {
        &CONTACT_HEADERS
    }

    fn to_row(&self) -> Vec<String> {
        vec![
            format_timestamp(&self.timestamp),
            self.job_role.clone(),
            self.company.clone(),
            self.job_link.clone(),
            self.people_contacted.clone(),
        ]
    }

    fn from_row(row: &[String]) -> Result<Self> {
        check_width(row, CONTACT_HEADERS.len())?;
        match row {
            [timestamp, job_role, company, job_link, people_contacted] => Ok(Self {
                timestamp: parse_timestamp(timestamp)?,
                job_role: job_role.clone(),
                company: company.clone(),
                job_link: job_link.clone(),
                people_contacted: people_contacted.clone(),
            }),
            _ => anyhow::bail!("Malformed contact row"),
        }
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}
