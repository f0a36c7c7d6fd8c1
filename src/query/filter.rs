// src/query/filter.rs
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::types::JobRecord;

pub const MAX_WINDOW_DAYS: u32 = 60;
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Active filters for the jobs view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default = "default_window")]
    pub window_days: u32,
}

fn default_window() -> u32 {
    DEFAULT_WINDOW_DAYS
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            company: None,
            keyword: None,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl FilterSpec {
    pub fn new(company: Option<String>, keyword: Option<String>, window_days: u32) -> Self {
        Self {
            company: non_blank(company),
            keyword: non_blank(keyword),
            window_days: window_days.min(MAX_WINDOW_DAYS),
        }
    }

    /// Earliest timestamp still inside the window. A zero-day window starts at `now`.
    pub fn cutoff(&self, now: NaiveDateTime) -> NaiveDateTime {
        now - Duration::days(i64::from(self.window_days.min(MAX_WINDOW_DAYS)))
    }

    pub fn matches(&self, record: &JobRecord, now: NaiveDateTime) -> bool {
        if let Some(company) = self.company.as_deref().filter(|c| !c.trim().is_empty()) {
            if !contains_ignore_case(&record.company, company) {
                return false;
            }
        }

        if let Some(keyword) = self.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
            let hit = contains_ignore_case(&record.top_skills, keyword)
                || contains_ignore_case(&record.skills_summary, keyword)
                || contains_ignore_case(&record.job_description, keyword);
            if !hit {
                return false;
            }
        }

        record.timestamp >= self.cutoff(now)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Rows matching every active filter, in their original order
pub fn filter_jobs(records: &[JobRecord], spec: &FilterSpec, now: NaiveDateTime) -> Vec<JobRecord> {
    records
        .iter()
        .filter(|record| spec.matches(record, now))
        .cloned()
        .collect()
}
