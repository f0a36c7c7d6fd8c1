// src/query/insights.rs
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::types::JobRecord;

pub const DEFAULT_TOP_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RecentCounts {
    pub last_day: usize,
    pub last_week: usize,
    pub last_month: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insights {
    pub total: usize,
    pub recent: RecentCounts,
    pub by_day: Vec<(NaiveDate, usize)>,
    pub top_companies: Vec<(String, usize)>,
    pub top_skills: Vec<(String, usize)>,
}

/// Jobs per calendar day, oldest first
pub fn counts_by_day(records: &[JobRecord]) -> Vec<(NaiveDate, usize)> {
    let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for record in records {
        *days.entry(record.timestamp.date()).or_default() += 1;
    }
    days.into_iter().collect()
}

/// Count occurrences, highest first; ties keep first-seen order
fn rank<'a, I>(items: I, limit: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for item in items {
        match positions.get(item) {
            Some(&index) => counts[index].1 += 1,
            None => {
                positions.insert(item, counts.len());
                counts.push((item, 1));
            }
        }
    }

    // Stable sort keeps first-encountered order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(limit)
        .map(|(item, count)| (item.to_string(), count))
        .collect()
}

pub fn top_companies(records: &[JobRecord], limit: usize) -> Vec<(String, usize)> {
    rank(records.iter().map(|r| r.company.as_str()), limit)
}

/// Skills come from splitting each row's comma-separated list
pub fn top_skills(records: &[JobRecord], limit: usize) -> Vec<(String, usize)> {
    rank(
        records
            .iter()
            .flat_map(|r| r.top_skills.split(','))
            .map(str::trim)
            .filter(|skill| !skill.is_empty()),
        limit,
    )
}

pub fn recent_counts(records: &[JobRecord], now: NaiveDateTime) -> RecentCounts {
    let within = |days: i64| {
        let cutoff = now - Duration::days(days);
        records.iter().filter(|r| r.timestamp >= cutoff).count()
    };

    RecentCounts {
        last_day: within(1),
        last_week: within(7),
        last_month: within(30),
    }
}

pub fn build_insights(records: &[JobRecord], now: NaiveDateTime) -> Insights {
    Insights {
        total: records.len(),
        recent: recent_counts(records, now),
        by_day: counts_by_day(records),
        top_companies: top_companies(records, DEFAULT_TOP_LIMIT),
        top_skills: top_skills(records, DEFAULT_TOP_LIMIT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::records::parse_timestamp;

    fn job(ts: &str, company: &str, skills: &str) -> JobRecord {
        JobRecord {
            timestamp: parse_timestamp(ts).unwrap(),
            job_link: String::new(),
            company: company.to_string(),
            job_description: String::new(),
            top_skills: skills.to_string(),
            skills_summary: String::new(),
        }
    }

    fn pairs(items: &[(&str, usize)]) -> Vec<(String, usize)> {
        items.iter().map(|(s, n)| (s.to_string(), *n)).collect()
    }

    #[test]
    fn test_top_companies_counts_and_orders() {
        let records = vec![
            job("2024-06-01 10:00:00", "A", ""),
            job("2024-06-01 11:00:00", "A", ""),
            job("2024-06-02 10:00:00", "B", ""),
        ];
        assert_eq!(top_companies(&records, 10), pairs(&[("A", 2), ("B", 1)]));
    }

    #[test]
    fn test_ties_keep_first_encountered_order() {
        let records = vec![
            job("2024-06-01 10:00:00", "Zeta", ""),
            job("2024-06-01 10:00:00", "Alpha", ""),
            job("2024-06-01 10:00:00", "Mid", ""),
            job("2024-06-01 10:00:00", "Mid", ""),
            job("2024-06-01 10:00:00", "Alpha", ""),
        ];
        assert_eq!(
            top_companies(&records, 10),
            pairs(&[("Alpha", 2), ("Mid", 2), ("Zeta", 1)])
        );
        assert_eq!(top_companies(&records, 1), pairs(&[("Alpha", 2)]));
    }

    #[test]
    fn test_top_skills_splits_and_trims() {
        let records = vec![
            job("2024-06-01 10:00:00", "A", "Rust, SQL , Docker"),
            job("2024-06-02 10:00:00", "B", "SQL,Python,, "),
            job("2024-06-03 10:00:00", "C", "Python, SQL"),
        ];
        assert_eq!(
            top_skills(&records, 10),
            pairs(&[("SQL", 3), ("Python", 2), ("Rust", 1), ("Docker", 1)])
        );
    }

    #[test]
    fn test_counts_by_day_is_chronological() {
        let records = vec![
            job("2024-06-03 09:00:00", "A", ""),
            job("2024-06-01 23:59:59", "B", ""),
            job("2024-06-03 18:00:00", "C", ""),
        ];
        let days = counts_by_day(&records);
        assert_eq!(
            days,
            vec![
                (NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 1),
                (NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(), 2),
            ]
        );
    }

    #[test]
    fn test_recent_counts() {
        let now = parse_timestamp("2024-06-30 12:00:00").unwrap();
        let records = vec![
            job("2024-06-30 08:00:00", "A", ""),
            job("2024-06-25 08:00:00", "B", ""),
            job("2024-06-10 08:00:00", "C", ""),
            job("2024-04-01 08:00:00", "D", ""),
        ];
        assert_eq!(
            recent_counts(&records, now),
            RecentCounts {
                last_day: 1,
                last_week: 2,
                last_month: 3,
            }
        );
    }

    #[test]
    fn test_empty_table_yields_empty_aggregates() {
        let now = parse_timestamp("2024-06-30 12:00:00").unwrap();
        let insights = build_insights(&[], now);
        assert_eq!(insights.total, 0);
        assert!(insights.by_day.is_empty());
        assert!(insights.top_companies.is_empty());
        assert!(insights.top_skills.is_empty());
        assert_eq!(insights.recent, RecentCounts::default());
    }
}
