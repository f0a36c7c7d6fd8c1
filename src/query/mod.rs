// src/query/mod.rs
pub mod filter;
pub mod insights;

pub use filter::{filter_jobs, FilterSpec, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
pub use insights::{
    build_insights, counts_by_day, recent_counts, top_companies, top_skills, Insights,
    RecentCounts, DEFAULT_TOP_LIMIT,
};
