// src/extraction/field_extractor.rs
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::completion_client::CompletionClient;

pub const UNKNOWN_COMPANY: &str = "Unknown";

const SKILLS_LIST_PROMPT: &str = "Return only the top 5 skills from this job description as a comma-separated list, no bullets, no markdown, no explanation.";

const SKILLS_SUMMARY_PROMPT: &str = "Write a clean, markdown-free summary of the top 5 required skills in paragraph form (no * or ** or -).";

const COMPANY_PROMPT: &str = "Identify the hiring company name from this job posting. Reply with the company name only, or with the single word Unknown if it cannot be determined.";

/// How the company name is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyStrategy {
    /// Local patterns only
    Pattern,
    /// Local patterns, then the completion API when they find nothing
    #[default]
    PatternThenApi,
    /// Always ask the completion API
    Api,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub company: String,
    pub top_skills: String,
    pub skills_summary: String,
}

/// Company-name patterns applied before any API call
pub struct CompanyPatterns {
    description: Regex,
    link: Regex,
}

impl CompanyPatterns {
    pub fn new() -> Result<Self> {
        // Capitalized phrase after a whole-word "at"/"with", up to the next . , or newline
        let description = Regex::new(r"\b(?i:at|with)\s+([A-Z][A-Za-z0-9&.\s]*?)\s*[.,\n]")
            .context("Failed to compile description pattern")?;
        let link = Regex::new(r"https?://(?:www\.)?([A-Za-z0-9_-]+)\.")
            .context("Failed to compile link pattern")?;

        Ok(Self { description, link })
    }

    pub fn company_in_description(&self, description: &str) -> Option<String> {
        self.description
            .captures(description)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|name| !name.is_empty())
    }

    pub fn company_in_link(&self, link: &str) -> Option<String> {
        self.link
            .captures(link)
            .and_then(|caps| caps.get(1))
            .map(|m| capitalize(m.as_str()))
    }

    /// Description first, then the link hostname
    pub fn extract(&self, link: &str, description: &str) -> Option<String> {
        self.company_in_description(description)
            .or_else(|| self.company_in_link(link))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// Replace runs of `*` and newlines with a single space, then trim
pub fn clean_completion(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c == '*' || c == '\n' {
            if !in_run {
                cleaned.push(' ');
                in_run = true;
            }
        } else {
            cleaned.push(c);
            in_run = false;
        }
    }
    cleaned.trim().to_string()
}

pub struct FieldExtractor {
    client: Arc<dyn CompletionClient>,
    strategy: CompanyStrategy,
    patterns: CompanyPatterns,
}

impl FieldExtractor {
    pub fn new(client: Arc<dyn CompletionClient>, strategy: CompanyStrategy) -> Result<Self> {
        Ok(Self {
            client,
            strategy,
            patterns: CompanyPatterns::new()?,
        })
    }

    pub fn strategy(&self) -> CompanyStrategy {
        self.strategy
    }

    /// Derive company, skills list and skills summary. Never fails: faults
    /// degrade to "Unknown" and "Error: ..." values.
    pub async fn extract_fields(&self, link: &str, description: &str) -> ExtractedFields {
        let company = self.extract_company(link, description).await;
        let (top_skills, skills_summary) = self.extract_skills(description).await;

        ExtractedFields {
            company,
            top_skills,
            skills_summary,
        }
    }

    pub async fn extract_company(&self, link: &str, description: &str) -> String {
        if self.strategy != CompanyStrategy::Api {
            if let Some(company) = self.patterns.extract(link, description) {
                return company;
            }
            if self.strategy == CompanyStrategy::Pattern {
                return UNKNOWN_COMPANY.to_string();
            }
        }

        self.company_from_api(link, description).await
    }

    async fn company_from_api(&self, link: &str, description: &str) -> String {
        let text = format!("Job link: {}\n\nJob description:\n{}", link, description);
        match self.client.complete(COMPANY_PROMPT, &text).await {
            Ok(answer) => {
                let company = clean_completion(&answer);
                let company = company.trim_end_matches('.').trim();
                if company.is_empty() || company.eq_ignore_ascii_case(UNKNOWN_COMPANY) {
                    UNKNOWN_COMPANY.to_string()
                } else {
                    company.to_string()
                }
            }
            Err(e) => {
                warn!("Company extraction failed: {:#}", e);
                UNKNOWN_COMPANY.to_string()
            }
        }
    }

    /// Returns (skills list, skills summary)
    pub async fn extract_skills(&self, description: &str) -> (String, String) {
        match self.request_skills(description).await {
            Ok(skills) => {
                info!("Extracted skills: {}", skills.0);
                skills
            }
            Err(e) => {
                warn!("Skill extraction failed: {:#}", e);
                let message = format!("Error: {}", e);
                (message.clone(), message)
            }
        }
    }

    async fn request_skills(&self, description: &str) -> Result<(String, String)> {
        let list = self.client.complete(SKILLS_LIST_PROMPT, description).await?;
        let summary = self
            .client
            .complete(SKILLS_SUMMARY_PROMPT, description)
            .await?;
        Ok((clean_completion(&list), clean_completion(&summary)))
    }
}
