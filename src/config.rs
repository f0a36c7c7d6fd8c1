// src/config.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::extraction::CompanyStrategy;

const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    #[serde(default)]
    pub allowed_users: Vec<String>,
    #[serde(default)]
    pub company_strategy: CompanyStrategy,
    #[serde(default)]
    pub completion: CompletionConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StorageConfig {
    Csv {
        data_path: PathBuf,
    },
    Sheets {
        spreadsheet_id: String,
        credentials_path: PathBuf,
    },
}

/// Values that never live in config.yaml
#[derive(Debug, Clone)]
pub struct Secrets {
    pub openai_api_key: Option<String>,
    pub app_password: String,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: EnvironmentConfig,
}

fn default_port() -> u16 {
    8000
}

impl EnvironmentConfig {
    /// Load configuration based on environment
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let config_path = std::env::var("JOB_TRACKER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = Self::load_from_file(&config_path, &environment)?;

        if let Ok(port) = std::env::var("ROCKET_PORT") {
            config.port = port
                .parse::<u16>()
                .map_err(|_| anyhow::anyhow!("ROCKET_PORT must be a valid port number"))?;
        }

        Ok(config)
    }

    /// Section name selected by `JOB_TRACKER_ENV`, `ENVIRONMENT` or `ENV`
    pub fn get_environment() -> String {
        Self::environment_from(|name| std::env::var(name).ok())
    }

    fn environment_from(lookup: impl Fn(&str) -> Option<String>) -> String {
        ["JOB_TRACKER_ENV", "ENVIRONMENT", "ENV"]
            .into_iter()
            .find_map(&lookup)
            .unwrap_or_else(|| "local".to_string())
    }

    pub fn load_from_file(config_path: &Path, environment: &str) -> Result<Self> {
        if !config_path.exists() {
            anyhow::bail!(
                "{} not found. Server cannot start without configuration.",
                config_path.display()
            );
        }

        let config_content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        Self::from_yaml(&config_content, environment)
    }

    pub fn from_yaml(content: &str, environment: &str) -> Result<Self> {
        let config_file: ConfigFile =
            serde_yaml::from_str(content).context("Failed to parse configuration")?;

        let env_config = match environment {
            "production" => config_file.production,
            _ => config_file.local,
        };

        env_config.resolved()
    }

    /// Make every configured path absolute
    fn resolved(mut self) -> Result<Self> {
        if let Some(log_path) = &self.log_path {
            self.log_path = Some(resolve_path(log_path)?);
        }

        self.storage = match self.storage {
            StorageConfig::Csv { data_path } => StorageConfig::Csv {
                data_path: resolve_path(&data_path)?,
            },
            StorageConfig::Sheets {
                spreadsheet_id,
                credentials_path,
            } => StorageConfig::Sheets {
                spreadsheet_id,
                credentials_path: resolve_path(&credentials_path)?,
            },
        };

        if self.allowed_users.is_empty() {
            warn!("No allowed users configured; every login will be rejected");
        }

        Ok(self)
    }
}

impl Secrets {
    pub fn from_env() -> Result<Self> {
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();

        let app_password = std::env::var("APP_PASSWORD")
            .map_err(|_| anyhow::anyhow!("APP_PASSWORD environment variable not set"))?;

        Ok(Self {
            openai_api_key,
            app_password,
        })
    }
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(current_dir.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
local:
  port: 8501
  allowed_users: [ruqhaiya, Missy]
  storage:
    backend: csv
    data_path: data
production:
  log_path: /var/log/job_tracker.log
  company_strategy: api
  completion:
    base_url: https://llm.internal/v1
    model: gpt-4o-mini
    timeout_seconds: 30
  storage:
    backend: sheets
    spreadsheet_id: abc123
    credentials_path: /etc/job_tracker/sa.json
"#;

    #[test]
    fn test_local_section_with_defaults() {
        let config = EnvironmentConfig::from_yaml(SAMPLE, "local").unwrap();
        assert_eq!(config.port, 8501);
        assert_eq!(config.allowed_users, vec!["ruqhaiya", "Missy"]);
        assert_eq!(config.company_strategy, CompanyStrategy::PatternThenApi);
        assert_eq!(config.completion.model, "gpt-3.5-turbo");
        match config.storage {
            StorageConfig::Csv { data_path } => {
                assert!(data_path.is_absolute());
                assert!(data_path.ends_with("data"));
            }
            other => panic!("unexpected storage: {:?}", other),
        }
    }

    #[test]
    fn test_production_section() {
        let config = EnvironmentConfig::from_yaml(SAMPLE, "production").unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.company_strategy, CompanyStrategy::Api);
        assert_eq!(config.completion.timeout_seconds, 30);
        assert_eq!(
            config.log_path,
            Some(PathBuf::from("/var/log/job_tracker.log"))
        );
        match config.storage {
            StorageConfig::Sheets {
                spreadsheet_id,
                credentials_path,
            } => {
                assert_eq!(spreadsheet_id, "abc123");
                assert_eq!(credentials_path, PathBuf::from("/etc/job_tracker/sa.json"));
            }
            other => panic!("unexpected storage: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_environment_falls_back_to_local() {
        let config = EnvironmentConfig::from_yaml(SAMPLE, "staging").unwrap();
        assert_eq!(config.port, 8501);
    }

    #[test]
    fn test_environment_variable_precedence() {
        let only_env = |name: &str| (name == "ENV").then(|| "production".to_string());
        assert_eq!(EnvironmentConfig::environment_from(only_env), "production");

        let both = |name: &str| match name {
            "JOB_TRACKER_ENV" => Some("local".to_string()),
            "ENV" => Some("production".to_string()),
            _ => None,
        };
        assert_eq!(EnvironmentConfig::environment_from(both), "local");

        assert_eq!(EnvironmentConfig::environment_from(|_| None), "local");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = EnvironmentConfig::load_from_file(Path::new("/nonexistent/config.yaml"), "local")
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
