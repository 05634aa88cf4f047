use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::prompts::PromptTemplates;

/// Environment variable consulted before the config file for the API key.
pub const API_KEY_ENV: &str = "CADENCE_API_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub cadence: CadenceConfig,
    pub schedule: ScheduleConfig,
    pub storage: StorageConfig,
    pub prompts: PromptOverrides,
}

/// LLM endpoint configuration (OpenAI-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Optional; the CADENCE_API_KEY environment variable takes precedence.
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key: None,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from the environment or the config file.
    pub fn api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                return Ok(key);
            }
        }

        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .with_context(|| {
                format!("API key not configured; set {API_KEY_ENV} or llm.api_key in the config")
            })
    }
}

/// Daily commit check configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub check_enabled: bool,
    pub workdays_only: bool,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            check_enabled: true,
            workdays_only: true,
        }
    }
}

/// Weekly summary schedule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub weekly_report_day: String,
    pub weekly_report_hour: u32,
    pub poll_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            weekly_report_day: "thursday".to_string(),
            weekly_report_hour: 17,
            poll_interval_secs: 3600,
        }
    }
}

/// Summary storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub daily_dir: PathBuf,
    pub weekly_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            daily_dir: PathBuf::from(".cadence/daily-summaries"),
            weekly_dir: PathBuf::from(".cadence/weekly-summaries"),
        }
    }
}

/// Optional system-instruction template overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptOverrides {
    pub commit_message: Option<String>,
    pub daily_summary: Option<String>,
    pub weekly_summary: Option<String>,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!(path = %path.display(), "Loaded configuration");

        Ok(config)
    }

    /// Load configuration from the default location (.cadence/config.yml)
    pub fn load_default() -> Result<Self> {
        Self::load(".cadence/config.yml")
    }

    /// System-instruction templates with config overrides applied
    pub fn templates(&self) -> PromptTemplates {
        let defaults = PromptTemplates::default();
        PromptTemplates {
            commit_message: self
                .prompts
                .commit_message
                .clone()
                .unwrap_or(defaults.commit_message),
            daily_summary: self
                .prompts
                .daily_summary
                .clone()
                .unwrap_or(defaults.daily_summary),
            weekly_summary: self
                .prompts
                .weekly_summary
                .clone()
                .unwrap_or(defaults.weekly_summary),
        }
    }
}
