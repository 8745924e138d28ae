//! Run configuration
//!
//! Paths are stored as given and resolved against `project_root` when used,
//! so the same config works from any working directory.

use crate::error::{FlowError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_TABLE_NAME: &str = "customer_support_tickets";
pub const DEFAULT_DATABASE_PATH: &str = "data/customer_support_tickets.db";
pub const DEFAULT_CSV_PATH: &str = "data/customer_support_tickets.csv";
pub const DEFAULT_SUMMARY_PATH: &str = "executive_summary.md";
pub const DEFAULT_MAX_AGENT_STEPS: usize = 15;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_temperature() -> f64 {
    0.1
}

impl LlmConfig {
    /// Reads `OPENAI_API_KEY`, `OPENAI_MODEL` and `OPENAI_BASE_URL`.
    /// An explicit key wins over the environment.
    pub fn from_env(api_key: Option<String>) -> Result<Self> {
        let api_key = api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                FlowError::Config(
                    "OpenAI API key required. Set OPENAI_API_KEY env var or use --api-key"
                        .to_string(),
                )
            })?;

        Ok(Self {
            api_key,
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            temperature: default_temperature(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    pub project_root: PathBuf,
    pub table_name: String,
    pub csv_path: PathBuf,
    pub database_path: PathBuf,
    pub summary_path: PathBuf,
    pub max_agent_steps: usize,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            summary_path: PathBuf::from(DEFAULT_SUMMARY_PATH),
            max_agent_steps: DEFAULT_MAX_AGENT_STEPS,
        }
    }
}

impl FlowConfig {
    /// Defaults overridden by `SUPPORT_FLOW_PROJECT_ROOT` and
    /// `SUPPORT_FLOW_MAX_STEPS`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(root) = std::env::var("SUPPORT_FLOW_PROJECT_ROOT") {
            config.project_root = PathBuf::from(root);
        }

        if let Ok(steps) = std::env::var("SUPPORT_FLOW_MAX_STEPS") {
            config.max_agent_steps = steps.trim().parse().map_err(|_| {
                FlowError::Config(format!(
                    "SUPPORT_FLOW_MAX_STEPS must be a positive integer, got '{}'",
                    steps
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// A config rooted at `root`, with every other field at its default.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: root.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(FlowError::Config("table_name cannot be empty".to_string()));
        }
        if self.max_agent_steps == 0 {
            return Err(FlowError::Config("max_agent_steps must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.project_root.join(path)
    }

    pub fn csv_file(&self) -> PathBuf {
        self.resolve(&self.csv_path)
    }

    pub fn database_file(&self) -> PathBuf {
        self.resolve(&self.database_path)
    }

    pub fn summary_file(&self) -> PathBuf {
        self.resolve(&self.summary_path)
    }
}
