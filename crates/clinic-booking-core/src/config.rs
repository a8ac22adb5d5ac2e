//! Runtime configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn default_history_turns() -> usize {
    10
}

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingConfig {
    /// Path to the `{clinic, doctors}` reference data file
    pub reference_data: PathBuf,
    /// SQLite ledger file; in-memory when absent
    #[serde(default)]
    pub ledger_path: Option<PathBuf>,
    /// Conversation turns kept per session for model context
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,
    /// Model-assisted extraction; pattern-only when absent
    #[serde(default)]
    pub model: Option<ModelConfig>,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.3
}

/// Chat-completions endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    /// e.g. `https://api.groq.com/openai/v1`
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl ModelConfig {
    /// Read the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

impl BookingConfig {
    /// Configuration with defaults for everything but the reference data.
    pub fn new(reference_data: impl Into<PathBuf>) -> Self {
        Self {
            reference_data: reference_data.into(),
            ledger_path: None,
            history_turns: default_history_turns(),
            model: None,
        }
    }

    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: BookingConfig = serde_json::from_str(json)?;
        if config.history_turns == 0 {
            return Err(ConfigError::Invalid("history_turns must be at least 1".into()));
        }
        Ok(config)
    }

    /// Load configuration from a JSON file. Relative paths inside the file are
    /// resolved against the file's directory.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config = Self::from_json_str(&json)?;

        if let Some(base) = path.parent() {
            if config.reference_data.is_relative() {
                config.reference_data = base.join(&config.reference_data);
            }
            if let Some(ledger) = config.ledger_path.as_mut() {
                if ledger.is_relative() {
                    *ledger = base.join(&*ledger);
                }
            }
        }
        Ok(config)
    }
}
