//! Configuration for the chat client

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variables consulted for the API key, in priority order
const API_KEY_VARS: &[&str] = &["API_KEY", "GEMINI_API_KEY"];

/// Environment variable overriding the generation model
const MODEL_VAR: &str = "GEMINI_MODEL";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Gemini API configuration
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Local persistence configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

impl ChatConfig {
    /// Load configuration from an optional TOML file, then apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path)?;
                let config: ChatConfig = toml::from_str(&content)?;
                tracing::debug!("Loaded configuration from {}", path.display());
                config
            }
            None => ChatConfig::default(),
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in production)
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = API_KEY_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty())
        {
            self.gemini.api_key = key;
        }

        if let Some(model) = lookup(MODEL_VAR).filter(|m| !m.trim().is_empty()) {
            self.gemini.model = model;
        }
    }
}

/// Gemini API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (usually supplied through `API_KEY`)
    pub api_key: String,
    /// Model supporting the URL context tool
    pub model: String,
    /// API base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Block threshold applied to every safety category
    pub safety_threshold: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 120,
            safety_threshold: "BLOCK_MEDIUM_AND_ABOVE".to_string(),
        }
    }
}

impl GeminiConfig {
    /// Check the configuration before any client is built
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::config(
                "Gemini API Key not configured. Set the API_KEY environment variable.",
            ));
        }
        if self.model.trim().is_empty() {
            return Err(Error::config("Gemini model name must not be empty"));
        }
        url::Url::parse(&self.base_url)
            .map_err(|e| Error::config(format!("Invalid Gemini base URL '{}': {}", self.base_url, e)))?;
        if self.timeout_secs == 0 {
            return Err(Error::config("Gemini timeout must be at least one second"));
        }
        Ok(())
    }
}

/// Local persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the knowledge base and conversation files
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
            .join("contextual-chat");

        Self { data_dir }
    }
}
