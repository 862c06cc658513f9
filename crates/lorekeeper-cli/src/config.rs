//! Configuration management for the CLI.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// Default campaign
    #[serde(default = "default_campaign")]
    pub campaign: String,

    /// Ollama endpoint
    #[serde(default = "default_endpoint")]
    pub ollama_endpoint: String,

    /// Ollama model
    #[serde(default = "default_model")]
    pub ollama_model: String,

    /// Language for generated descriptions
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lorekeeper")
        .join("lorekeeper.db")
}

fn default_campaign() -> String {
    "default".to_string()
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_language() -> String {
    "English".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            campaign: default_campaign(),
            ollama_endpoint: default_endpoint(),
            ollama_model: default_model(),
            language: default_language(),
        }
    }
}

impl Config {
    /// Get the configuration file path.
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not find config directory")?;
        Ok(config_dir.join("lorekeeper").join("config.toml"))
    }

    /// Load configuration from file or create default.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.campaign, config.campaign);
        assert_eq!(parsed.ollama_model, config.ollama_model);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = toml::from_str(r#"campaign = "westmarch""#).unwrap();
        assert_eq!(parsed.campaign, "westmarch");
        assert_eq!(parsed.ollama_model, "llama3");
        assert_eq!(parsed.language, "English");
    }
}
