use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::events::GenerationMode;

/// Environment variables checked for the API key, in order of precedence.
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Gemini API key; environment variables take precedence
    pub api_key: Option<String>,

    /// Base URL of the Generative Language API
    pub api_base: String,

    /// Model used when thinking mode is off
    pub fast_model: String,

    /// Model used when thinking mode is on
    pub thinking_model: String,

    /// Reasoning token budget requested in thinking mode
    pub thinking_budget: u32,

    /// Give up on a reply after this long without any bytes from Gemini
    pub idle_timeout_secs: u64,

    /// UI preferences
    pub ui: UiConfig,

    /// ifluxone home directory
    #[serde(skip)]
    pub home: PathBuf,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub title: String,
    pub start_open: bool,
    pub tick_rate_ms: u64,
}

/// Model selection for a single send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelProfile {
    pub model: String,
    pub thinking_budget: Option<u32>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "iFLUXONE".to_string(),
            start_open: false,
            tick_rate_ms: 50,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ifluxone");

        Config {
            api_key: None,
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            fast_model: "gemini-2.5-flash".to_string(),
            thinking_model: "gemini-2.5-pro".to_string(),
            thinking_budget: 32768,
            idle_timeout_secs: 120,
            ui: UiConfig::default(),
            home,
        }
    }
}

impl Config {
    /// Load configuration from `~/.ifluxone/config.toml`, falling back to defaults
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir()
            .context("Could not find home directory")?
            .join(".ifluxone");
        Self::load_from(&home)
    }

    /// Load configuration rooted at an explicit home directory
    pub fn load_from(home: &Path) -> Result<Self> {
        fs::create_dir_all(home).context("Failed to create .ifluxone directory")?;

        let config_path = home.join("config.toml");
        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.home = home.to_path_buf();
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(self.config_path(), content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    pub fn log_path(&self) -> PathBuf {
        self.home.join("ifluxone.log")
    }

    /// Resolve the API key from the environment, then the config file
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::api_key`] with an injectable environment lookup.
    pub fn api_key_with<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        API_KEY_ENV_VARS
            .iter()
            .find_map(|name| lookup(name).filter(|key| !key.trim().is_empty()))
            .or_else(|| self.api_key.clone().filter(|key| !key.trim().is_empty()))
    }

    pub fn set_api_key(&mut self, key: String) {
        self.api_key = Some(key);
    }

    /// Model and reasoning budget for the given mode
    pub fn profile_for(&self, mode: GenerationMode) -> ModelProfile {
        match mode {
            GenerationMode::Fast => ModelProfile {
                model: self.fast_model.clone(),
                thinking_budget: None,
            },
            GenerationMode::Thinking => ModelProfile {
                model: self.thinking_model.clone(),
                thinking_budget: Some(self.thinking_budget),
            },
        }
    }
}

/// Mask all but the last four characters of a secret for display
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}
