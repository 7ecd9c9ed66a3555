use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ChatonError, Result};

/// Top-level configuration for the ChatOn server.
///
/// Loaded from `~/.chaton/config.toml` by default. Every section is optional
/// and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatonConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl ChatonConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ChatonConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file is missing
    /// or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reject values that would make matching or classification meaningless.
    pub fn validate(&self) -> Result<()> {
        let t = self.matching.similarity_threshold;
        if !(0.0..=1.0).contains(&t) {
            return Err(ChatonError::Config(format!(
                "matching.similarity_threshold must be within 0..=1, got {}",
                t
            )));
        }
        if self.sentiment.negative_threshold >= self.sentiment.positive_threshold {
            return Err(ChatonError::Config(
                "sentiment.negative_threshold must be below positive_threshold".to_string(),
            ));
        }
        if self.search.result_limit == 0 {
            return Err(ChatonError::Config(
                "search.result_limit must be at least 1".to_string(),
            ));
        }
        if self.auth.pbkdf2_iterations == 0 {
            return Err(ChatonError::Config(
                "auth.pbkdf2_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// General server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Interface to bind.
    pub host: String,
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.chaton/data".to_string(),
            log_level: "info".to_string(),
            host: "127.0.0.1".to_string(),
            port: 5055,
        }
    }
}

/// Fuzzy product-name matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Names match when their similarity ratio is strictly above this.
    pub similarity_threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: crate::matching::DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

/// Polarity cut-offs for classifying free-text feedback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    pub positive_threshold: f64,
    pub negative_threshold: f64,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            positive_threshold: 0.2,
            negative_threshold: -0.2,
        }
    }
}

/// Description search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub result_limit: u64,
    /// Descriptions longer than this are cut and suffixed with "...".
    pub snippet_chars: usize,
    /// Queries shorter than this (after trimming) ask the user for more detail.
    pub min_query_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_limit: 5,
            snippet_chars: 80,
            min_query_chars: 3,
        }
    }
}

/// Chat relay to the external NLU dialogue server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// REST webhook of the dialogue server.
    pub nlu_url: String,
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            nlu_url: "http://localhost:5005/webhooks/rest/webhook".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Storefront authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// PBKDF2 rounds used for newly hashed passwords.
    pub pbkdf2_iterations: u32,
    /// Idle minutes before a login session is dropped.
    pub session_timeout_minutes: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: 600_000,
            session_timeout_minutes: 720,
        }
    }
}
