//! Runtime configuration
//!
//! This is the application-level configuration (where the settings file
//! lives, where notices go, how to log), not the rotation settings record
//! itself, which is user data managed by [`crate::storage::SettingsStore`].
//! Loaded from environment variables or a TOML file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path of the persisted settings record.
    pub settings_path: PathBuf,

    /// Notification configuration.
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Notification delivery configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Optional webhook endpoint for notices.
    pub webhook_url: Option<String>,

    /// Optional bearer token for the webhook.
    pub webhook_token: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let settings_path = std::env::var("ZOETROPE_SETTINGS_PATH")
            .unwrap_or_else(|_| String::from("data/settings.json"))
            .into();

        let webhook_url = std::env::var("ZOETROPE_WEBHOOK_URL").ok();
        let webhook_token = std::env::var("ZOETROPE_WEBHOOK_TOKEN").ok();

        let level = std::env::var("ZOETROPE_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));
        let format = std::env::var("ZOETROPE_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            settings_path,
            notifications: NotificationConfig {
                webhook_url,
                webhook_token,
            },
            logging: LoggingConfig { level, format },
        })
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.settings_path.as_os_str().is_empty() {
            anyhow::bail!("settings_path must not be empty");
        }

        if let Some(url) = &self.notifications.webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("webhook_url must start with http:// or https://");
            }
        }

        match self.logging.format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("unknown log format '{other}', expected text or json"),
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
