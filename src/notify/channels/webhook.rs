//! Webhook notice channel
//!
//! Posts each notice as a JSON payload. Useful for wall-mounted dashboard
//! setups where the machine driving the screens reports into a chat hook or
//! monitoring endpoint.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::notify::Notice;

/// Webhook channel configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL endpoint
    pub url: String,
    /// Optional bearer token
    pub auth_token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            timeout_secs: default_timeout(),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("webhook URL cannot be empty".to_string());
        }
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err("webhook URL must start with http:// or https://".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Webhook notice channel
///
/// Sends notices as JSON via HTTP POST:
///
/// ```json
/// {
///   "id": "notice-uuid",
///   "kind": "started",
///   "title": "Tab rotation started",
///   "message": "Cycling through 4 tab(s). Starting 5-minute wait.",
///   "created_at": "2026-08-07T09:30:00Z"
/// }
/// ```
#[derive(Debug)]
pub struct WebhookChannel {
    config: WebhookConfig,
    client: Client,
}

impl WebhookChannel {
    pub fn new(config: WebhookConfig) -> ChannelResult<Self> {
        config.validate().map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ChannelError::Http)?;

        Ok(Self { config, client })
    }

    /// Create a channel with just a URL and defaults.
    pub fn from_url(url: impl Into<String>) -> ChannelResult<Self> {
        Self::new(WebhookConfig::new(url))
    }
}

#[async_trait]
impl Channel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, notice: &Notice) -> ChannelResult<DeliveryStatus> {
        let mut request = self.client.post(&self.config.url).json(notice);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(DeliveryStatus::success("webhook"))
        } else {
            Err(ChannelError::Rejected(status.as_u16()))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
