//! Notice delivery channels

pub mod webhook;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use super::Notice;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur during notice delivery
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid channel configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Channel temporarily unavailable
    #[error("channel temporarily unavailable: {0}")]
    Unavailable(String),

    /// The remote endpoint rejected the notice
    #[error("delivery rejected with status {0}")]
    Rejected(u16),
}

/// Outcome of one delivery attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatus {
    pub success: bool,
    pub channel: String,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DeliveryStatus {
    pub fn success(channel: impl Into<String>) -> Self {
        Self {
            success: true,
            channel: channel.into(),
            message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel: channel.into(),
            message: Some(message.into()),
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILED" };
        write!(f, "[{status}] {}", self.channel)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

/// Trait for notice delivery channels
///
/// Implement this trait to route notices somewhere new.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &str;

    /// Deliver a notice through this channel
    async fn send(&self, notice: &Notice) -> ChannelResult<DeliveryStatus>;
}

/// Channel that writes notices to the structured log
///
/// Always registered by the CLI, so every notice is visible even with no
/// webhook configured.
#[derive(Debug, Default)]
pub struct LogChannel;

#[async_trait]
impl Channel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, notice: &Notice) -> ChannelResult<DeliveryStatus> {
        info!(
            kind = notice.kind.as_str(),
            title = %notice.title,
            message = %notice.message,
            "notice"
        );
        Ok(DeliveryStatus::success("log"))
    }
}
