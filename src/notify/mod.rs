//! User-visible notifications
//!
//! The scheduler reports lifecycle moments (started, paused, configuration
//! error, rotation drained) as [`Notice`]s. A [`NotificationHub`] fans each
//! notice out to the registered channels; delivery failures are logged and
//! never affect the rotation itself.

pub mod channels;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

pub use channels::webhook::{WebhookChannel, WebhookConfig};
pub use channels::{Channel, ChannelError, ChannelResult, DeliveryStatus, LogChannel};

/// What kind of moment a notice reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// A rotation cycle started
    Started,
    /// The cycle was paused by request
    Paused,
    /// A start was rejected due to bad configuration
    ConfigurationError,
    /// The cycle stopped because every tracked tab was closed
    Drained,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Paused => "paused",
            Self::ConfigurationError => "configuration_error",
            Self::Drained => "drained",
        }
    }
}

/// A single user-visible notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub id: Uuid,
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    fn new(kind: NoticeKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into(),
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    /// The rotation cycle started with `tab_count` tabs.
    pub fn started(tab_count: usize, long_wait: Duration) -> Self {
        Self::new(
            NoticeKind::Started,
            "Tab rotation started",
            format!(
                "Cycling through {tab_count} tab(s). Starting {}-minute wait.",
                long_wait.as_secs() / 60
            ),
        )
    }

    /// The rotation cycle was paused.
    pub fn paused() -> Self {
        Self::new(
            NoticeKind::Paused,
            "Tab rotation paused",
            "The rotation cycle has been paused. Tabs remain open.",
        )
    }

    /// A start was rejected due to configuration.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::new(
            NoticeKind::ConfigurationError,
            "Tab rotation error",
            message,
        )
    }

    /// Every tracked tab was closed, so the cycle stopped itself.
    pub fn drained() -> Self {
        Self::new(
            NoticeKind::Drained,
            "Tab rotation stopped",
            "All managed tabs were closed; the rotation cycle has stopped.",
        )
    }
}

/// Fan-out point for notices
///
/// Channels are registered at construction time; publishing never fails from
/// the caller's point of view.
#[derive(Default)]
pub struct NotificationHub {
    channels: Vec<Box<dyn Channel>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    /// Add a delivery channel.
    pub fn add_channel(&mut self, channel: Box<dyn Channel>) {
        self.channels.push(channel);
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Deliver a notice to every channel. Failures are logged, not returned.
    pub async fn publish(&self, notice: Notice) {
        for channel in &self.channels {
            if let Err(err) = channel.send(&notice).await {
                error!(channel = channel.name(), %err, "notice delivery failed");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
