//! Command routing
//!
//! UI surfaces talk to the engine through a closed set of commands carried
//! as JSON with an `action` discriminator. Every command has exactly one
//! handler; the responses keep the historical `{success, ...}` shapes so
//! existing front ends keep working.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::Settings;
use crate::scheduler::RotationScheduler;
use crate::storage::{parse_settings_text, ImportSummary, SettingsStore};

/// A UI-originated command
///
/// Wire form: `{"action": "start"}`, `{"action": "saveSettings",
/// "settings": {...}}`, and so on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    /// Is the rotation running?
    GetStatus,
    /// Fetch the current settings record
    GetSettings,
    /// Overwrite the settings record
    SaveSettings { settings: Settings },
    /// Parse, validate, and store a pasted/uploaded settings blob
    ImportFromText { text: String },
    /// Start (or restart) the rotation cycle
    Start,
    /// Pause the rotation cycle
    Pause,
}

impl Command {
    /// The wire name of the command, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetStatus => "getStatus",
            Self::GetSettings => "getSettings",
            Self::SaveSettings { .. } => "saveSettings",
            Self::ImportFromText { .. } => "importFromText",
            Self::Start => "start",
            Self::Pause => "pause",
        }
    }
}

/// Response to a command
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// `getStatus` response
    Status {
        #[serde(rename = "isRunning")]
        is_running: bool,
    },
    /// `getSettings` response
    Settings { success: bool, settings: Settings },
    /// Everything else: `{success: true}` with an optional message, or
    /// `{success: false, error}`
    Outcome {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl Response {
    pub fn ok() -> Self {
        Self::Outcome {
            success: true,
            message: None,
            error: None,
        }
    }

    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Self::Outcome {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn error(error: impl ToString) -> Self {
        Self::Outcome {
            success: false,
            message: None,
            error: Some(error.to_string()),
        }
    }

    /// Whether the command succeeded.
    pub fn is_success(&self) -> bool {
        match self {
            Self::Status { .. } => true,
            Self::Settings { success, .. } => *success,
            Self::Outcome { success, .. } => *success,
        }
    }
}

/// Dispatches commands to the settings store and the scheduler
pub struct Router {
    store: Arc<SettingsStore>,
    scheduler: Arc<RotationScheduler>,
}

impl Router {
    pub fn new(store: Arc<SettingsStore>, scheduler: Arc<RotationScheduler>) -> Self {
        Self { store, scheduler }
    }

    /// Handle one command.
    pub async fn dispatch(&self, command: Command) -> Response {
        info!(action = command.action(), "dispatching command");
        match command {
            Command::GetStatus => self.get_status().await,
            Command::GetSettings => self.get_settings().await,
            Command::SaveSettings { settings } => self.save_settings(settings).await,
            Command::ImportFromText { text } => self.import_from_text(&text).await,
            Command::Start => self.start().await,
            Command::Pause => self.pause().await,
        }
    }

    /// Handle one command carried as JSON text, answering in kind.
    pub async fn dispatch_json(&self, text: &str) -> String {
        let response = match serde_json::from_str::<Command>(text) {
            Ok(command) => self.dispatch(command).await,
            Err(err) => {
                warn!(%err, "unparseable command");
                Response::error(format!("unrecognized command: {err}"))
            }
        };
        serde_json::to_string(&response).expect("responses always serialize")
    }

    async fn get_status(&self) -> Response {
        Response::Status {
            is_running: self.scheduler.status().await.is_running,
        }
    }

    async fn get_settings(&self) -> Response {
        match self.store.load().await {
            Ok(settings) => Response::Settings {
                success: true,
                settings,
            },
            Err(err) => Response::error(err),
        }
    }

    async fn save_settings(&self, settings: Settings) -> Response {
        if let Err(err) = settings.validate() {
            return Response::error(err);
        }
        match self.store.save(settings.clone()).await {
            Ok(()) => {
                // A running cycle picks up new delays and rules immediately
                self.scheduler.apply_settings(&settings).await;
                Response::ok()
            }
            Err(err) => Response::error(err),
        }
    }

    async fn import_from_text(&self, text: &str) -> Response {
        let settings = match parse_settings_text(text) {
            Ok(settings) => settings,
            Err(err) => return Response::error(err),
        };
        let summary = ImportSummary {
            url_count: settings.urls.len(),
            rule_count: settings.rules.len(),
        };
        match self.store.save(settings.clone()).await {
            Ok(()) => {
                self.scheduler.apply_settings(&settings).await;
                Response::ok_with_message(summary.message())
            }
            Err(err) => Response::error(err),
        }
    }

    async fn start(&self) -> Response {
        match self.scheduler.start().await {
            Ok(_) => Response::ok(),
            Err(err) => Response::error(err),
        }
    }

    async fn pause(&self) -> Response {
        self.scheduler.pause().await;
        Response::ok()
    }
}

// ============================================================================
// Tests
// ============================================================================
