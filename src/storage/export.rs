//! Settings export
//!
//! Wraps the settings record with provenance metadata (timestamp, version,
//! application name) and suggests a filename carrying a sanitized timestamp,
//! so exports sort chronologically and survive filesystems that reject `:`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Settings;

const APPLICATION_NAME: &str = "zoetrope";

/// An exported settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    #[serde(flatten)]
    pub settings: Settings,

    /// When the export was produced.
    pub export_date: DateTime<Utc>,

    /// Version of the application that wrote the file.
    pub version: String,

    /// Application name, for humans inspecting the file.
    pub application: String,
}

impl ExportFile {
    /// Wrap a settings record with the current timestamp and version.
    pub fn new(settings: Settings) -> Self {
        Self::at(settings, Utc::now())
    }

    /// Wrap a settings record with an explicit timestamp.
    pub fn at(settings: Settings, export_date: DateTime<Utc>) -> Self {
        Self {
            settings,
            export_date,
            version: env!("CARGO_PKG_VERSION").to_string(),
            application: APPLICATION_NAME.to_string(),
        }
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Suggested filename, e.g. `zoetrope-settings-2026-08-07T09-30-00.json`.
    pub fn suggested_filename(&self) -> String {
        format!(
            "{}-settings-{}.json",
            APPLICATION_NAME,
            self.export_date.format("%Y-%m-%dT%H-%M-%S")
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
