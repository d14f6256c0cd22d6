//! Settings persistence
//!
//! A single flat settings record held in memory behind a lock, with optional
//! JSON file persistence. Reads merge absent fields with defaults; saves
//! overwrite the whole record. A failed file write leaves the in-memory
//! record untouched, so callers never observe a partial update.

pub mod export;
pub mod import;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::models::Settings;

pub use export::ExportFile;
pub use import::{parse_settings_text, ImportError, ImportSummary, MAX_IMPORT_BYTES};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StorageError>;

/// Persistence failures, propagated to the caller as a failed response
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the settings file failed
    #[error("failed to {op} settings file {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file exists but holds invalid JSON
    #[error("settings file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Key-value store for the settings record
///
/// In-memory by default; [`SettingsStore::with_file`] adds JSON file
/// persistence.
pub struct SettingsStore {
    settings: RwLock<Settings>,
    file: Option<PathBuf>,
}

impl SettingsStore {
    /// Create a store with defaults and no file backing.
    pub fn in_memory() -> Self {
        Self {
            settings: RwLock::new(Settings::default()),
            file: None,
        }
    }

    /// Create a store backed by a JSON file. The file is not touched until
    /// the first [`load`](Self::load) or [`save`](Self::save).
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self {
            settings: RwLock::new(Settings::default()),
            file: Some(path.into()),
        }
    }

    /// Seed a store with an initial record (test and import helper).
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings: RwLock::new(settings),
            file: None,
        }
    }

    /// Path of the backing file, if any.
    pub fn file_path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Current in-memory record.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Re-read the backing file (if configured and present) and return the
    /// record. Absent fields take defaults; a missing file leaves the
    /// in-memory record as is.
    pub async fn load(&self) -> StoreResult<Settings> {
        if let Some(path) = &self.file {
            match tokio::fs::read_to_string(path).await {
                Ok(json) => {
                    let settings =
                        Settings::from_json(&json).map_err(|source| StorageError::Corrupt {
                            path: path.clone(),
                            source,
                        })?;
                    *self.settings.write().await = settings.clone();
                    debug!(path = %path.display(), urls = settings.urls.len(), "settings loaded");
                    return Ok(settings);
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "no settings file yet, using defaults");
                }
                Err(source) => {
                    return Err(StorageError::Io {
                        op: "read",
                        path: path.clone(),
                        source,
                    });
                }
            }
        }
        Ok(self.get().await)
    }

    /// Overwrite the whole record, persisting first so a failed write never
    /// leaves memory and disk disagreeing.
    pub async fn save(&self, settings: Settings) -> StoreResult<()> {
        if let Some(path) = &self.file {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|source| StorageError::Io {
                            op: "create directory for",
                            path: path.clone(),
                            source,
                        })?;
                }
            }
            let json = settings
                .to_json()
                .expect("settings record always serializes");
            tokio::fs::write(path, json)
                .await
                .map_err(|source| StorageError::Io {
                    op: "write",
                    path: path.clone(),
                    source,
                })?;
            info!(path = %path.display(), urls = settings.urls.len(), "settings saved");
        }
        *self.settings.write().await = settings;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeRule;

    fn sample_settings() -> Settings {
        Settings {
            urls: vec!["https://a.example".into(), "https://b.example".into()],
            long_wait: 7,
            short_wait: 20,
            pre_refresh: 1.5,
            rules: vec![TimeRule {
                original_url: "https://a.example".into(),
                replacement_url: "https://blank.example".into(),
                start: "08:00".parse().unwrap(),
                end: "18:00".parse().unwrap(),
            }],
        }
    }

    #[tokio::test]
    async fn test_in_memory_get_save() {
        let store = SettingsStore::in_memory();
        assert_eq!(store.get().await, Settings::default());

        store.save(sample_settings()).await.unwrap();
        assert_eq!(store.get().await, sample_settings());
    }

    #[tokio::test]
    async fn test_load_without_file_returns_defaults() {
        let store = SettingsStore::in_memory();
        assert_eq!(store.load().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let store = SettingsStore::with_file(&path);
        store.save(sample_settings()).await.unwrap();
        assert!(path.exists());

        // A fresh store re-reads the same record
        let store2 = SettingsStore::with_file(&path);
        assert_eq!(store2.load().await.unwrap(), sample_settings());
    }

    #[tokio::test]
    async fn test_load_missing_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::with_file(dir.path().join("absent.json"));
        assert_eq!(store.load().await.unwrap(), Settings::default());
    }

    #[tokio::test]
    async fn test_load_merges_partial_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, r#"{"urls": ["https://a.example"], "longWait": 9}"#)
            .await
            .unwrap();

        let store = SettingsStore::with_file(&path);
        let settings = store.load().await.unwrap();
        assert_eq!(settings.urls, vec!["https://a.example"]);
        assert_eq!(settings.long_wait, 9);
        // Absent fields merged with defaults
        assert_eq!(settings.short_wait, 10);
        assert_eq!(settings.pre_refresh, 2.0);
    }

    #[tokio::test]
    async fn test_load_corrupt_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let store = SettingsStore::with_file(&path);
        assert!(matches!(
            store.load().await,
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_save_keeps_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        // A path whose parent is an existing *file* cannot be created
        let blocker = dir.path().join("blocker");
        tokio::fs::write(&blocker, "x").await.unwrap();
        let store = SettingsStore::with_file(blocker.join("settings.json"));

        let before = store.get().await;
        assert!(store.save(sample_settings()).await.is_err());
        assert_eq!(store.get().await, before);
    }
}
