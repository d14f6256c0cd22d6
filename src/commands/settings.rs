//! Settings maintenance commands: validate, import, export, add-rule

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::Config;
use crate::models::{TimeOfDay, TimeRule};
use crate::rules::RuleSet;
use crate::storage::{parse_settings_text, ExportFile, ImportSummary, SettingsStore};

/// Validate a settings file without touching the store.
pub async fn validate(file: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let settings = parse_settings_text(&text)?;
    println!(
        "OK: {} URL(s), {} time rule(s), longWait={}m shortWait={}s preRefresh={}s",
        settings.urls.len(),
        settings.rules.len(),
        settings.long_wait,
        settings.short_wait,
        settings.pre_refresh,
    );
    Ok(())
}

/// Import a settings file into the configured store.
pub async fn import(config: &Config, file: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let settings = parse_settings_text(&text)?;
    let summary = ImportSummary {
        url_count: settings.urls.len(),
        rule_count: settings.rules.len(),
    };

    let store = SettingsStore::with_file(&config.settings_path);
    store.save(settings).await?;
    println!("{}", summary.message());
    Ok(())
}

/// Export the stored settings to a timestamped JSON file.
pub async fn export(config: &Config, output_dir: Option<PathBuf>) -> Result<()> {
    let store = SettingsStore::with_file(&config.settings_path);
    let settings = store.load().await?;

    let export = ExportFile::new(settings);
    let path = output_dir
        .unwrap_or_else(|| PathBuf::from("."))
        .join(export.suggested_filename());

    tokio::fs::write(&path, export.to_json()?)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Exported settings to {}", path.display());
    Ok(())
}

/// Add a time rule to the stored settings, enforcing one rule per original
/// URL.
pub async fn add_rule(
    config: &Config,
    original_url: String,
    replacement_url: String,
    start: &str,
    end: &str,
) -> Result<()> {
    let start: TimeOfDay = start.parse()?;
    let end: TimeOfDay = end.parse()?;

    let store = SettingsStore::with_file(&config.settings_path);
    let mut settings = store.load().await?;

    let mut rules = RuleSet::new(std::mem::take(&mut settings.rules));
    rules.try_add(TimeRule {
        original_url: original_url.clone(),
        replacement_url,
        start,
        end,
    })?;
    settings.rules = rules.into_rules();

    store.save(settings).await?;
    println!("Added time rule for {original_url} ({start}-{end})");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
