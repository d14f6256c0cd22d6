//! Settings import and validation
//!
//! Parses a pasted or uploaded text blob into a [`Settings`] record.
//! Malformed JSON is reported as a syntax error, distinct from content that
//! parses but fails validation. Numeric fields are clamped into range rather
//! than rejected; any single invalid time rule rejects the entire import, so
//! the store is either replaced wholesale or untouched.

use serde_json::Value;
use thiserror::Error;

use crate::models::{
    validate_url, Settings, TimeOfDay, TimeRule, ValidationError, DEFAULT_LONG_WAIT_MINUTES,
    DEFAULT_PRE_REFRESH_SECS, DEFAULT_SHORT_WAIT_SECS, LONG_WAIT_RANGE, PRE_REFRESH_RANGE,
    SHORT_WAIT_RANGE,
};

/// Upper bound on import payload size.
pub const MAX_IMPORT_BYTES: usize = 1024 * 1024;

/// Import failures, by kind
#[derive(Debug, Error)]
pub enum ImportError {
    /// The payload exceeds [`MAX_IMPORT_BYTES`]
    #[error("import payload is too large ({size} bytes, limit {limit})")]
    TooLarge { size: usize, limit: usize },

    /// The payload is not valid JSON at all
    #[error("invalid JSON syntax: {0}")]
    Syntax(String),

    /// The payload parses but fails structural validation
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// What an import produced, for user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub url_count: usize,
    pub rule_count: usize,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        format!(
            "Imported {} URL(s) and {} time rule(s)",
            self.url_count, self.rule_count
        )
    }
}

/// Parse and validate an imported settings blob.
///
/// On success the returned record is ready to be saved verbatim: URLs are
/// preserved in order, numeric fields are clamped, and every rule has been
/// validated. Unknown top-level fields (export metadata and the like) are
/// ignored.
pub fn parse_settings_text(text: &str) -> Result<Settings, ImportError> {
    if text.len() > MAX_IMPORT_BYTES {
        return Err(ImportError::TooLarge {
            size: text.len(),
            limit: MAX_IMPORT_BYTES,
        });
    }

    let value: Value =
        serde_json::from_str(text).map_err(|err| ImportError::Syntax(err.to_string()))?;

    let urls = parse_urls(&value)?;
    let long_wait = clamp_u32(
        value.get("longWait"),
        DEFAULT_LONG_WAIT_MINUTES,
        LONG_WAIT_RANGE,
    );
    let short_wait = clamp_u32(
        value.get("shortWait"),
        DEFAULT_SHORT_WAIT_SECS,
        SHORT_WAIT_RANGE,
    );
    let pre_refresh = clamp_f64(
        value.get("preRefresh"),
        DEFAULT_PRE_REFRESH_SECS,
        PRE_REFRESH_RANGE,
    );
    let rules = parse_rules(&value)?;

    Ok(Settings {
        urls,
        long_wait,
        short_wait,
        pre_refresh,
        rules,
    })
}

fn parse_urls(value: &Value) -> Result<Vec<String>, ValidationError> {
    let urls = match value.get("urls") {
        None | Some(Value::Null) => return Err(ValidationError::NoUrls),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(ValidationError::NotAnArray { field: "urls" }),
    };
    if urls.is_empty() {
        return Err(ValidationError::NoUrls);
    }

    let mut out = Vec::with_capacity(urls.len());
    for item in urls {
        let url = item.as_str().ok_or_else(|| ValidationError::InvalidUrl {
            url: item.to_string(),
        })?;
        validate_url(url)?;
        out.push(url.to_string());
    }
    Ok(out)
}

fn parse_rules(value: &Value) -> Result<Vec<TimeRule>, ValidationError> {
    let rules = match value.get("timeBasedRules") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ValidationError::NotAnArray {
                field: "timeBasedRules",
            })
        }
    };

    let mut out = Vec::with_capacity(rules.len());
    for item in rules {
        out.push(parse_rule(item)?);
    }
    Ok(out)
}

fn parse_rule(value: &Value) -> Result<TimeRule, ValidationError> {
    let field = |name: &'static str| -> Result<&str, ValidationError> {
        value
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::MissingRuleField { field: name })
    };

    let original_url = field("originalUrl")?;
    let replacement_url = field("replacementUrl")?;
    let start = field("startTime")?;
    let end = field("endTime")?;

    validate_url(original_url)?;
    validate_url(replacement_url)?;
    let start: TimeOfDay = start.parse()?;
    let end: TimeOfDay = end.parse()?;

    Ok(TimeRule {
        original_url: original_url.to_string(),
        replacement_url: replacement_url.to_string(),
        start,
        end,
    })
}

/// Clamp an optional numeric field into range.
///
/// Missing, non-numeric, and zero values take the default (zero meant
/// "unset" in the legacy format); everything else is clamped, not rejected.
fn clamp_u32(value: Option<&Value>, default: u32, (lo, hi): (u32, u32)) -> u32 {
    let raw = value
        .and_then(Value::as_f64)
        .filter(|v| *v != 0.0)
        .unwrap_or(f64::from(default));
    (raw.clamp(f64::from(lo), f64::from(hi))) as u32
}

fn clamp_f64(value: Option<&Value>, default: f64, (lo, hi): (f64, f64)) -> f64 {
    let raw = value
        .and_then(Value::as_f64)
        .filter(|v| *v != 0.0)
        .unwrap_or(default);
    raw.clamp(lo, hi)
}

// ============================================================================
// Tests
// ============================================================================
