//! Core data structures for the rotation engine
//!
//! The settings record mirrors the persisted JSON shape (`urls`, `longWait`,
//! `shortWait`, `preRefresh`, `timeBasedRules`) so that files written by older
//! deployments keep loading unchanged.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use chrono::{Local, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Validation
// ============================================================================

/// Boundary validation failures (bad URL, bad time, duplicate rule)
///
/// These are rejected before any state change, leaving the original
/// settings untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The URL list is missing or empty
    #[error("no URLs configured; add at least one URL")]
    NoUrls,

    /// A URL failed to parse
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// A time string does not match HH:MM
    #[error("invalid time '{value}', expected HH:MM in 24h format")]
    InvalidTime { value: String },

    /// A time rule is missing a required field
    #[error("time rule is missing required field '{field}'")]
    MissingRuleField { field: &'static str },

    /// A rule already exists for this original URL
    #[error("a rule already exists for {url}")]
    DuplicateRule { url: String },

    /// A field that must be an array held something else
    #[error("'{field}' must be an array")]
    NotAnArray { field: &'static str },
}

/// Check that a string parses as an absolute URL.
pub fn validate_url(s: &str) -> Result<(), ValidationError> {
    url::Url::parse(s).map(|_| ()).map_err(|_| ValidationError::InvalidUrl {
        url: s.to_string(),
    })
}

// ============================================================================
// Time of day
// ============================================================================

fn time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([01]?[0-9]|2[0-3]):([0-5][0-9])$").unwrap())
}

/// A validated wall-clock time of day (24h)
///
/// Parsed from `"HH:MM"`; serialized back to the same form. The `hhmm`
/// integer form (`15:30` → `1530`) is what window range tests compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Create from components, rejecting out-of-range values.
    pub fn new(hour: u8, minute: u8) -> Result<Self, ValidationError> {
        if hour > 23 || minute > 59 {
            return Err(ValidationError::InvalidTime {
                value: format!("{hour:02}:{minute:02}"),
            });
        }
        Ok(Self { hour, minute })
    }

    /// The current local time of day.
    pub fn now_local() -> Self {
        let now = Local::now().time();
        Self {
            hour: now.hour() as u8,
            minute: now.minute() as u8,
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Integer `HHMM` form used for range comparisons.
    pub fn hhmm(&self) -> u16 {
        self.hour as u16 * 100 + self.minute as u16
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = time_pattern()
            .captures(s)
            .ok_or_else(|| ValidationError::InvalidTime {
                value: s.to_string(),
            })?;
        // The pattern guarantees both groups are small decimal integers.
        let hour: u8 = caps[1].parse().unwrap_or(0);
        let minute: u8 = caps[2].parse().unwrap_or(0);
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

// ============================================================================
// Time rule
// ============================================================================

/// A time-windowed URL substitution rule
///
/// While the window is active the original URL is shown; outside it the
/// replacement is shown. Windows where `start > end` wrap past midnight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRule {
    pub original_url: String,
    pub replacement_url: String,
    #[serde(rename = "startTime")]
    pub start: TimeOfDay,
    #[serde(rename = "endTime")]
    pub end: TimeOfDay,
}

impl TimeRule {
    /// Validate both URLs; the times are already validated by construction.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_url(&self.original_url)?;
        validate_url(&self.replacement_url)?;
        Ok(())
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Clamp range for the long wait, in minutes.
pub const LONG_WAIT_RANGE: (u32, u32) = (1, 60);
/// Clamp range for the short wait, in seconds.
pub const SHORT_WAIT_RANGE: (u32, u32) = (1, 300);
/// Clamp range for the pre-refresh delay, in seconds.
pub const PRE_REFRESH_RANGE: (f64, f64) = (0.5, 10.0);

pub const DEFAULT_LONG_WAIT_MINUTES: u32 = 5;
pub const DEFAULT_SHORT_WAIT_SECS: u32 = 10;
pub const DEFAULT_PRE_REFRESH_SECS: f64 = 2.0;

/// The persisted settings record
///
/// Overwritten wholesale on save and import; absent fields fall back to the
/// defaults on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Target URLs, in rotation order. Duplicates are allowed.
    pub urls: Vec<String>,

    /// Wait after completing a full lap, in minutes.
    pub long_wait: u32,

    /// Wait between tabs within a lap, in seconds.
    pub short_wait: u32,

    /// Delay between focusing a tab and reloading it, in seconds.
    pub pre_refresh: f64,

    /// Time-of-day URL substitution rules.
    #[serde(rename = "timeBasedRules")]
    pub rules: Vec<TimeRule>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            long_wait: DEFAULT_LONG_WAIT_MINUTES,
            short_wait: DEFAULT_SHORT_WAIT_SECS,
            pre_refresh: DEFAULT_PRE_REFRESH_SECS,
            rules: Vec::new(),
        }
    }
}

impl Settings {
    /// Long-wait duration (once per lap).
    pub fn long_wait(&self) -> Duration {
        Duration::from_secs(u64::from(self.long_wait) * 60)
    }

    /// Short-wait duration (between tabs within a lap).
    pub fn short_wait(&self) -> Duration {
        Duration::from_secs(u64::from(self.short_wait))
    }

    /// Pre-refresh delay.
    pub fn pre_refresh(&self) -> Duration {
        Duration::from_secs_f64(self.pre_refresh.max(0.0))
    }

    /// Validate the whole record at the save/import boundary.
    ///
    /// Requires a non-empty URL list of well-formed URLs and individually
    /// valid rules. Numeric fields are clamped elsewhere, not rejected here.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.urls.is_empty() {
            return Err(ValidationError::NoUrls);
        }
        for url in &self.urls {
            validate_url(url)?;
        }
        for rule in &self.rules {
            rule.validate()?;
        }
        Ok(())
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON, substituting defaults for absent fields.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ============================================================================
// Tests
// ============================================================================
