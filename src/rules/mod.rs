//! Time-of-day URL substitution
//!
//! A rule keeps its original URL on screen while the configured window is
//! active and swaps in the replacement outside it. Evaluation is a pure
//! function of the rule list and the current wall-clock time; the scheduler
//! re-evaluates on every tab visit rather than caching, because the answer
//! changes as the clock moves.

use crate::models::{TimeOfDay, TimeRule, ValidationError};

/// Test whether `now` falls inside the `[start, end)` window.
///
/// Windows with `start > end` wrap past midnight (e.g. 15:00–00:00 covers
/// the evening and nothing after midnight). A zero-width window
/// (`start == end`) is never active.
pub fn in_window(now: TimeOfDay, start: TimeOfDay, end: TimeOfDay) -> bool {
    let (now, start, end) = (now.hhmm(), start.hhmm(), end.hhmm());
    if start > end {
        now >= start || now < end
    } else {
        now >= start && now < end
    }
}

/// An ordered collection of substitution rules
///
/// Lookup is an exact match on the original URL; the first matching rule
/// wins. Duplicate prevention happens at the rule-addition boundary, not
/// here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    rules: Vec<TimeRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<TimeRule>) -> Self {
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn rules(&self) -> &[TimeRule] {
        &self.rules
    }

    /// Resolve the URL a tab should display right now.
    ///
    /// Active window ⇒ the original URL; inactive ⇒ the replacement; no
    /// matching rule ⇒ the input unchanged.
    pub fn active_url<'a>(&'a self, base: &'a str, now: TimeOfDay) -> &'a str {
        for rule in &self.rules {
            if rule.original_url == base {
                return if in_window(now, rule.start, rule.end) {
                    &rule.original_url
                } else {
                    &rule.replacement_url
                };
            }
        }
        base
    }

    /// Resolve every URL in a list, preserving order.
    pub fn active_urls(&self, bases: &[String], now: TimeOfDay) -> Vec<String> {
        bases
            .iter()
            .map(|base| self.active_url(base, now).to_string())
            .collect()
    }

    /// Add a rule, enforcing the one-rule-per-original-URL invariant.
    pub fn try_add(&mut self, rule: TimeRule) -> Result<(), ValidationError> {
        rule.validate()?;
        if self.rules.iter().any(|r| r.original_url == rule.original_url) {
            return Err(ValidationError::DuplicateRule {
                url: rule.original_url,
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Remove the rule for an original URL. Returns whether one existed.
    pub fn remove(&mut self, original_url: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.original_url != original_url);
        self.rules.len() != before
    }

    pub fn into_rules(self) -> Vec<TimeRule> {
        self.rules
    }
}

// ============================================================================
// Tests
// ============================================================================
