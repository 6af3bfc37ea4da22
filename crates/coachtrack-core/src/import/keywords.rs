//! Keyword tables that turn free-text notes into health-issue tags and
//! a program status.
//!
//! Matching is a case-insensitive substring scan. Tables are ordered:
//! health-issue tags accumulate in table order, status rules stop at the
//! first hit.

use crate::models::{ClientStatus, NO_HEALTH_ISSUES};

/// One trigger list and the value it produces.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRule<T> {
    /// Lowercase substrings, any of which fires the rule
    pub triggers: Vec<String>,
    pub outcome: T,
}

impl<T> KeywordRule<T> {
    pub fn new(triggers: &[&str], outcome: T) -> Self {
        Self {
            triggers: triggers.iter().map(|t| t.to_lowercase()).collect(),
            outcome,
        }
    }

    fn fires(&self, haystack_lower: &str) -> bool {
        self.triggers.iter().any(|t| haystack_lower.contains(t.as_str()))
    }
}

/// Health-issue and status keyword tables.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    health_issues: Vec<KeywordRule<String>>,
    status_rules: Vec<KeywordRule<ClientStatus>>,
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordTable {
    /// Create a table with the default keyword mappings.
    pub fn new() -> Self {
        Self {
            health_issues: Self::default_health_issues(),
            status_rules: Self::default_status_rules(),
        }
    }

    /// Health-issue tags mentioned in `notes`, or `["None"]`.
    pub fn health_issues(&self, notes: &str) -> Vec<String> {
        let lower = notes.to_lowercase();
        let mut tags: Vec<String> = self
            .health_issues
            .iter()
            .filter(|rule| rule.fires(&lower))
            .map(|rule| rule.outcome.clone())
            .collect();
        if tags.is_empty() {
            tags.push(NO_HEALTH_ISSUES.to_string());
        }
        tags
    }

    /// Status explicitly stated in `notes`, if any.
    pub fn status_from_notes(&self, notes: &str) -> Option<ClientStatus> {
        let lower = notes.to_lowercase();
        self.status_rules
            .iter()
            .find(|rule| rule.fires(&lower))
            .map(|rule| rule.outcome)
    }

    /// Full status derivation: note keywords first, then reading count.
    pub fn derive_status(&self, notes: &str, entry_count: usize) -> ClientStatus {
        match self.status_from_notes(notes) {
            Some(status) => status,
            None if entry_count <= 1 => ClientStatus::YetToStart,
            None => ClientStatus::Active,
        }
    }

    /// Append a health-issue rule.
    pub fn add_health_issue(&mut self, triggers: &[&str], tag: &str) {
        self.health_issues.push(KeywordRule::new(triggers, tag.to_string()));
    }

    /// Append a status rule (lowest precedence).
    pub fn add_status_rule(&mut self, triggers: &[&str], status: ClientStatus) {
        self.status_rules.push(KeywordRule::new(triggers, status));
    }

    fn default_health_issues() -> Vec<KeywordRule<String>> {
        vec![
            KeywordRule::new(&["diabetes"], "Diabetes".into()),
            KeywordRule::new(&["hypertension", "blood pressure"], "High Blood Pressure".into()),
            KeywordRule::new(&["constipation", "constipated"], "Constipation".into()),
            KeywordRule::new(&["bloated"], "Bloating".into()),
            KeywordRule::new(&["pain"], "Pain Issues".into()),
        ]
    }

    fn default_status_rules() -> Vec<KeywordRule<ClientStatus>> {
        vec![
            KeywordRule::new(&["paused", "break"], ClientStatus::Inactive),
            KeywordRule::new(&["ending", "ended"], ClientStatus::Completed),
        ]
    }
}
