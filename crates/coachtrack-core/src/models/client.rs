//! Client models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Tag used when a client has no known health issues.
pub const NO_HEALTH_ISSUES: &str = "None";

/// ISO-8601 calendar date format used for every stored date.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Program status of a client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ClientStatus {
    /// Currently following the program
    Active,
    /// Paused or on a break
    Inactive,
    /// Signed up, no readings yet
    YetToStart,
    /// Program finished
    Completed,
}

impl ClientStatus {
    /// All statuses, in display order.
    pub const ALL: [ClientStatus; 4] = [
        ClientStatus::Active,
        ClientStatus::Inactive,
        ClientStatus::YetToStart,
        ClientStatus::Completed,
    ];

    /// Wire/storage spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Active => "active",
            ClientStatus::Inactive => "inactive",
            ClientStatus::YetToStart => "yet-to-start",
            ClientStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown client status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ClientStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "active" => Ok(ClientStatus::Active),
            "inactive" => Ok(ClientStatus::Inactive),
            "yet-to-start" => Ok(ClientStatus::YetToStart),
            "completed" => Ok(ClientStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// One weight reading. At most one per client per day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightEntry {
    /// Calendar date (YYYY-MM-DD)
    pub date: String,
    /// Weight in kg
    pub weight: f64,
}

impl WeightEntry {
    pub fn new(date: impl Into<String>, weight: f64) -> Self {
        Self {
            date: date.into(),
            weight,
        }
    }

    /// The entry date, if it is a valid ISO calendar date.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }
}

/// A comment left on a client's file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientComment {
    pub id: String,
    pub text: String,
    pub author: String,
    /// RFC 3339 timestamp
    pub timestamp: String,
}

impl ClientComment {
    /// Create a comment stamped with the current time.
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self::at(text, author, chrono::Utc::now().to_rfc3339())
    }

    /// Create a comment with an explicit timestamp.
    pub fn at(
        text: impl Into<String>,
        author: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            author: author.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// A coached individual.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    /// Opaque unique ID; replaced by the store on insert
    pub id: String,
    pub name: String,
    pub email: String,
    /// Program start (YYYY-MM-DD)
    pub start_date: String,
    /// Starting weight in kg
    pub start_weight: f64,
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    /// Height in cm
    pub height: Option<f64>,
    pub status: ClientStatus,
    pub notes: String,
    /// Free-text tags, `["None"]` when nothing is known
    pub health_issues: Vec<String>,
    pub diet_end_date: Option<String>,
    pub routine: String,
    pub health_summary: String,
    /// Not guaranteed to be sorted by date
    pub weight_entries: Vec<WeightEntry>,
    pub comments: Vec<ClientComment>,
}

impl ClientRecord {
    /// Create a client with required fields and empty history.
    pub fn new(name: String, email: String, start_date: String, start_weight: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            email,
            start_date,
            start_weight,
            current_weight: None,
            goal_weight: None,
            height: None,
            status: ClientStatus::Active,
            notes: String::new(),
            health_issues: Vec::new(),
            diet_end_date: None,
            routine: String::new(),
            health_summary: String::new(),
            weight_entries: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// The program start date, if valid.
    pub fn parsed_start_date(&self) -> Option<NaiveDate> {
        parse_date(&self.start_date)
    }

    /// Weight entries ordered by date (stable for equal dates).
    pub fn sorted_entries(&self) -> Vec<WeightEntry> {
        let mut entries = self.weight_entries.clone();
        entries.sort_by(|a, b| a.date.cmp(&b.date));
        entries
    }

    /// Most recent entry by date.
    pub fn latest_entry(&self) -> Option<&WeightEntry> {
        self.weight_entries.iter().max_by(|a, b| a.date.cmp(&b.date))
    }

    /// Progress towards the goal weight as a rounded percentage.
    ///
    /// Zero when current or goal weight is unknown, or when the goal equals
    /// the start weight. May exceed 100 or go negative.
    pub fn progress_percent(&self) -> i64 {
        let (Some(current), Some(goal)) = (self.current_weight, self.goal_weight) else {
            return 0;
        };
        let total_loss = self.start_weight - goal;
        if total_loss == 0.0 || current == 0.0 || goal == 0.0 {
            return 0;
        }
        let current_loss = self.start_weight - current;
        let percent = (current_loss / total_loss * 100.0).round();
        if percent.is_finite() {
            percent as i64
        } else {
            0
        }
    }

    /// Add a health-issue tag. Returns false for blanks and duplicates.
    pub fn add_health_issue(&mut self, input: &str) -> bool {
        push_tag(&mut self.health_issues, input)
    }

    /// Remove a health-issue tag. Returns true if it was present.
    pub fn remove_health_issue(&mut self, tag: &str) -> bool {
        let before = self.health_issues.len();
        self.health_issues.retain(|t| t != tag);
        self.health_issues.len() != before
    }
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub(crate) fn push_tag(tags: &mut Vec<String>, input: &str) -> bool {
    let tag = input.trim();
    if tag.is_empty() || tags.iter().any(|t| t == tag) {
        return false;
    }
    tags.push(tag.to_string());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ClientRecord {
        ClientRecord::new(
            "Ana Lima".into(),
            "ana@example.com".into(),
            "2025-06-01".into(),
            90.0,
        )
    }

    #[test]
    fn test_new_client() {
        let c = client();
        assert_eq!(c.status, ClientStatus::Active);
        assert_eq!(c.id.len(), 36); // UUID format
        assert!(c.weight_entries.is_empty());
        assert_eq!(
            c.parsed_start_date(),
            NaiveDate::from_ymd_opt(2025, 6, 1)
        );
    }

    #[test]
    fn test_status_round_trip() {
        for status in ClientStatus::ALL {
            assert_eq!(status.as_str().parse::<ClientStatus>().unwrap(), status);
        }
        assert!("paused".parse::<ClientStatus>().is_err());
    }

    #[test]
    fn test_status_serde_spelling() {
        let json = serde_json::to_string(&ClientStatus::YetToStart).unwrap();
        assert_eq!(json, "\"yet-to-start\"");
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let c = client();
        let value = serde_json::to_value(&c).unwrap();
        assert!(value.get("startDate").is_some());
        assert!(value.get("healthIssues").is_some());
        assert!(value.get("dietEndDate").unwrap().is_null());
        assert!(value.get("start_date").is_none());
    }

    #[test]
    fn test_progress_percent() {
        let mut c = client();
        assert_eq!(c.progress_percent(), 0);

        c.goal_weight = Some(80.0);
        c.current_weight = Some(85.0);
        assert_eq!(c.progress_percent(), 50);

        c.current_weight = Some(78.0);
        assert_eq!(c.progress_percent(), 120);

        c.goal_weight = Some(90.0);
        assert_eq!(c.progress_percent(), 0);
    }

    #[test]
    fn test_sorted_and_latest_entries() {
        let mut c = client();
        c.weight_entries = vec![
            WeightEntry::new("2025-06-03", 88.0),
            WeightEntry::new("2025-06-01", 90.0),
            WeightEntry::new("2025-06-02", 89.0),
        ];
        let sorted = c.sorted_entries();
        assert_eq!(sorted[0].date, "2025-06-01");
        assert_eq!(sorted[2].date, "2025-06-03");
        assert_eq!(c.latest_entry().unwrap().weight, 88.0);
    }

    #[test]
    fn test_health_issue_tags() {
        let mut c = client();
        assert!(c.add_health_issue("  Knee pain "));
        assert!(!c.add_health_issue("Knee pain"));
        assert!(!c.add_health_issue("   "));
        assert_eq!(c.health_issues, vec!["Knee pain".to_string()]);
        assert!(c.remove_health_issue("Knee pain"));
        assert!(!c.remove_health_issue("Knee pain"));
    }

    #[test]
    fn test_parse_date_strict() {
        assert!(parse_date("2025-06-31").is_none());
        assert!(parse_date("27-05").is_none());
        assert_eq!(
            parse_date("2025-06-30").map(format_date),
            Some("2025-06-30".to_string())
        );
    }
}
