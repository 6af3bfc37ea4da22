//! Add-client and edit-client payloads.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::client::{parse_date, push_tag, ClientRecord, ClientStatus, WeightEntry};

/// Form validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Payload of the manual add-client form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub start_date: String,
    /// Missing start weight is stored as 0
    pub start_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub height: Option<f64>,
    pub status: Option<ClientStatus>,
    pub notes: String,
    pub health_issues: Vec<String>,
    pub diet_end_date: Option<String>,
    pub routine: String,
    pub health_summary: String,
}

impl NewClient {
    pub fn new(name: &str, email: &str, start_date: &str) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            start_date: start_date.into(),
            ..Self::default()
        }
    }

    /// Add a health-issue tag. Returns false for blanks and duplicates.
    pub fn add_health_issue(&mut self, input: &str) -> bool {
        push_tag(&mut self.health_issues, input)
    }

    /// Check required fields and value ranges.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if self.start_date.trim().is_empty() {
            return Err(ValidationError::MissingField("startDate"));
        }
        if parse_date(&self.start_date).is_none() {
            return Err(ValidationError::InvalidValue {
                field: "startDate",
                reason: format!("expected YYYY-MM-DD, got {:?}", self.start_date),
            });
        }
        if let Some(date) = self.diet_end_date.as_deref().filter(|d| !d.trim().is_empty()) {
            if parse_date(date).is_none() {
                return Err(ValidationError::InvalidValue {
                    field: "dietEndDate",
                    reason: format!("expected YYYY-MM-DD, got {:?}", date),
                });
            }
        }
        if let Some(w) = self.start_weight {
            check_non_negative("startWeight", w)?;
        }
        for (field, value) in [
            ("currentWeight", self.current_weight),
            ("goalWeight", self.goal_weight),
            ("height", self.height),
        ] {
            if let Some(v) = value {
                check_positive(field, v)?;
            }
        }
        Ok(())
    }

    /// Validate and build the client record.
    ///
    /// A given current weight seeds one weight entry on the start date.
    pub fn into_record(self) -> ValidationResult<ClientRecord> {
        self.validate()?;

        let mut record = ClientRecord::new(
            self.name.trim().to_string(),
            self.email.trim().to_string(),
            self.start_date.trim().to_string(),
            self.start_weight.unwrap_or(0.0),
        );
        record.current_weight = self.current_weight;
        record.goal_weight = self.goal_weight;
        record.height = self.height;
        record.status = self.status.unwrap_or(ClientStatus::Active);
        record.notes = self.notes;
        record.health_issues = self.health_issues;
        record.diet_end_date = self.diet_end_date.filter(|d| !d.trim().is_empty());
        record.routine = self.routine;
        record.health_summary = self.health_summary;
        if let Some(weight) = self.current_weight {
            record
                .weight_entries
                .push(WeightEntry::new(record.start_date.clone(), weight));
        }
        Ok(record)
    }
}

/// Partial update of a client. Only present fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub start_date: Option<String>,
    pub start_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub height: Option<f64>,
    pub status: Option<ClientStatus>,
    pub notes: Option<String>,
    pub health_issues: Option<Vec<String>>,
    /// `Some(None)` clears the diet end date
    pub diet_end_date: Option<Option<String>>,
    pub routine: Option<String>,
    pub health_summary: Option<String>,
}

impl ClientUpdate {
    /// Check the fields that are present.
    pub fn validate(&self) -> ValidationResult<()> {
        if matches!(&self.name, Some(n) if n.trim().is_empty()) {
            return Err(ValidationError::MissingField("name"));
        }
        if matches!(&self.email, Some(e) if e.trim().is_empty()) {
            return Err(ValidationError::MissingField("email"));
        }
        if let Some(date) = &self.start_date {
            if parse_date(date).is_none() {
                return Err(ValidationError::InvalidValue {
                    field: "startDate",
                    reason: format!("expected YYYY-MM-DD, got {:?}", date),
                });
            }
        }
        if let Some(Some(date)) = &self.diet_end_date {
            if parse_date(date).is_none() {
                return Err(ValidationError::InvalidValue {
                    field: "dietEndDate",
                    reason: format!("expected YYYY-MM-DD, got {:?}", date),
                });
            }
        }
        if let Some(w) = self.start_weight {
            check_non_negative("startWeight", w)?;
        }
        for (field, value) in [
            ("currentWeight", self.current_weight),
            ("goalWeight", self.goal_weight),
            ("height", self.height),
        ] {
            if let Some(v) = value {
                check_positive(field, v)?;
            }
        }
        Ok(())
    }

    /// True if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == ClientUpdate::default()
    }

    /// Apply the present fields to a record.
    pub fn apply_to(&self, record: &mut ClientRecord) {
        if let Some(v) = &self.name {
            record.name = v.trim().to_string();
        }
        if let Some(v) = &self.email {
            record.email = v.trim().to_string();
        }
        if let Some(v) = &self.start_date {
            record.start_date = v.trim().to_string();
        }
        if let Some(v) = self.start_weight {
            record.start_weight = v;
        }
        if let Some(v) = self.current_weight {
            record.current_weight = Some(v);
        }
        if let Some(v) = self.goal_weight {
            record.goal_weight = Some(v);
        }
        if let Some(v) = self.height {
            record.height = Some(v);
        }
        if let Some(v) = self.status {
            record.status = v;
        }
        if let Some(v) = &self.notes {
            record.notes = v.clone();
        }
        if let Some(v) = &self.health_issues {
            record.health_issues = v.clone();
        }
        if let Some(v) = &self.diet_end_date {
            record.diet_end_date = v.clone().filter(|d| !d.trim().is_empty());
        }
        if let Some(v) = &self.routine {
            record.routine = v.clone();
        }
        if let Some(v) = &self.health_summary {
            record.health_summary = v.clone();
        }
    }
}

fn check_positive(field: &'static str, value: f64) -> ValidationResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field,
            reason: format!("must be a positive number, got {}", value),
        })
    }
}

fn check_non_negative(field: &'static str, value: f64) -> ValidationResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidValue {
            field,
            reason: format!("must not be negative, got {}", value),
        })
    }
}
