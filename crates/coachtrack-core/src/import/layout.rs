//! Column layout and reporting period of the monthly tracking export.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ImportError, ImportResult};
use crate::models::format_date;

/// Positional column mapping of the spreadsheet export.
///
/// Columns are addressed by index, never by header name. A change in the
/// spreadsheet layout is a change to this table, not to the parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ImportLayout {
    /// Client name; rows with a blank name are skipped
    pub name_column: usize,
    /// Free-text notes (health issues and status are derived from it)
    pub notes_column: usize,
    /// "Last follow-up" note, imported as a comment
    pub follow_up_column: usize,
    /// Diet end description ("15 July", "20", ...)
    pub diet_end_column: usize,
    /// Combined start weight and date ("82.8(27-05)" or an ISO date)
    pub start_column: usize,
    /// Column holding the reading for day 1 of the period
    pub first_daily_column: usize,
    /// Number of consecutive daily-reading columns
    pub daily_columns: usize,
}

impl Default for ImportLayout {
    fn default() -> Self {
        Self {
            name_column: 0,
            notes_column: 1,
            follow_up_column: 2,
            diet_end_column: 3,
            start_column: 4,
            first_daily_column: 5,
            daily_columns: 30,
        }
    }
}

impl ImportLayout {
    /// Load a layout from JSON. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> ImportResult<Self> {
        let layout: ImportLayout = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Load a layout from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn fixed_columns(&self) -> [(&'static str, usize); 5] {
        [
            ("name_column", self.name_column),
            ("notes_column", self.notes_column),
            ("follow_up_column", self.follow_up_column),
            ("diet_end_column", self.diet_end_column),
            ("start_column", self.start_column),
        ]
    }

    /// Reject layouts whose fixed fields collide or whose daily block is empty
    /// or overlaps a fixed field.
    pub fn validate(&self) -> ImportResult<()> {
        if self.daily_columns == 0 {
            return Err(ImportError::Layout("daily_columns must be at least 1".into()));
        }
        let fixed = self.fixed_columns();
        for (i, (name_a, col_a)) in fixed.iter().enumerate() {
            for (name_b, col_b) in &fixed[i + 1..] {
                if col_a == col_b {
                    return Err(ImportError::Layout(format!(
                        "{} and {} both use column {}",
                        name_a, name_b, col_a
                    )));
                }
            }
        }
        let daily = self.first_daily_column..self.first_daily_column + self.daily_columns;
        for (name, col) in fixed {
            if daily.contains(&col) {
                return Err(ImportError::Layout(format!(
                    "{} (column {}) overlaps the daily readings",
                    name, col
                )));
            }
        }
        Ok(())
    }

    /// Minimum number of cells a named row must have.
    pub fn required_columns(&self) -> usize {
        self.fixed_columns()
            .iter()
            .map(|(_, col)| col + 1)
            .max()
            .unwrap_or(1)
    }

    /// Column index holding the reading for `day` (1-based).
    pub fn daily_column(&self, day: usize) -> usize {
        self.first_daily_column + day - 1
    }
}

/// Month the daily-reading columns belong to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportPeriod {
    pub year: i32,
    pub month: u32,
}

impl Default for ImportPeriod {
    /// June 2025, the first tracked month.
    fn default() -> Self {
        Self {
            year: 2025,
            month: 6,
        }
    }
}

impl ImportPeriod {
    pub fn new(year: i32, month: u32) -> ImportResult<Self> {
        let period = Self { year, month };
        period.validate()?;
        Ok(period)
    }

    pub fn validate(&self) -> ImportResult<()> {
        if NaiveDate::from_ymd_opt(self.year, self.month, 1).is_none() {
            return Err(ImportError::InvalidPeriod {
                year: self.year,
                month: self.month,
            });
        }
        Ok(())
    }

    /// Date of `day` within the period, if that day exists.
    pub fn date_for_day(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    /// First day of the period as `YYYY-MM-DD`.
    pub fn first_day(&self) -> String {
        format!("{:04}-{:02}-01", self.year, self.month)
    }

    /// Date of `day` within `month` of the period's year, as `YYYY-MM-DD`.
    pub fn date_in_month(&self, month: u32, day: u32) -> Option<String> {
        NaiveDate::from_ymd_opt(self.year, month, day).map(format_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = ImportLayout::default();
        layout.validate().unwrap();
        assert_eq!(layout.required_columns(), 5);
        assert_eq!(layout.daily_column(1), 5);
        assert_eq!(layout.daily_column(30), 34);
    }

    #[test]
    fn test_layout_from_partial_json() {
        let layout = ImportLayout::from_json(r#"{"daily_columns": 31}"#).unwrap();
        assert_eq!(layout.daily_columns, 31);
        assert_eq!(layout.start_column, 4);
    }

    #[test]
    fn test_layout_collisions_rejected() {
        let layout = ImportLayout {
            notes_column: 0,
            ..ImportLayout::default()
        };
        assert!(matches!(layout.validate(), Err(ImportError::Layout(_))));

        let layout = ImportLayout {
            first_daily_column: 4,
            ..ImportLayout::default()
        };
        assert!(matches!(layout.validate(), Err(ImportError::Layout(_))));

        let layout = ImportLayout {
            daily_columns: 0,
            ..ImportLayout::default()
        };
        assert!(matches!(layout.validate(), Err(ImportError::Layout(_))));
    }

    #[test]
    fn test_period() {
        let period = ImportPeriod::default();
        assert_eq!(period.first_day(), "2025-06-01");
        assert!(period.date_for_day(30).is_some());
        assert!(period.date_for_day(31).is_none());
        assert_eq!(period.date_in_month(7, 4), Some("2025-07-04".into()));
        assert!(ImportPeriod::new(2025, 13).is_err());
    }
}
