//! CSV import of the monthly weight-tracking export.
//!
//! Pipeline: bytes → UTF-8 text → rows → positional cells → `ClientRecord`
//!
//! The export is not general CSV: cells are split on commas with no quoting,
//! the first row is a header and is discarded, and columns are addressed by
//! position through an [`ImportLayout`].

mod cells;
mod keywords;
mod layout;

pub use cells::*;
pub use keywords::*;
pub use layout::*;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{ClientComment, ClientRecord, WeightEntry};

/// Author recorded on comments created by the importer.
pub const IMPORT_AUTHOR: &str = "System Import";
/// Placeholder routine for imported clients.
pub const IMPORTED_ROUTINE: &str = "Imported from CSV - routine to be updated";
/// Placeholder health summary for imported clients.
pub const IMPORTED_HEALTH_SUMMARY: &str = "Imported client - health summary to be updated";

/// Import errors. Only structural problems end up here; bad cells never do.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Input is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("No CSV data provided")]
    Empty,

    #[error("Line {line}: expected at least {expected} columns, found {found}")]
    TruncatedRow {
        line: usize,
        found: usize,
        expected: usize,
    },

    #[error("Invalid layout: {0}")]
    Layout(String),

    #[error("Invalid import period: {year}-{month:02}")]
    InvalidPeriod { year: i32, month: u32 },

    #[error("Layout file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Layout JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ImportResult<T> = Result<T, ImportError>;

/// Result of parsing one export.
#[derive(Debug, Clone, Serialize)]
pub struct ImportBatch {
    pub period: ImportPeriod,
    /// Parsed clients in input row order
    pub clients: Vec<ClientRecord>,
    /// Data rows skipped for lacking a name
    pub skipped_rows: usize,
}

impl ImportBatch {
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Total weight readings across all clients.
    pub fn entry_count(&self) -> usize {
        self.clients.iter().map(|c| c.weight_entries.len()).sum()
    }

    /// One-line summary for the caller's success notification.
    pub fn summary(&self) -> String {
        format!("Successfully parsed {} clients", self.clients.len())
    }
}

/// Parser for the tracking export.
#[derive(Debug, Clone)]
pub struct CsvImporter {
    layout: ImportLayout,
    period: ImportPeriod,
    keywords: KeywordTable,
    imported_at: Option<DateTime<Utc>>,
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new(ImportPeriod::default())
    }
}

impl CsvImporter {
    /// Create an importer with the default layout and keyword tables.
    pub fn new(period: ImportPeriod) -> Self {
        Self {
            layout: ImportLayout::default(),
            period,
            keywords: KeywordTable::new(),
            imported_at: None,
        }
    }

    /// Use a custom column layout.
    pub fn with_layout(mut self, layout: ImportLayout) -> ImportResult<Self> {
        layout.validate()?;
        self.layout = layout;
        Ok(self)
    }

    /// Use custom keyword tables.
    pub fn with_keywords(mut self, keywords: KeywordTable) -> Self {
        self.keywords = keywords;
        self
    }

    /// Fix the timestamp stamped on imported comments.
    pub fn with_timestamp(mut self, imported_at: DateTime<Utc>) -> Self {
        self.imported_at = Some(imported_at);
        self
    }

    pub fn layout(&self) -> &ImportLayout {
        &self.layout
    }

    pub fn period(&self) -> &ImportPeriod {
        &self.period
    }

    /// Parse raw file bytes.
    pub fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<ImportBatch> {
        let text = std::str::from_utf8(bytes)?;
        self.parse(text)
    }

    /// Parse the full text of an export.
    ///
    /// Fails as a whole on structural problems; never returns partial output.
    pub fn parse(&self, text: &str) -> ImportResult<ImportBatch> {
        self.period.validate()?;

        let text = text.trim();
        if text.is_empty() {
            return Err(ImportError::Empty);
        }

        let timestamp = self.imported_at.unwrap_or_else(Utc::now).to_rfc3339();
        let required = self.layout.required_columns();

        let mut clients = Vec::new();
        let mut skipped_rows = 0;

        // Line numbers are 1-based and count the header.
        for (index, line) in text.lines().enumerate().skip(1) {
            let line_no = index + 1;
            let cells: Vec<&str> = line.split(',').collect();
            let name = cells
                .get(self.layout.name_column)
                .map(|c| c.trim())
                .unwrap_or("");

            // A lone cell is a stray note, not a client, even when it sits in
            // the name column.
            if cells.len() <= self.layout.name_column || cells.len() < 2 || name.is_empty() {
                debug!(line = line_no, "skipping row without a client name");
                skipped_rows += 1;
                continue;
            }

            if cells.len() < required {
                warn!(
                    line = line_no,
                    found = cells.len(),
                    expected = required,
                    "truncated row, aborting import"
                );
                return Err(ImportError::TruncatedRow {
                    line: line_no,
                    found: cells.len(),
                    expected: required,
                });
            }

            clients.push(self.parse_row(&cells, &timestamp));
        }

        let batch = ImportBatch {
            period: self.period,
            clients,
            skipped_rows,
        };
        info!(
            clients = batch.len(),
            entries = batch.entry_count(),
            skipped = batch.skipped_rows,
            "parsed tracking export"
        );
        Ok(batch)
    }

    /// Build one client from a row that has at least the fixed columns.
    fn parse_row(&self, cells: &[&str], timestamp: &str) -> ClientRecord {
        let layout = &self.layout;
        let cell = |index: usize| cells.get(index).map(|c| c.trim()).unwrap_or("");

        let name = cell(layout.name_column).to_string();
        let notes = cell(layout.notes_column).to_string();
        let follow_up = cell(layout.follow_up_column);

        let (start_date, start_weight) =
            match parse_start_cell(cell(layout.start_column), &self.period) {
                StartCell::Tagged { weight, date } => (Some(date), weight),
                StartCell::Dated { date } => {
                    let weight = leading_number(cell(layout.daily_column(1))).unwrap_or(0.0);
                    (Some(date), weight)
                }
                StartCell::Missing => (None, 0.0),
            };

        let mut entries = Vec::new();
        if let Some(date) = &start_date {
            if start_weight > 0.0 {
                push_entry(&mut entries, WeightEntry::new(date.clone(), start_weight));
            }
        }
        for day in 1..=layout.daily_columns {
            let Some(weight) = weight_reading(cell(layout.daily_column(day))) else {
                continue;
            };
            // Columns past the end of the month carry no date.
            let Some(date) = u32::try_from(day)
                .ok()
                .and_then(|d| self.period.date_for_day(d))
            else {
                continue;
            };
            push_entry(
                &mut entries,
                WeightEntry::new(crate::models::format_date(date), weight),
            );
        }

        let current_weight = entries.last().map(|e| e.weight).unwrap_or(start_weight);
        let status = self.keywords.derive_status(&notes, entries.len());
        let comments = if follow_up.is_empty() {
            Vec::new()
        } else {
            vec![ClientComment::at(
                format!("Last follow-up: {}", follow_up),
                IMPORT_AUTHOR,
                timestamp,
            )]
        };

        ClientRecord {
            id: uuid::Uuid::new_v4().to_string(),
            email: imported_email(&name),
            start_date: start_date.unwrap_or_else(|| self.period.first_day()),
            start_weight,
            current_weight: Some(current_weight),
            goal_weight: Some(estimated_goal_weight(start_weight)),
            height: None,
            status,
            health_issues: self.keywords.health_issues(&notes),
            diet_end_date: diet_end_date(cell(layout.diet_end_column), &self.period),
            routine: IMPORTED_ROUTINE.to_string(),
            health_summary: IMPORTED_HEALTH_SUMMARY.to_string(),
            weight_entries: entries,
            comments,
            name,
            notes,
        }
    }
}

/// Append an entry; an earlier entry on the same date is replaced and the
/// later reading takes the end position.
fn push_entry(entries: &mut Vec<WeightEntry>, entry: WeightEntry) {
    if let Some(pos) = entries.iter().position(|e| e.date == entry.date) {
        debug!(date = %entry.date, "duplicate reading date, keeping the later one");
        entries.remove(pos);
    }
    entries.push(entry);
}

/// Parse an export for `period` with the default layout.
pub fn parse_csv(text: &str, period: ImportPeriod) -> ImportResult<ImportBatch> {
    CsvImporter::new(period).parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClientStatus;

    fn header() -> String {
        let mut cols = vec![
            "Name".to_string(),
            "Notes".into(),
            "Last follow up".into(),
            "Diet end".into(),
            "Start".into(),
        ];
        cols.extend((1..=30).map(|d| format!("{} Jun", d)));
        cols.join(",")
    }

    fn row(fixed: [&str; 5], daily: &[(usize, &str)]) -> String {
        let mut cols: Vec<String> = fixed.iter().map(|s| s.to_string()).collect();
        let mut days = vec![String::new(); 30];
        for (day, value) in daily {
            days[day - 1] = value.to_string();
        }
        cols.extend(days);
        cols.join(",")
    }

    fn parse(rows: &[String]) -> ImportBatch {
        let text = std::iter::once(header())
            .chain(rows.iter().cloned())
            .collect::<Vec<_>>()
            .join("\n");
        CsvImporter::default().parse(&text).unwrap()
    }

    #[test]
    fn test_tagged_start_and_daily_readings() {
        let batch = parse(&[row(
            ["Ravi Kumar", "", "", "", "82.8(27-05)"],
            &[(1, "82.1"), (2, "--"), (3, "81.6")],
        )]);
        let client = &batch.clients[0];

        assert_eq!(client.start_date, "2025-05-27");
        assert_eq!(client.start_weight, 82.8);
        assert_eq!(
            client.weight_entries,
            vec![
                WeightEntry::new("2025-05-27", 82.8),
                WeightEntry::new("2025-06-01", 82.1),
                WeightEntry::new("2025-06-03", 81.6),
            ]
        );
        assert_eq!(client.current_weight, Some(81.6));
        assert_eq!(client.status, ClientStatus::Active);
        assert_eq!(client.email, "ravi.kumar@imported.com");
    }

    #[test]
    fn test_dated_start_reads_weight_from_first_daily_column() {
        let batch = parse(&[row(
            ["Mei", "", "", "", "2025-06-18"],
            &[(1, "64.0"), (18, "63.5"), (19, "63.1")],
        )]);
        let client = &batch.clients[0];

        assert_eq!(client.start_date, "2025-06-18");
        assert_eq!(client.start_weight, 64.0);
        // the start entry and the day-18 reading share a date: later wins
        assert_eq!(
            client.weight_entries,
            vec![
                WeightEntry::new("2025-06-01", 64.0),
                WeightEntry::new("2025-06-18", 63.5),
                WeightEntry::new("2025-06-19", 63.1),
            ]
        );
    }

    #[test]
    fn test_missing_start_uses_period_defaults() {
        let batch = parse(&[row(["Lee", "", "", "", ""], &[])]);
        let client = &batch.clients[0];

        assert_eq!(client.start_date, "2025-06-01");
        assert_eq!(client.start_weight, 0.0);
        assert_eq!(client.current_weight, Some(0.0));
        assert_eq!(client.goal_weight, Some(0.0));
        assert_eq!(client.status, ClientStatus::YetToStart);
        assert!(client.weight_entries.is_empty());
    }

    #[test]
    fn test_follow_up_becomes_comment() {
        let importer = CsvImporter::default().with_timestamp(
            DateTime::parse_from_rfc3339("2025-07-01T09:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        );
        let text = format!(
            "{}\n{}",
            header(),
            row(["Sam", "", "called on Monday", "", ""], &[])
        );
        let batch = importer.parse(&text).unwrap();
        let comments = &batch.clients[0].comments;

        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "Last follow-up: called on Monday");
        assert_eq!(comments[0].author, IMPORT_AUTHOR);
        assert_eq!(comments[0].timestamp, "2025-07-01T09:00:00+00:00");
    }

    #[test]
    fn test_blank_rows_skipped() {
        let batch = parse(&[
            row(["", "orphan notes", "", "", ""], &[(1, "70")]),
            String::new(),
            row(["Ana", "", "", "", ""], &[]),
        ]);
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.skipped_rows, 2);
        assert_eq!(batch.clients[0].name, "Ana");
    }

    #[test]
    fn test_skip_uses_layout_name_column() {
        let layout = ImportLayout {
            name_column: 5,
            notes_column: 0,
            follow_up_column: 1,
            diet_end_column: 2,
            start_column: 3,
            first_daily_column: 6,
            daily_columns: 2,
        };
        let importer = CsvImporter::default().with_layout(layout).unwrap();
        let batch = importer
            .parse("h
notes,,,,x
notes,,,70.0(01-06),x,Ana,69.8,69.5
solo")
            .unwrap();

        assert_eq!(batch.skipped_rows, 2);
        assert_eq!(batch.clients.len(), 1);
        assert_eq!(batch.clients[0].name, "Ana");
        assert_eq!(batch.clients[0].notes, "notes");
    }

    #[test]
    fn test_truncated_row_fails_import() {
        let text = format!("{}\nAna,notes,follow", header());
        let err = CsvImporter::default().parse(&text).unwrap_err();
        assert!(matches!(
            err,
            ImportError::TruncatedRow {
                line: 2,
                found: 3,
                expected: 5
            }
        ));
    }

    #[test]
    fn test_empty_and_invalid_input() {
        assert!(matches!(
            CsvImporter::default().parse("  \n "),
            Err(ImportError::Empty)
        ));
        assert!(matches!(
            CsvImporter::default().parse_bytes(&[0x4e, 0xff, 0xfe]),
            Err(ImportError::Encoding(_))
        ));
    }

    #[test]
    fn test_header_only() {
        let batch = CsvImporter::default().parse(&header()).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.summary(), "Successfully parsed 0 clients");
    }

    #[test]
    fn test_custom_period_and_layout() {
        let layout = ImportLayout {
            first_daily_column: 6,
            daily_columns: 2,
            ..ImportLayout::default()
        };
        let importer = CsvImporter::new(ImportPeriod::new(2026, 2).unwrap())
            .with_layout(layout)
            .unwrap();
        let batch = importer
            .parse("h\nZoe,,,,70.2(01-02),ignored,70.0,69.8")
            .unwrap();
        let client = &batch.clients[0];

        assert_eq!(client.start_date, "2026-02-01");
        assert_eq!(
            client.weight_entries,
            vec![
                WeightEntry::new("2026-02-01", 70.0),
                WeightEntry::new("2026-02-02", 69.8),
            ]
        );
    }

    #[test]
    fn test_days_past_month_end_are_dropped() {
        let layout = ImportLayout {
            daily_columns: 31,
            ..ImportLayout::default()
        };
        let importer = CsvImporter::default().with_layout(layout).unwrap();
        let mut cells = vec!["Kai", "", "", "", ""];
        cells.extend(std::iter::repeat("70").take(31));
        let batch = importer.parse(&format!("h\n{}", cells.join(","))).unwrap();

        assert_eq!(batch.clients[0].weight_entries.len(), 30);
    }
}
