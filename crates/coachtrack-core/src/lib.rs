//! CoachTrack Core Library
//!
//! Client roster, weight tracking and trend classification for a fitness
//! coaching practice.
//!
//! # Architecture
//!
//! ```text
//! monthly tracking export (CSV)
//!             │
//!             ▼
//!       CsvImporter ──► ImportBatch (preview)
//!             │
//!             ▼
//!   Database: clients / weight_entries / client_comments
//!             │
//!     ┌───────┴─────────┬──────────────────┐
//!     ▼                 ▼                  ▼
//!  RosterQuery     ClientCalendar      RosterStats
//!  (search)        (trend per day)     (dashboard)
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite store for clients, readings and comments
//! - [`models`]: Domain types (ClientRecord, WeightEntry, NewClient, etc.)
//! - [`import`]: Positional CSV parser for the tracking export
//! - [`trend`]: Per-day weight-trend classifier and month calendars
//! - [`roster`]: Search, status filter and statistics

pub mod db;
pub mod import;
pub mod models;
pub mod roster;
pub mod trend;

// Re-export commonly used types
pub use db::Database;
pub use import::{parse_csv, CsvImporter, ImportBatch, ImportLayout, ImportPeriod, KeywordTable};
pub use models::{
    ClientComment, ClientRecord, ClientStatus, ClientUpdate, NewClient, WeightEntry,
};
pub use roster::{RosterQuery, RosterStats, StatusFilter};
pub use trend::{classify_day, CalendarCell, ClientCalendar, MonthCalendar, Trend};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum CoachTrackError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Import failed: {0}")]
    ImportFailed(String),
}

impl From<db::DbError> for CoachTrackError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(id) => CoachTrackError::NotFound(id),
            db::DbError::Constraint(msg) => CoachTrackError::InvalidInput(msg),
            other => CoachTrackError::DatabaseError(other.to_string()),
        }
    }
}

impl From<import::ImportError> for CoachTrackError {
    fn from(e: import::ImportError) -> Self {
        CoachTrackError::ImportFailed(e.to_string())
    }
}

impl From<models::ValidationError> for CoachTrackError {
    fn from(e: models::ValidationError) -> Self {
        CoachTrackError::InvalidInput(e.to_string())
    }
}

impl From<models::UnknownStatus> for CoachTrackError {
    fn from(e: models::UnknownStatus) -> Self {
        CoachTrackError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for CoachTrackError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        CoachTrackError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

fn parse_day(date: &str) -> Result<chrono::NaiveDate, CoachTrackError> {
    models::parse_date(date).ok_or_else(|| {
        CoachTrackError::InvalidInput(format!("invalid date {:?}, expected YYYY-MM-DD", date))
    })
}

fn parse_status(status: Option<String>) -> Result<Option<ClientStatus>, CoachTrackError> {
    status.map(|s| s.parse::<ClientStatus>()).transpose().map_err(Into::into)
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<CoachTrackCore>, CoachTrackError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(CoachTrackCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<CoachTrackCore>, CoachTrackError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(CoachTrackCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Importer for `year`/`month`, with an optional JSON column layout.
fn importer_for(
    year: i32,
    month: u32,
    layout_json: Option<String>,
) -> Result<CsvImporter, CoachTrackError> {
    let importer = CsvImporter::new(ImportPeriod::new(year, month)?);
    match layout_json {
        Some(json) => Ok(importer.with_layout(ImportLayout::from_json(&json)?)?),
        None => Ok(importer),
    }
}

/// Parse a tracking export without storing it.
#[uniffi::export]
pub fn preview_csv(
    csv_text: String,
    year: i32,
    month: u32,
    layout_json: Option<String>,
) -> Result<Vec<FfiClient>, CoachTrackError> {
    let batch = importer_for(year, month, layout_json)?.parse(&csv_text)?;
    Ok(batch.clients.into_iter().map(Into::into).collect())
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct CoachTrackCore {
    db: Arc<Mutex<Database>>,
}

impl CoachTrackCore {
    fn require_client(&self, db: &Database, id: &str) -> Result<ClientRecord, CoachTrackError> {
        db.get_client(id)?
            .ok_or_else(|| CoachTrackError::NotFound(id.to_string()))
    }
}

#[uniffi::export]
impl CoachTrackCore {
    // =========================================================================
    // Import
    // =========================================================================

    /// Parse an export and store every client in one transaction.
    pub fn import_csv(
        &self,
        csv_text: String,
        year: i32,
        month: u32,
        layout_json: Option<String>,
    ) -> Result<FfiImportSummary, CoachTrackError> {
        let batch = importer_for(year, month, layout_json)?.parse(&csv_text)?;

        let mut db = self.db.lock()?;
        let client_ids = db.create_clients(&batch.clients)?;
        Ok(FfiImportSummary {
            message: batch.summary(),
            client_count: client_ids.len() as u32,
            entry_count: batch.entry_count() as u32,
            skipped_rows: batch.skipped_rows as u32,
            client_ids,
        })
    }

    // =========================================================================
    // Client Operations
    // =========================================================================

    /// Create a client from the add-client form.
    pub fn add_client(&self, client: FfiNewClient) -> Result<FfiClient, CoachTrackError> {
        let record = NewClient::try_from(client)?.into_record()?;
        let mut db = self.db.lock()?;
        let id = db.create_client(&record)?;
        Ok(self.require_client(&db, &id)?.into())
    }

    /// All clients, newest first.
    pub fn list_clients(&self) -> Result<Vec<FfiClient>, CoachTrackError> {
        let db = self.db.lock()?;
        let clients = db.list_clients()?;
        Ok(clients.into_iter().map(Into::into).collect())
    }

    /// Search by name or email; `status` is "all" or one status.
    pub fn search_clients(
        &self,
        query: String,
        status: String,
    ) -> Result<Vec<FfiClient>, CoachTrackError> {
        let filter: StatusFilter = status.parse()?;
        let db = self.db.lock()?;
        let clients = db.list_clients()?;
        let query = RosterQuery::new(query, filter);
        Ok(query.apply(&clients).into_iter().cloned().map(Into::into).collect())
    }

    /// Get a client by ID.
    pub fn get_client(&self, id: String) -> Result<Option<FfiClient>, CoachTrackError> {
        let db = self.db.lock()?;
        let client = db.get_client(&id)?;
        Ok(client.map(Into::into))
    }

    /// Apply an edit and return the updated client.
    pub fn update_client(
        &self,
        id: String,
        update: FfiClientUpdate,
    ) -> Result<FfiClient, CoachTrackError> {
        let update = ClientUpdate::try_from(update)?;
        let db = self.db.lock()?;
        if !db.update_client(&id, &update)? {
            return Err(CoachTrackError::NotFound(id));
        }
        Ok(self.require_client(&db, &id)?.into())
    }

    /// Delete a client with its history. Returns false if it did not exist.
    pub fn delete_client(&self, id: String) -> Result<bool, CoachTrackError> {
        let db = self.db.lock()?;
        Ok(db.delete_client(&id)?)
    }

    // =========================================================================
    // Activity Operations
    // =========================================================================

    /// Add a comment to a client's file.
    pub fn add_comment(
        &self,
        client_id: String,
        text: String,
        author: String,
    ) -> Result<FfiComment, CoachTrackError> {
        let db = self.db.lock()?;
        let comment = db.add_comment(&client_id, &text, &author)?;
        Ok(comment.into())
    }

    /// Record a reading, replacing any reading on the same date.
    pub fn add_weight_entry(
        &self,
        client_id: String,
        date: String,
        weight: f64,
    ) -> Result<FfiWeightEntry, CoachTrackError> {
        let mut db = self.db.lock()?;
        let entry = db.add_weight_entry(&client_id, &date, weight)?;
        Ok(entry.into())
    }

    // =========================================================================
    // Trend Operations
    // =========================================================================

    /// Calendar cell of one client on one day.
    pub fn classify_day(
        &self,
        client_id: String,
        date: String,
    ) -> Result<FfiCalendarCell, CoachTrackError> {
        let day = parse_day(&date)?;
        let db = self.db.lock()?;
        let client = self.require_client(&db, &client_id)?;
        Ok(trend::classify_cell(&client, day).into())
    }

    /// One cell per day of a month.
    pub fn month_calendar(
        &self,
        client_id: String,
        year: i32,
        month: u32,
    ) -> Result<Vec<FfiCalendarDay>, CoachTrackError> {
        let db = self.db.lock()?;
        let client = self.require_client(&db, &client_id)?;
        let calendar = trend::month_calendar(&client, year, month).ok_or_else(|| {
            CoachTrackError::InvalidInput(format!("invalid month {}-{:02}", year, month))
        })?;
        Ok(calendar.days.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Roster Operations
    // =========================================================================

    /// Dashboard counters; `new_this_month` counts starts in `year`/`month`.
    pub fn roster_stats(
        &self,
        year: Option<i32>,
        month: Option<u32>,
    ) -> Result<FfiRosterStats, CoachTrackError> {
        let db = self.db.lock()?;
        let clients = db.list_clients()?;
        let reference = year.zip(month);
        Ok(RosterStats::compute(&clients, reference).into())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe weight reading.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiWeightEntry {
    pub date: String,
    pub weight: f64,
}

impl From<WeightEntry> for FfiWeightEntry {
    fn from(entry: WeightEntry) -> Self {
        Self {
            date: entry.date,
            weight: entry.weight,
        }
    }
}

/// FFI-safe comment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiComment {
    pub id: String,
    pub text: String,
    pub author: String,
    pub timestamp: String,
}

impl From<ClientComment> for FfiComment {
    fn from(comment: ClientComment) -> Self {
        Self {
            id: comment.id,
            text: comment.text,
            author: comment.author,
            timestamp: comment.timestamp,
        }
    }
}

/// FFI-safe client with derived display values.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClient {
    pub id: String,
    pub name: String,
    pub email: String,
    pub start_date: String,
    pub start_weight: f64,
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub height: Option<f64>,
    pub status: String,
    pub notes: String,
    pub health_issues: Vec<String>,
    pub diet_end_date: Option<String>,
    pub routine: String,
    pub health_summary: String,
    pub progress_percent: i64,
    pub recent_trend: String,
    pub weight_entries: Vec<FfiWeightEntry>,
    pub comments: Vec<FfiComment>,
}

impl From<ClientRecord> for FfiClient {
    fn from(client: ClientRecord) -> Self {
        let progress_percent = client.progress_percent();
        let recent_trend = trend::recent_trend(&client.weight_entries).as_str().to_string();
        Self {
            weight_entries: client.sorted_entries().into_iter().map(Into::into).collect(),
            comments: client.comments.into_iter().map(Into::into).collect(),
            id: client.id,
            name: client.name,
            email: client.email,
            start_date: client.start_date,
            start_weight: client.start_weight,
            current_weight: client.current_weight,
            goal_weight: client.goal_weight,
            height: client.height,
            status: client.status.to_string(),
            notes: client.notes,
            health_issues: client.health_issues,
            diet_end_date: client.diet_end_date,
            routine: client.routine,
            health_summary: client.health_summary,
            progress_percent,
            recent_trend,
        }
    }
}

/// FFI-safe add-client form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewClient {
    pub name: String,
    pub email: String,
    pub start_date: String,
    pub start_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub height: Option<f64>,
    pub status: Option<String>,
    pub notes: String,
    pub health_issues: Vec<String>,
    pub diet_end_date: Option<String>,
    pub routine: String,
    pub health_summary: String,
}

impl TryFrom<FfiNewClient> for NewClient {
    type Error = CoachTrackError;

    fn try_from(form: FfiNewClient) -> Result<Self, Self::Error> {
        Ok(NewClient {
            status: parse_status(form.status)?,
            name: form.name,
            email: form.email,
            start_date: form.start_date,
            start_weight: form.start_weight,
            current_weight: form.current_weight,
            goal_weight: form.goal_weight,
            height: form.height,
            notes: form.notes,
            health_issues: form.health_issues,
            diet_end_date: form.diet_end_date,
            routine: form.routine,
            health_summary: form.health_summary,
        })
    }
}

/// FFI-safe partial update. `clear_diet_end_date` removes the end date.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClientUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub start_date: Option<String>,
    pub start_weight: Option<f64>,
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub height: Option<f64>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub health_issues: Option<Vec<String>>,
    pub diet_end_date: Option<String>,
    pub clear_diet_end_date: bool,
    pub routine: Option<String>,
    pub health_summary: Option<String>,
}

impl TryFrom<FfiClientUpdate> for ClientUpdate {
    type Error = CoachTrackError;

    fn try_from(update: FfiClientUpdate) -> Result<Self, Self::Error> {
        let diet_end_date = if update.clear_diet_end_date {
            Some(None)
        } else {
            update.diet_end_date.map(Some)
        };
        Ok(ClientUpdate {
            status: parse_status(update.status)?,
            name: update.name,
            email: update.email,
            start_date: update.start_date,
            start_weight: update.start_weight,
            current_weight: update.current_weight,
            goal_weight: update.goal_weight,
            height: update.height,
            notes: update.notes,
            health_issues: update.health_issues,
            diet_end_date,
            routine: update.routine,
            health_summary: update.health_summary,
        })
    }
}

/// Outcome of a stored import.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiImportSummary {
    /// Store-assigned IDs in input row order
    pub client_ids: Vec<String>,
    pub client_count: u32,
    pub entry_count: u32,
    pub skipped_rows: u32,
    pub message: String,
}

/// FFI-safe trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiTrend {
    Progressing,
    Stagnant,
    Regressing,
    Neutral,
}

impl From<Trend> for FfiTrend {
    fn from(trend: Trend) -> Self {
        match trend {
            Trend::Progressing => FfiTrend::Progressing,
            Trend::Stagnant => FfiTrend::Stagnant,
            Trend::Regressing => FfiTrend::Regressing,
            Trend::Neutral => FfiTrend::Neutral,
        }
    }
}

/// FFI-safe calendar cell.
#[derive(Debug, Clone, PartialEq, uniffi::Enum)]
pub enum FfiCalendarCell {
    NotStarted,
    Empty,
    Recorded { weight: f64, trend: FfiTrend },
}

impl From<CalendarCell> for FfiCalendarCell {
    fn from(cell: CalendarCell) -> Self {
        match cell {
            CalendarCell::NotStarted => FfiCalendarCell::NotStarted,
            CalendarCell::Empty => FfiCalendarCell::Empty,
            CalendarCell::Recorded { weight, trend } => FfiCalendarCell::Recorded {
                weight,
                trend: trend.into(),
            },
        }
    }
}

/// FFI-safe calendar day.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCalendarDay {
    pub date: String,
    pub cell: FfiCalendarCell,
}

impl From<trend::CalendarDay> for FfiCalendarDay {
    fn from(day: trend::CalendarDay) -> Self {
        Self {
            date: models::format_date(day.date),
            cell: day.cell.into(),
        }
    }
}

/// FFI-safe roster statistics.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FfiRosterStats {
    pub total: u32,
    pub active: u32,
    pub inactive: u32,
    pub yet_to_start: u32,
    pub completed: u32,
    pub new_this_month: u32,
}

impl From<RosterStats> for FfiRosterStats {
    fn from(stats: RosterStats) -> Self {
        Self {
            total: stats.total as u32,
            active: stats.active as u32,
            inactive: stats.inactive as u32,
            yet_to_start: stats.yet_to_start as u32,
            completed: stats.completed as u32,
            new_this_month: stats.new_this_month as u32,
        }
    }
}
