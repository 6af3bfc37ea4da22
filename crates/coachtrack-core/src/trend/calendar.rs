//! Calendar cells and month grids.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::{DailyWeights, Trend};
use crate::models::ClientRecord;

/// What a calendar cell shows for one client and day.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum CalendarCell {
    /// Before the client's program start
    NotStarted,
    /// No reading that day
    Empty,
    /// A reading, with the trend as of that day
    Recorded { weight: f64, trend: Trend },
}

impl CalendarCell {
    /// Trend shown for the cell; `Neutral` unless a reading was recorded.
    pub fn trend(&self) -> Trend {
        match self {
            CalendarCell::Recorded { trend, .. } => *trend,
            _ => Trend::Neutral,
        }
    }
}

/// One day of a month grid.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub cell: CalendarCell,
}

/// A client's month, one cell per day.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthCalendar {
    pub client_id: String,
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
}

impl MonthCalendar {
    /// Number of days showing `trend`.
    pub fn count(&self, trend: Trend) -> usize {
        self.days
            .iter()
            .filter(|d| matches!(d.cell, CalendarCell::Recorded { trend: t, .. } if t == trend))
            .count()
    }
}

/// Cell classifier for one client. Builds the date index once, so a whole
/// grid costs a single pass over the history.
pub struct ClientCalendar<'a> {
    client: &'a ClientRecord,
    start: Option<NaiveDate>,
    weights: DailyWeights,
}

impl<'a> ClientCalendar<'a> {
    pub fn new(client: &'a ClientRecord) -> Self {
        Self {
            client,
            start: client.parsed_start_date(),
            weights: DailyWeights::from_entries(&client.weight_entries),
        }
    }

    /// Cell for `day`. An unreadable start date never hides a day.
    pub fn cell(&self, day: NaiveDate) -> CalendarCell {
        if matches!(self.start, Some(start) if day < start) {
            return CalendarCell::NotStarted;
        }
        match self.weights.weight_on(day) {
            Some(weight) => CalendarCell::Recorded {
                weight,
                trend: self.weights.classify(day),
            },
            None => CalendarCell::Empty,
        }
    }

    /// Grid for a month; `None` if the month does not exist.
    pub fn month(&self, year: i32, month: u32) -> Option<MonthCalendar> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let days = first
            .iter_days()
            .take_while(|d| d.month() == month)
            .map(|date| CalendarDay {
                date,
                cell: self.cell(date),
            })
            .collect();
        Some(MonthCalendar {
            client_id: self.client.id.clone(),
            year,
            month,
            days,
        })
    }
}

/// Cell for one client and day.
pub fn classify_cell(client: &ClientRecord, day: NaiveDate) -> CalendarCell {
    ClientCalendar::new(client).cell(day)
}

/// Month grid for one client.
pub fn month_calendar(client: &ClientRecord, year: i32, month: u32) -> Option<MonthCalendar> {
    ClientCalendar::new(client).month(year, month)
}
