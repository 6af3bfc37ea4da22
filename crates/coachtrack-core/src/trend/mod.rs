//! Weight-trend classification for the calendar view.
//!
//! A day is classified from the readings in the 7 calendar days ending on it
//! (and the trailing 4 of those). Classification is stateless and never
//! fails: missing data degrades to [`Trend::Neutral`].

mod calendar;

pub use calendar::*;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::WeightEntry;

/// Display classification of one calendar day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Losing weight over the week
    Progressing,
    /// Four consecutive days without a drop
    Stagnant,
    /// Flat or gaining over the week
    Regressing,
    /// Not enough data, or no reading that day
    #[serde(rename = "none")]
    Neutral,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Progressing => "progressing",
            Trend::Stagnant => "stagnant",
            Trend::Regressing => "regressing",
            Trend::Neutral => "none",
        }
    }
}

/// Readings indexed by day. A later entry for the same day overrides an
/// earlier one; entries with unparseable dates are ignored.
#[derive(Debug, Clone, Default)]
pub struct DailyWeights {
    by_day: BTreeMap<NaiveDate, f64>,
}

impl DailyWeights {
    pub fn from_entries(entries: &[WeightEntry]) -> Self {
        let by_day = entries
            .iter()
            .filter_map(|e| e.parsed_date().map(|d| (d, e.weight)))
            .collect();
        Self { by_day }
    }

    pub fn len(&self) -> usize {
        self.by_day.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_day.is_empty()
    }

    /// Reading recorded on `day`.
    pub fn weight_on(&self, day: NaiveDate) -> Option<f64> {
        self.by_day.get(&day).copied()
    }

    /// Readings in the `days` calendar days ending at `target`, oldest first.
    fn window(&self, target: NaiveDate, days: u64) -> Vec<f64> {
        let start = target
            .checked_sub_days(Days::new(days - 1))
            .unwrap_or(NaiveDate::MIN);
        self.by_day.range(start..=target).map(|(_, w)| *w).collect()
    }

    /// Classify `target`.
    pub fn classify(&self, target: NaiveDate) -> Trend {
        if self.weight_on(target).is_none() {
            return Trend::Neutral;
        }
        classify_window(&self.window(target, 7), &self.window(target, 4))
    }
}

/// Classify `target` from an unordered list of entries.
pub fn classify_day(entries: &[WeightEntry], target: NaiveDate) -> Trend {
    DailyWeights::from_entries(entries).classify(target)
}

/// Rules over the 7-day and 4-day windows, first match wins.
///
/// A perfectly flat week is checked before the 4-day rule so that it reads
/// as regressing rather than stagnant.
fn classify_window(last7: &[f64], last4: &[f64]) -> Trend {
    if last7.len() < 2 {
        return Trend::Neutral;
    }

    let (min, max) = last7
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), w| {
            (lo.min(*w), hi.max(*w))
        });
    if max - min == 0.0 {
        return Trend::Regressing;
    }

    if last4.len() >= 4 && last4.windows(2).all(|pair| pair[1] >= pair[0]) {
        return Trend::Stagnant;
    }

    let first = last7[0];
    let last = last7[last7.len() - 1];

    if last7.len() == 7 && last >= first {
        return Trend::Regressing;
    }

    if last7.len() >= 3 && last < first {
        let (decreases, increases) =
            last7
                .windows(2)
                .fold((0usize, 0usize), |(down, up), pair| {
                    if pair[1] < pair[0] {
                        (down + 1, up)
                    } else if pair[1] > pair[0] {
                        (down, up + 1)
                    } else {
                        (down, up)
                    }
                });
        if decreases >= increases {
            return Trend::Progressing;
        }
    }

    Trend::Neutral
}

/// Direction of the two most recent readings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecentTrend {
    Decreasing,
    Increasing,
    Stable,
}

impl RecentTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecentTrend::Decreasing => "decreasing",
            RecentTrend::Increasing => "increasing",
            RecentTrend::Stable => "stable",
        }
    }
}

/// Change below this (kg) between the last two readings counts as stable.
pub const RECENT_TREND_TOLERANCE: f64 = 0.5;

/// Compare the two most recent readings by date.
pub fn recent_trend(entries: &[WeightEntry]) -> RecentTrend {
    let mut sorted: Vec<&WeightEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| a.date.cmp(&b.date));

    let [.., previous, latest] = sorted.as_slice() else {
        return RecentTrend::Stable;
    };
    let diff = latest.weight - previous.weight;
    if diff < -RECENT_TREND_TOLERANCE {
        RecentTrend::Decreasing
    } else if diff > RECENT_TREND_TOLERANCE {
        RecentTrend::Increasing
    } else {
        RecentTrend::Stable
    }
}
