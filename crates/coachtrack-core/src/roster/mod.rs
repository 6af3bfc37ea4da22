//! Roster search, filtering and dashboard statistics.

use std::fmt;
use std::str::FromStr;

use chrono::Datelike;
use serde::Serialize;

use crate::models::{ClientRecord, ClientStatus, UnknownStatus};

/// Status filter of the roster view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ClientStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: ClientStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "all" => Ok(StatusFilter::All),
            other => other.parse().map(StatusFilter::Only),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => f.write_str("all"),
            StatusFilter::Only(status) => write!(f, "{}", status),
        }
    }
}

/// Search text plus status filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterQuery {
    /// Case-insensitive substring of name or email
    pub search: String,
    pub status: StatusFilter,
}

impl RosterQuery {
    pub fn new(search: impl Into<String>, status: StatusFilter) -> Self {
        Self {
            search: search.into(),
            status,
        }
    }

    pub fn matches(&self, client: &ClientRecord) -> bool {
        let needle = self.search.to_lowercase();
        let text_match = client.name.to_lowercase().contains(&needle)
            || client.email.to_lowercase().contains(&needle);
        text_match && self.status.matches(client.status)
    }

    /// Matching clients, in roster order.
    pub fn apply<'a>(&self, clients: &'a [ClientRecord]) -> Vec<&'a ClientRecord> {
        clients.iter().filter(|c| self.matches(c)).collect()
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct RosterStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub yet_to_start: usize,
    pub completed: usize,
    /// Clients whose program starts in the reference month
    pub new_this_month: usize,
}

impl RosterStats {
    /// Count clients; `month` is the `(year, month)` used for `new_this_month`.
    pub fn compute(clients: &[ClientRecord], month: Option<(i32, u32)>) -> Self {
        let mut stats = RosterStats {
            total: clients.len(),
            ..RosterStats::default()
        };
        for client in clients {
            match client.status {
                ClientStatus::Active => stats.active += 1,
                ClientStatus::Inactive => stats.inactive += 1,
                ClientStatus::YetToStart => stats.yet_to_start += 1,
                ClientStatus::Completed => stats.completed += 1,
            }
            if let (Some((year, m)), Some(start)) = (month, client.parsed_start_date()) {
                if start.year() == year && start.month() == m {
                    stats.new_this_month += 1;
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<ClientRecord> {
        let mut a = ClientRecord::new(
            "Priya Sharma".into(),
            "priya@example.com".into(),
            "2025-06-03".into(),
            80.0,
        );
        a.status = ClientStatus::Active;
        let mut b = ClientRecord::new(
            "Tom Reed".into(),
            "tom.reed@imported.com".into(),
            "2025-05-20".into(),
            95.0,
        );
        b.status = ClientStatus::Inactive;
        let mut c = ClientRecord::new(
            "Sharon Wu".into(),
            "swu@example.com".into(),
            "2025-06-20".into(),
            70.0,
        );
        c.status = ClientStatus::Completed;
        vec![a, b, c]
    }

    #[test]
    fn test_search_name_or_email() {
        let clients = roster();
        let query = RosterQuery::new("SHAR", StatusFilter::All);
        let names: Vec<_> = query.apply(&clients).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Priya Sharma", "Sharon Wu"]);

        let query = RosterQuery::new("imported", StatusFilter::All);
        assert_eq!(query.apply(&clients).len(), 1);
    }

    #[test]
    fn test_status_filter() {
        let clients = roster();
        let query = RosterQuery::new("", "completed".parse().unwrap());
        let found = query.apply(&clients);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Sharon Wu");

        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert!("paused".parse::<StatusFilter>().is_err());
        assert_eq!(StatusFilter::Only(ClientStatus::YetToStart).to_string(), "yet-to-start");
    }

    #[test]
    fn test_stats() {
        let stats = RosterStats::compute(&roster(), Some((2025, 6)));
        assert_eq!(
            stats,
            RosterStats {
                total: 3,
                active: 1,
                inactive: 1,
                yet_to_start: 0,
                completed: 1,
                new_this_month: 2,
            }
        );
        assert_eq!(RosterStats::compute(&roster(), None).new_this_month, 0);
    }
}
