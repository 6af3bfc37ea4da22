//! SQLite schema definition.

/// Complete database schema for coachtrack.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Clients
-- ============================================================================

CREATE TABLE IF NOT EXISTS clients (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    email TEXT NOT NULL CHECK (length(trim(email)) > 0),
    start_date TEXT NOT NULL,
    start_weight REAL NOT NULL DEFAULT 0,
    current_weight REAL,
    goal_weight REAL,
    height REAL,
    status TEXT NOT NULL DEFAULT 'active'
        CHECK (status IN ('active', 'inactive', 'yet-to-start', 'completed')),
    notes TEXT NOT NULL DEFAULT '',
    health_issues TEXT NOT NULL DEFAULT '[]',    -- JSON array of strings
    diet_end_date TEXT,                          -- NULL, never ''
    routine TEXT NOT NULL DEFAULT '',
    health_summary TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_clients_status ON clients(status);
CREATE INDEX IF NOT EXISTS idx_clients_name ON clients(name);

-- ============================================================================
-- Weight Entries (one per client per day)
-- ============================================================================

CREATE TABLE IF NOT EXISTS weight_entries (
    id INTEGER PRIMARY KEY,
    client_id TEXT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    date TEXT NOT NULL,
    weight REAL NOT NULL CHECK (weight > 0),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (client_id, date)
);

CREATE INDEX IF NOT EXISTS idx_weight_entries_client ON weight_entries(client_id, date);

-- ============================================================================
-- Client Comments
-- ============================================================================

CREATE TABLE IF NOT EXISTS client_comments (
    id TEXT PRIMARY KEY,
    client_id TEXT NOT NULL REFERENCES clients(id) ON DELETE CASCADE,
    text TEXT NOT NULL,
    author TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_client_comments_client ON client_comments(client_id, created_at);
"#;
