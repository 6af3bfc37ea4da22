//! Weight entries and comments.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::{Database, DbError, DbResult};
use crate::models::{parse_date, ClientComment, WeightEntry};

/// Insert or overwrite the reading for `(client_id, entry.date)`.
pub(crate) fn upsert_weight_entry(
    conn: &Connection,
    client_id: &str,
    entry: &WeightEntry,
) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO weight_entries (client_id, date, weight)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(client_id, date) DO UPDATE SET weight = excluded.weight
        "#,
        params![client_id, entry.date, entry.weight],
    )?;
    Ok(())
}

pub(crate) fn insert_comment(
    conn: &Connection,
    client_id: &str,
    comment: &ClientComment,
) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO client_comments (id, client_id, text, author, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            comment.id,
            client_id,
            comment.text,
            comment.author,
            comment.timestamp
        ],
    )?;
    Ok(())
}

fn require_client(conn: &Connection, client_id: &str) -> DbResult<()> {
    conn.query_row("SELECT 1 FROM clients WHERE id = ?", [client_id], |_| Ok(()))
        .optional()?
        .ok_or_else(|| DbError::NotFound(client_id.to_string()))
}

/// Point `current_weight` at the latest-dated reading, or back at
/// `start_weight` once no readings are left.
fn refresh_current_weight(conn: &Connection, client_id: &str) -> DbResult<()> {
    conn.execute(
        r#"
        UPDATE clients SET
            current_weight = COALESCE(
                (
                    SELECT weight FROM weight_entries
                    WHERE client_id = ?1
                    ORDER BY date DESC
                    LIMIT 1
                ),
                start_weight
            ),
            updated_at = datetime('now')
        WHERE id = ?1
        "#,
        [client_id],
    )?;
    Ok(())
}

impl Database {
    /// Append a comment to a client's file.
    pub fn add_comment(&self, client_id: &str, text: &str, author: &str) -> DbResult<ClientComment> {
        if text.trim().is_empty() {
            return Err(DbError::Constraint("comment text is empty".into()));
        }
        require_client(&self.conn, client_id)?;

        let comment = ClientComment::new(text.trim(), author);
        insert_comment(&self.conn, client_id, &comment)?;
        debug!(client_id, comment_id = %comment.id, "added comment");
        Ok(comment)
    }

    /// Record a reading. An existing reading on the same date is replaced.
    /// The client's current weight follows the latest-dated reading.
    pub fn add_weight_entry(
        &mut self,
        client_id: &str,
        date: &str,
        weight: f64,
    ) -> DbResult<WeightEntry> {
        let Some(day) = parse_date(date) else {
            return Err(DbError::Constraint(format!(
                "invalid date {:?}, expected YYYY-MM-DD",
                date
            )));
        };
        if !weight.is_finite() || weight <= 0.0 {
            return Err(DbError::Constraint(format!(
                "weight must be positive, got {}",
                weight
            )));
        }
        let entry = WeightEntry::new(crate::models::format_date(day), weight);

        let tx = self.transaction()?;
        require_client(&tx, client_id)?;
        upsert_weight_entry(&tx, client_id, &entry)?;
        refresh_current_weight(&tx, client_id)?;
        tx.commit()?;

        debug!(client_id, date = %entry.date, weight, "recorded weight");
        Ok(entry)
    }

    /// Readings of one client, by date.
    pub fn weight_entries(&self, client_id: &str) -> DbResult<Vec<WeightEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, weight FROM weight_entries WHERE client_id = ? ORDER BY date ASC",
        )?;
        let rows = stmt.query_map([client_id], |row| {
            Ok(WeightEntry {
                date: row.get(0)?,
                weight: row.get(1)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete one reading. Returns false if there was none. The client's
    /// current weight moves to the latest remaining reading.
    pub fn delete_weight_entry(&mut self, client_id: &str, date: &str) -> DbResult<bool> {
        let Some(day) = parse_date(date) else {
            return Err(DbError::Constraint(format!(
                "invalid date {:?}, expected YYYY-MM-DD",
                date
            )));
        };
        let date = crate::models::format_date(day);

        let tx = self.transaction()?;
        let rows_affected = tx.execute(
            "DELETE FROM weight_entries WHERE client_id = ?1 AND date = ?2",
            params![client_id, date],
        )?;
        if rows_affected > 0 {
            refresh_current_weight(&tx, client_id)?;
        }
        tx.commit()?;

        if rows_affected > 0 {
            debug!(client_id, date = %date, "deleted weight");
        }
        Ok(rows_affected > 0)
    }
}
