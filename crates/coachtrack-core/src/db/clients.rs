//! Client database operations.

use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use super::activity::{insert_comment, upsert_weight_entry};
use super::{Database, DbError, DbResult};
use crate::models::{ClientComment, ClientRecord, ClientStatus, ClientUpdate, WeightEntry};

const CLIENT_COLUMNS: &str = r#"
    id, name, email, start_date, start_weight, current_weight, goal_weight,
    height, status, notes, health_issues, diet_end_date, routine, health_summary
"#;

/// Raw client row before JSON/status decoding.
struct ClientRow {
    id: String,
    name: String,
    email: String,
    start_date: String,
    start_weight: f64,
    current_weight: Option<f64>,
    goal_weight: Option<f64>,
    height: Option<f64>,
    status: String,
    notes: String,
    health_issues: String,
    diet_end_date: Option<String>,
    routine: String,
    health_summary: String,
}

impl ClientRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ClientRow {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            start_date: row.get(3)?,
            start_weight: row.get(4)?,
            current_weight: row.get(5)?,
            goal_weight: row.get(6)?,
            height: row.get(7)?,
            status: row.get(8)?,
            notes: row.get(9)?,
            health_issues: row.get(10)?,
            diet_end_date: row.get(11)?,
            routine: row.get(12)?,
            health_summary: row.get(13)?,
        })
    }
}

impl TryFrom<ClientRow> for ClientRecord {
    type Error = DbError;

    fn try_from(row: ClientRow) -> Result<Self, Self::Error> {
        let status: ClientStatus = row
            .status
            .parse()
            .map_err(|e: crate::models::UnknownStatus| DbError::Constraint(e.to_string()))?;
        let health_issues: Vec<String> = serde_json::from_str(&row.health_issues)?;

        Ok(ClientRecord {
            id: row.id,
            name: row.name,
            email: row.email,
            start_date: row.start_date,
            start_weight: row.start_weight,
            current_weight: row.current_weight,
            goal_weight: row.goal_weight,
            height: row.height,
            status,
            notes: row.notes,
            health_issues,
            diet_end_date: row.diet_end_date,
            routine: row.routine,
            health_summary: row.health_summary,
            weight_entries: Vec::new(),
            comments: Vec::new(),
        })
    }
}

/// Insert the client row only, under `id`.
fn insert_client_row(conn: &Connection, id: &str, client: &ClientRecord) -> DbResult<()> {
    let health_issues_json = serde_json::to_string(&client.health_issues)?;
    conn.execute(
        r#"
        INSERT INTO clients (
            id, name, email, start_date, start_weight, current_weight, goal_weight,
            height, status, notes, health_issues, diet_end_date, routine, health_summary
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
        params![
            id,
            client.name,
            client.email,
            client.start_date,
            client.start_weight,
            client.current_weight,
            client.goal_weight,
            client.height,
            client.status.as_str(),
            client.notes,
            health_issues_json,
            client.diet_end_date,
            client.routine,
            client.health_summary,
        ],
    )?;
    Ok(())
}

/// Insert a client with its history under a freshly assigned ID.
fn insert_client_tree(conn: &Connection, client: &ClientRecord) -> DbResult<String> {
    let id = uuid::Uuid::new_v4().to_string();
    insert_client_row(conn, &id, client)?;
    for entry in &client.weight_entries {
        upsert_weight_entry(conn, &id, entry)?;
    }
    for comment in &client.comments {
        let mut comment = comment.clone();
        comment.id = uuid::Uuid::new_v4().to_string();
        if comment.timestamp.is_empty() {
            comment.timestamp = chrono::Utc::now().to_rfc3339();
        }
        insert_comment(conn, &id, &comment)?;
    }
    Ok(id)
}

fn load_entries(conn: &Connection, client_id: Option<&str>) -> DbResult<HashMap<String, Vec<WeightEntry>>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT client_id, date, weight
        FROM weight_entries
        WHERE ?1 IS NULL OR client_id = ?1
        ORDER BY date ASC
        "#,
    )?;
    let rows = stmt.query_map([client_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            WeightEntry {
                date: row.get(1)?,
                weight: row.get(2)?,
            },
        ))
    })?;

    let mut by_client: HashMap<String, Vec<WeightEntry>> = HashMap::new();
    for row in rows {
        let (id, entry) = row?;
        by_client.entry(id).or_default().push(entry);
    }
    Ok(by_client)
}

fn load_comments(
    conn: &Connection,
    client_id: Option<&str>,
) -> DbResult<HashMap<String, Vec<ClientComment>>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT client_id, id, text, author, created_at
        FROM client_comments
        WHERE ?1 IS NULL OR client_id = ?1
        ORDER BY created_at ASC, rowid ASC
        "#,
    )?;
    let rows = stmt.query_map([client_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            ClientComment {
                id: row.get(1)?,
                text: row.get(2)?,
                author: row.get(3)?,
                timestamp: row.get(4)?,
            },
        ))
    })?;

    let mut by_client: HashMap<String, Vec<ClientComment>> = HashMap::new();
    for row in rows {
        let (id, comment) = row?;
        by_client.entry(id).or_default().push(comment);
    }
    Ok(by_client)
}

impl Database {
    /// Insert clients with their weight entries and comments in one
    /// transaction. The store assigns new IDs, returned in input order.
    pub fn create_clients(&mut self, clients: &[ClientRecord]) -> DbResult<Vec<String>> {
        let tx = self.transaction()?;
        let mut ids = Vec::with_capacity(clients.len());
        for client in clients {
            ids.push(insert_client_tree(&tx, client)?);
        }
        tx.commit()?;

        info!(
            clients = ids.len(),
            entries = clients.iter().map(|c| c.weight_entries.len()).sum::<usize>(),
            "stored clients"
        );
        Ok(ids)
    }

    /// Insert one client; returns the store-assigned ID.
    pub fn create_client(&mut self, client: &ClientRecord) -> DbResult<String> {
        let mut ids = self.create_clients(std::slice::from_ref(client))?;
        ids.pop()
            .ok_or_else(|| DbError::Constraint("no client inserted".into()))
    }

    /// Check whether a client exists.
    pub fn client_exists(&self, id: &str) -> DbResult<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM clients WHERE id = ?", [id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    /// Get a client with entries (by date) and comments (oldest first).
    pub fn get_client(&self, id: &str) -> DbResult<Option<ClientRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM clients WHERE id = ?", CLIENT_COLUMNS),
                [id],
                ClientRow::from_row,
            )
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut client: ClientRecord = row.try_into()?;
        client.weight_entries = load_entries(&self.conn, Some(id))?
            .remove(id)
            .unwrap_or_default();
        client.comments = load_comments(&self.conn, Some(id))?
            .remove(id)
            .unwrap_or_default();
        Ok(Some(client))
    }

    /// List all clients, newest first, with their history.
    pub fn list_clients(&self) -> DbResult<Vec<ClientRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM clients ORDER BY created_at DESC, rowid DESC",
            CLIENT_COLUMNS
        ))?;
        let rows = stmt.query_map([], ClientRow::from_row)?;

        let mut entries = load_entries(&self.conn, None)?;
        let mut comments = load_comments(&self.conn, None)?;

        let mut clients = Vec::new();
        for row in rows {
            let mut client: ClientRecord = row?.try_into()?;
            client.weight_entries = entries.remove(&client.id).unwrap_or_default();
            client.comments = comments.remove(&client.id).unwrap_or_default();
            clients.push(client);
        }
        Ok(clients)
    }

    /// Apply a partial update. Returns false if the client does not exist.
    pub fn update_client(&self, id: &str, update: &ClientUpdate) -> DbResult<bool> {
        update
            .validate()
            .map_err(|e| DbError::Constraint(e.to_string()))?;
        let Some(mut client) = self.get_client(id)? else {
            return Ok(false);
        };
        update.apply_to(&mut client);

        let health_issues_json = serde_json::to_string(&client.health_issues)?;
        let rows_affected = self.conn.execute(
            r#"
            UPDATE clients SET
                name = ?2,
                email = ?3,
                start_date = ?4,
                start_weight = ?5,
                current_weight = ?6,
                goal_weight = ?7,
                height = ?8,
                status = ?9,
                notes = ?10,
                health_issues = ?11,
                diet_end_date = ?12,
                routine = ?13,
                health_summary = ?14,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
            params![
                id,
                client.name,
                client.email,
                client.start_date,
                client.start_weight,
                client.current_weight,
                client.goal_weight,
                client.height,
                client.status.as_str(),
                client.notes,
                health_issues_json,
                client.diet_end_date,
                client.routine,
                client.health_summary,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Delete a client; entries and comments go with it.
    pub fn delete_client(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM clients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}
