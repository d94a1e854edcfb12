use anyhow::{Context, Result};
use rusqlite::params;

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_kind},
    models::Event,
};

impl Database {
    /// Append one event. Events are immutable once written; there is no
    /// update or delete path.
    pub async fn insert_event(&self, event: &Event) -> Result<()> {
        let record = event.clone();
        self.execute(move |conn| {
            let metadata_json = record
                .metadata
                .as_ref()
                .map(serde_json::to_string)
                .transpose()
                .context("failed to serialize event metadata")?;

            conn.execute(
                "INSERT INTO events (session_id, candidate_name, timestamp, kind, message, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.session_id,
                    record.candidate_name,
                    record.timestamp.to_rfc3339(),
                    record.kind.as_str(),
                    record.message,
                    metadata_json,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// All events for a session, in the order they were appended.
    pub async fn get_events_for_session(&self, session_id: &str) -> Result<Vec<Event>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, candidate_name, timestamp, kind, message, metadata
                 FROM events
                 WHERE session_id = ?1
                 ORDER BY id ASC",
            )?;

            let mut rows = stmt.query(params![session_id])?;
            let mut events = Vec::new();
            while let Some(row) = rows.next()? {
                let timestamp: String = row.get("timestamp")?;
                let kind: String = row.get("kind")?;
                let metadata: Option<String> = row.get("metadata")?;

                events.push(Event {
                    id: row.get("id")?,
                    session_id: row.get("session_id")?,
                    candidate_name: row.get("candidate_name")?,
                    timestamp: parse_datetime(&timestamp, "timestamp")?,
                    kind: parse_kind(&kind)?,
                    message: row.get("message")?,
                    metadata: metadata
                        .map(|raw| serde_json::from_str(&raw))
                        .transpose()
                        .context("failed to parse event metadata")?,
                });
            }

            Ok(events)
        })
        .await
    }
}
