use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use log::warn;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

use crate::db::models::Event;

use super::violation::ViolationKind;

/// Live notification pushed to transport subscribers when an alert fires.
/// The field names match the `proctoring_alert` payload on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct LiveAlert {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub message: String,
}

/// Rate-limits alert emission per violation kind and fans each emitted alert
/// out to live subscribers and the persistence worker.
///
/// Cooldown state lives for the whole session and is never reset when the
/// underlying condition clears, so a flapping violation cannot re-fire
/// faster than the cooldown.
pub struct AlertDispatcher {
    session_id: String,
    candidate_name: String,
    cooldown: Duration,
    last_fired_at: HashMap<ViolationKind, DateTime<Utc>>,
    alert_tx: broadcast::Sender<LiveAlert>,
    store_tx: mpsc::UnboundedSender<Event>,
}

impl AlertDispatcher {
    pub fn new(
        session_id: String,
        candidate_name: String,
        cooldown_secs: u64,
        alert_tx: broadcast::Sender<LiveAlert>,
        store_tx: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            session_id,
            candidate_name,
            cooldown: Duration::seconds(cooldown_secs as i64),
            last_fired_at: HashMap::new(),
            alert_tx,
            store_tx,
        }
    }

    /// Emit an alert unless one of the same kind fired within the cooldown
    /// window. Returns whether the alert was emitted.
    ///
    /// Emission never blocks the signal path: the live notification is
    /// fire-and-forget and the event record is handed to the background
    /// store worker. A dropped hand-off is logged and swallowed.
    pub fn dispatch(
        &mut self,
        kind: ViolationKind,
        message: String,
        metadata: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> bool {
        if let Some(last) = self.last_fired_at.get(&kind) {
            if now - *last <= self.cooldown {
                return false;
            }
        }
        self.last_fired_at.insert(kind, now);

        // A session with no live subscribers is fine; the send result is
        // intentionally ignored.
        let _ = self.alert_tx.send(LiveAlert {
            kind,
            message: message.clone(),
        });

        let event = Event {
            id: None,
            session_id: self.session_id.clone(),
            candidate_name: self.candidate_name.clone(),
            timestamp: now,
            kind,
            message,
            metadata,
        };

        if self.store_tx.send(event).is_err() {
            warn!(
                "store worker for session {} is gone; dropping {} event",
                self.session_id,
                kind.as_str()
            );
        }

        true
    }

    pub fn last_fired_at(&self, kind: ViolationKind) -> Option<DateTime<Utc>> {
        self.last_fired_at.get(&kind).copied()
    }
}
