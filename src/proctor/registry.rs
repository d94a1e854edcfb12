use std::{collections::HashMap, sync::Arc, time::Instant};

use anyhow::Result;
use chrono::Utc;
use log::{error, info, warn};
use tokio::sync::{broadcast, mpsc, Mutex};
use uuid::Uuid;

use crate::db::{
    models::{InterviewSession, SessionStatus},
    Database,
};
use crate::metrics::MetricsCollector;

use super::config::ProctorConfig;
use super::dispatch::LiveAlert;
use super::session::ProctorSession;
use super::signal::SignalSnapshot;
use super::store_worker::EventStoreWorker;

const ALERT_CHANNEL_CAPACITY: usize = 64;

struct SessionEntry {
    session: Arc<Mutex<ProctorSession>>,
    alert_tx: broadcast::Sender<LiveAlert>,
    store_worker: EventStoreWorker,
    session_id: String,
}

/// Owns every live session, keyed by transport connection id.
///
/// One session may be active per connection; starting a new one replaces
/// the old. Each session sits behind its own lock so processing for one
/// connection is serialized in arrival order while distinct sessions
/// proceed in parallel. Signals routed to a connection with no live
/// session are silently dropped (late frames after disconnect).
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    db: Database,
    config: ProctorConfig,
    metrics: MetricsCollector,
}

impl SessionRegistry {
    pub fn new(db: Database, config: ProctorConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            db,
            config,
            metrics: MetricsCollector::new(),
        }
    }

    /// Finalize sessions a previous process left Running (crash recovery).
    pub async fn recover_interrupted(&self) -> Result<()> {
        let now = Utc::now();
        for session in self.db.get_running_sessions().await? {
            warn!(
                "Recovered incomplete session {}; marking as Interrupted",
                session.id
            );
            self.db
                .mark_session_status(&session.id, SessionStatus::Interrupted, Some(now), now)
                .await?;
        }
        Ok(())
    }

    /// Start a session for this connection, replacing any session still
    /// live on it (the replaced session's in-memory state is abandoned; no
    /// timers carry over).
    pub async fn start_session(&self, conn_id: &str, candidate_name: &str) -> Result<String> {
        if let Some(previous) = self.remove_entry(conn_id).await {
            warn!(
                "Connection {conn_id} started a new session while {} was live; replacing it",
                previous.session_id
            );
            self.retire_entry(previous, SessionStatus::Interrupted).await;
        }

        let session_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();

        self.db
            .insert_session(&InterviewSession {
                id: session_id.clone(),
                candidate_name: candidate_name.to_string(),
                started_at,
                stopped_at: None,
                status: SessionStatus::Running,
                created_at: started_at,
                updated_at: started_at,
            })
            .await?;

        let (alert_tx, _) = broadcast::channel(ALERT_CHANNEL_CAPACITY);
        let (store_tx, store_rx) = mpsc::unbounded_channel();
        let store_worker = EventStoreWorker::start(
            session_id.clone(),
            self.db.clone(),
            store_rx,
            self.metrics.clone(),
        );

        let session = ProctorSession::new(
            session_id.clone(),
            candidate_name.to_string(),
            self.config.clone(),
            alert_tx.clone(),
            store_tx,
        );

        let entry = SessionEntry {
            session: Arc::new(Mutex::new(session)),
            alert_tx,
            store_worker,
            session_id: session_id.clone(),
        };

        self.sessions
            .lock()
            .await
            .insert(conn_id.to_string(), entry);

        info!("Started proctoring session {session_id} for {candidate_name}");
        Ok(session_id)
    }

    /// End the connection's session, if any. Idempotent; returns the ended
    /// session id. The store worker is drained before this returns, so a
    /// report generated afterwards sees every dispatched event.
    pub async fn end_session(&self, conn_id: &str) -> Result<Option<String>> {
        let Some(entry) = self.remove_entry(conn_id).await else {
            return Ok(None);
        };

        let session_id = entry.session_id.clone();
        self.retire_entry(entry, SessionStatus::Completed).await;
        info!("Ended proctoring session {session_id}");
        Ok(Some(session_id))
    }

    /// Route one frame's signals to the connection's session. A connection
    /// with no live session drops the snapshot without error.
    pub async fn process_frame(&self, conn_id: &str, snapshot: &SignalSnapshot) {
        let Some(session) = self.session_for(conn_id).await else {
            return;
        };

        let started = Instant::now();
        {
            let mut guard = session.lock().await;
            guard.process(snapshot, Utc::now());
        }
        self.metrics.record_frame(started.elapsed()).await;
    }

    /// Route an out-of-band audio violation to the connection's session.
    pub async fn process_audio(&self, conn_id: &str, message: &str) {
        let Some(session) = self.session_for(conn_id).await else {
            return;
        };

        {
            let mut guard = session.lock().await;
            guard.report_audio(message, Utc::now());
        }
        self.metrics.record_audio_event().await;
    }

    /// Subscribe to the live alerts of the connection's current session.
    pub async fn subscribe_alerts(&self, conn_id: &str) -> Option<broadcast::Receiver<LiveAlert>> {
        self.sessions
            .lock()
            .await
            .get(conn_id)
            .map(|entry| entry.alert_tx.subscribe())
    }

    /// Session id currently live on this connection, if any.
    pub async fn current_session_id(&self, conn_id: &str) -> Option<String> {
        self.sessions
            .lock()
            .await
            .get(conn_id)
            .map(|entry| entry.session_id.clone())
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    async fn session_for(&self, conn_id: &str) -> Option<Arc<Mutex<ProctorSession>>> {
        // Clone the Arc out so the map lock is released before the
        // per-session lock is taken; sessions must not serialize each other.
        self.sessions
            .lock()
            .await
            .get(conn_id)
            .map(|entry| Arc::clone(&entry.session))
    }

    async fn remove_entry(&self, conn_id: &str) -> Option<SessionEntry> {
        self.sessions.lock().await.remove(conn_id)
    }

    async fn retire_entry(&self, mut entry: SessionEntry, status: SessionStatus) {
        let stopped_at = Utc::now();

        if let Err(err) = entry.store_worker.stop().await {
            error!(
                "store worker for session {} did not stop cleanly: {err:?}",
                entry.session_id
            );
        }

        if let Err(err) = self
            .db
            .mark_session_status(&entry.session_id, status, Some(stopped_at), stopped_at)
            .await
        {
            error!("failed to finalize session {}: {err:?}", entry.session_id);
        }
    }
}
