use anyhow::{Context, Result};
use log::{error, info};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::db::{models::Event, Database};
use crate::metrics::MetricsCollector;

/// Owns the background task that drains dispatched events into the durable
/// store. One worker per live session; stopping it drains what is already
/// queued so a report generated right after session end sees every event.
pub struct EventStoreWorker {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl EventStoreWorker {
    pub fn start(
        session_id: String,
        db: Database,
        rx: mpsc::UnboundedReceiver<Event>,
        metrics: MetricsCollector,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        let handle = tokio::spawn(store_loop(session_id, db, rx, token_clone, metrics));

        Self {
            handle: Some(handle),
            cancel_token: Some(cancel_token),
        }
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("store worker task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

/// Write failures are logged and dropped; the signal path never waits on
/// this loop and never sees its errors.
async fn store_loop(
    session_id: String,
    db: Database,
    mut rx: mpsc::UnboundedReceiver<Event>,
    cancel_token: CancellationToken,
    metrics: MetricsCollector,
) {
    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Some(event) => persist(&db, event, &metrics).await,
                    // Dispatcher side dropped; nothing more will arrive.
                    None => break,
                }
            }
            _ = cancel_token.cancelled() => {
                // Drain whatever was queued before the session ended.
                while let Ok(event) = rx.try_recv() {
                    persist(&db, event, &metrics).await;
                }
                info!("store worker for session {session_id} shutting down");
                break;
            }
        }
    }
}

async fn persist(db: &Database, event: Event, metrics: &MetricsCollector) {
    match db.insert_event(&event).await {
        Ok(()) => metrics.record_event_persisted().await,
        Err(err) => {
            metrics.record_store_failure().await;
            error!(
                "failed to persist {} event for session {}: {err:?}",
                event.kind.as_str(),
                event.session_id
            );
        }
    }
}
