pub mod scoring;
pub mod types;

pub use scoring::{compile_report, deduction_points};
pub use types::{DeductionLine, ScoreReport};

use anyhow::{Context, Result};

use crate::db::Database;

/// Query a session's event log and compile it into a report. Errors when
/// the session has no recorded events (see `compile_report`).
pub async fn generate_session_report(db: &Database, session_id: &str) -> Result<ScoreReport> {
    let events = db.get_events_for_session(session_id).await?;
    compile_report(&events).with_context(|| format!("cannot build report for session {session_id}"))
}
