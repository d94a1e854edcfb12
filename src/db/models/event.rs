use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::proctor::violation::ViolationKind;

/// A single persisted integrity event. Append-only; never updated once
/// written. `metadata` carries the kind-specific measurements that
/// triggered the alert (`{ear}`, `{ratio}`, `{yaw}`, `{items}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Rowid assigned by the store; `None` until persisted.
    pub id: Option<i64>,
    pub session_id: String,
    pub candidate_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "eventType")]
    pub kind: ViolationKind,
    pub message: String,
    pub metadata: Option<serde_json::Value>,
}
