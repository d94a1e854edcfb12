use std::collections::HashMap;

use serde::Serialize;

use crate::db::models::Event;
use crate::proctor::violation::ViolationKind;

/// One line of the report's deduction summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionLine {
    pub kind: ViolationKind,
    pub count: u64,
    pub points_deducted: u64,
}

impl DeductionLine {
    /// Rendered form used by the summary section, e.g.
    /// `No Face: 2 time(s) (-30 points)`.
    pub fn describe(&self) -> String {
        format!(
            "{}: {} time(s) (-{} points)",
            self.kind.label(),
            self.count,
            self.points_deducted
        )
    }
}

/// Structured integrity report for one session, compiled on demand from the
/// persisted event log. Handed to a rendering collaborator as-is; the
/// engine never persists it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub candidate_name: String,
    pub session_id: String,
    pub duration_seconds: i64,
    pub event_counts: HashMap<ViolationKind, u64>,
    pub deduction_lines: Vec<DeductionLine>,
    pub final_score: u64,
    pub detailed_log: Vec<Event>,
}
