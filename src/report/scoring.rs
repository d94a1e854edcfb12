use std::collections::HashMap;

use anyhow::{bail, Result};

use crate::db::models::Event;
use crate::proctor::violation::ViolationKind;

use super::types::{DeductionLine, ScoreReport};

const STARTING_SCORE: u64 = 100;

/// Points deducted per occurrence of each violation kind.
pub fn deduction_points(kind: ViolationKind) -> u64 {
    match kind {
        ViolationKind::NoFace => 15,
        ViolationKind::MultipleFaces => 20,
        ViolationKind::ObjectDetected => 10,
        ViolationKind::FocusLost => 5,
        ViolationKind::Drowsiness => 5,
        ViolationKind::GazeOffScreen => 5,
        ViolationKind::AudioDetected => 2,
    }
}

/// Compile a session's persisted events into an integrity report.
///
/// An empty event list is an error: "no events were recorded" must stay
/// distinguishable from "a clean session scored 100".
pub fn compile_report(events: &[Event]) -> Result<ScoreReport> {
    let (Some(first), Some(last)) = (events.first(), events.last()) else {
        bail!("no events recorded for this session");
    };

    let mut event_counts: HashMap<ViolationKind, u64> = HashMap::new();
    for event in events {
        *event_counts.entry(event.kind).or_insert(0) += 1;
    }

    let mut deduction_lines = Vec::new();
    let mut total_deducted: u64 = 0;
    for kind in ViolationKind::ALL {
        if let Some(&count) = event_counts.get(&kind) {
            let points_deducted = count * deduction_points(kind);
            total_deducted += points_deducted;
            deduction_lines.push(DeductionLine {
                kind,
                count,
                points_deducted,
            });
        }
    }

    // The score floors at zero no matter how many events piled up.
    let final_score = STARTING_SCORE.saturating_sub(total_deducted);

    Ok(ScoreReport {
        candidate_name: first.candidate_name.clone(),
        session_id: first.session_id.clone(),
        duration_seconds: (last.timestamp - first.timestamp).num_seconds(),
        event_counts,
        deduction_lines,
        final_score,
        detailed_log: events.to_vec(),
    })
}
