use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::config::ProctorConfig;
use super::violation::ViolationKind;

/// Tracks how long each violation condition has been continuously true and
/// decides when a sustained violation becomes alert-worthy.
///
/// An entry in `ongoing_since` exists iff the condition has been true on
/// every tick since that instant; a single clear tick removes it. Each kind
/// keeps its own timer, so simultaneous violations never interfere.
pub struct ViolationTracker {
    ongoing_since: HashMap<ViolationKind, DateTime<Utc>>,
    sustain: HashMap<ViolationKind, Duration>,
}

impl ViolationTracker {
    pub fn new(config: &ProctorConfig) -> Self {
        let mut sustain = HashMap::new();
        for kind in ViolationKind::ALL {
            if let Some(secs) = config.sustain_secs(kind) {
                sustain.insert(kind, Duration::seconds(secs as i64));
            }
        }

        Self {
            ongoing_since: HashMap::new(),
            sustain,
        }
    }

    /// Returns true when the condition has been continuously true for longer
    /// than the kind's sustain threshold.
    ///
    /// The start marker is NOT cleared on a firing evaluation; while the
    /// condition holds, every call past the threshold keeps returning true.
    /// Rate limiting is the dispatcher's job, not this tracker's.
    pub fn evaluate(
        &mut self,
        kind: ViolationKind,
        violating: bool,
        now: DateTime<Utc>,
    ) -> bool {
        if !violating {
            self.ongoing_since.remove(&kind);
            return false;
        }

        match self.ongoing_since.get(&kind) {
            None => {
                self.ongoing_since.insert(kind, now);
                false
            }
            Some(since) => {
                let threshold = self
                    .sustain
                    .get(&kind)
                    .copied()
                    .unwrap_or_else(Duration::zero);
                now - *since > threshold
            }
        }
    }

    /// Instant the condition started being continuously true, if it is.
    pub fn ongoing_since(&self, kind: ViolationKind) -> Option<DateTime<Utc>> {
        self.ongoing_since.get(&kind).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn tracker() -> ViolationTracker {
        ViolationTracker::new(&ProctorConfig::default())
    }

    #[test]
    fn fires_only_past_sustain_threshold() {
        let mut tracker = tracker();

        // NoFace sustain is 10s. Continuously violating from t=0.
        assert!(!tracker.evaluate(ViolationKind::NoFace, true, at(0)));
        assert!(!tracker.evaluate(ViolationKind::NoFace, true, at(5)));
        // Exactly at the threshold is not yet "longer than".
        assert!(!tracker.evaluate(ViolationKind::NoFace, true, at(10)));
        assert!(tracker.evaluate(ViolationKind::NoFace, true, at(11)));
    }

    #[test]
    fn keeps_reporting_ongoing_after_first_fire() {
        let mut tracker = tracker();

        tracker.evaluate(ViolationKind::Drowsiness, true, at(0));
        assert!(tracker.evaluate(ViolationKind::Drowsiness, true, at(4)));
        assert!(tracker.evaluate(ViolationKind::Drowsiness, true, at(5)));
        assert!(tracker.evaluate(ViolationKind::Drowsiness, true, at(60)));
        assert_eq!(
            tracker.ongoing_since(ViolationKind::Drowsiness),
            Some(at(0))
        );
    }

    #[test]
    fn clear_tick_resets_the_timer() {
        let mut tracker = tracker();

        tracker.evaluate(ViolationKind::GazeOffScreen, true, at(0));
        assert!(tracker.evaluate(ViolationKind::GazeOffScreen, true, at(4)));

        // One clear tick wipes the accumulated time.
        assert!(!tracker.evaluate(ViolationKind::GazeOffScreen, false, at(5)));
        assert!(tracker.ongoing_since(ViolationKind::GazeOffScreen).is_none());

        // A fresh violation accumulates from zero again.
        assert!(!tracker.evaluate(ViolationKind::GazeOffScreen, true, at(6)));
        assert!(!tracker.evaluate(ViolationKind::GazeOffScreen, true, at(9)));
        assert!(tracker.evaluate(ViolationKind::GazeOffScreen, true, at(10)));
    }

    #[test]
    fn kinds_track_independently() {
        let mut tracker = tracker();

        // Run NoFace and Drowsiness timers in parallel.
        tracker.evaluate(ViolationKind::NoFace, true, at(0));
        tracker.evaluate(ViolationKind::Drowsiness, true, at(2));

        // Drowsiness (3s) fires while NoFace (10s) is still accumulating.
        assert!(tracker.evaluate(ViolationKind::Drowsiness, true, at(6)));
        assert!(!tracker.evaluate(ViolationKind::NoFace, true, at(6)));

        // Clearing one does not touch the other.
        tracker.evaluate(ViolationKind::Drowsiness, false, at(7));
        assert_eq!(tracker.ongoing_since(ViolationKind::NoFace), Some(at(0)));
        assert!(tracker.evaluate(ViolationKind::NoFace, true, at(11)));
    }
}
