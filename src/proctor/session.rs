use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::{broadcast, mpsc};

use crate::db::models::Event;

use super::config::ProctorConfig;
use super::debounce::ViolationTracker;
use super::dispatch::{AlertDispatcher, LiveAlert};
use super::signal::SignalSnapshot;
use super::violation::ViolationKind;

/// Per-candidate proctoring state: one debouncer/dispatcher pair plus the
/// frame counter that drives object-detection sampling.
///
/// All mutation happens through `process` and `report_audio`; callers are
/// expected to serialize those per session (the registry wraps each session
/// in its own lock).
pub struct ProctorSession {
    session_id: String,
    candidate_name: String,
    created_at: DateTime<Utc>,
    frame_counter: u64,
    config: ProctorConfig,
    tracker: ViolationTracker,
    dispatcher: AlertDispatcher,
}

impl ProctorSession {
    pub fn new(
        session_id: String,
        candidate_name: String,
        config: ProctorConfig,
        alert_tx: broadcast::Sender<LiveAlert>,
        store_tx: mpsc::UnboundedSender<Event>,
    ) -> Self {
        let tracker = ViolationTracker::new(&config);
        let dispatcher = AlertDispatcher::new(
            session_id.clone(),
            candidate_name.clone(),
            config.alert_cooldown_secs,
            alert_tx,
            store_tx,
        );

        Self {
            session_id,
            candidate_name,
            created_at: Utc::now(),
            frame_counter: 0,
            config,
            tracker,
            dispatcher,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn candidate_name(&self) -> &str {
        &self.candidate_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Run every per-kind rule against one signal snapshot.
    ///
    /// Landmark rules only run when exactly one face is in frame AND the
    /// metric made it into the snapshot; a missing metric skips the rule
    /// for this tick without touching its debounce state.
    pub fn process(&mut self, snapshot: &SignalSnapshot, now: DateTime<Utc>) {
        self.frame_counter += 1;
        let faces = snapshot.face_count;

        if self.tracker.evaluate(ViolationKind::NoFace, faces == 0, now) {
            self.dispatcher.dispatch(
                ViolationKind::NoFace,
                "No face detected in frame.".to_string(),
                None,
                now,
            );
        }

        if self
            .tracker
            .evaluate(ViolationKind::MultipleFaces, faces > 1, now)
        {
            self.dispatcher.dispatch(
                ViolationKind::MultipleFaces,
                format!("Multiple faces detected ({faces})."),
                Some(json!({ "faceCount": faces })),
                now,
            );
        }

        if faces == 1 {
            if let Some(yaw) = snapshot.head_yaw_degrees {
                let away = yaw.abs() > self.config.head_yaw_limit_degrees;
                if self.tracker.evaluate(ViolationKind::FocusLost, away, now) {
                    self.dispatcher.dispatch(
                        ViolationKind::FocusLost,
                        "Candidate is looking away from the screen.".to_string(),
                        Some(json!({ "yaw": yaw })),
                        now,
                    );
                }
            }

            if let Some(ear) = snapshot.eye_aspect_ratio {
                let drowsy = ear < self.config.eye_aspect_ratio_floor;
                if self.tracker.evaluate(ViolationKind::Drowsiness, drowsy, now) {
                    self.dispatcher.dispatch(
                        ViolationKind::Drowsiness,
                        "Candidate appears drowsy.".to_string(),
                        Some(json!({ "ear": ear })),
                        now,
                    );
                }
            }

            if let Some(ratio) = snapshot.gaze_ratio {
                let off_screen =
                    ratio < self.config.gaze_ratio_min || ratio > self.config.gaze_ratio_max;
                if self
                    .tracker
                    .evaluate(ViolationKind::GazeOffScreen, off_screen, now)
                {
                    self.dispatcher.dispatch(
                        ViolationKind::GazeOffScreen,
                        "Candidate's gaze is off-screen.".to_string(),
                        Some(json!({ "ratio": ratio })),
                        now,
                    );
                }
            }
        }

        // Object detection is sampled to bound inference cost upstream;
        // the sampling cadence is a session decision, not the debouncer's.
        if self.frame_counter % self.config.object_sample_interval == 0 {
            if let Some(objects) = &snapshot.detected_objects {
                self.check_objects(objects, now);
            }
        }
    }

    fn check_objects(&mut self, objects: &[String], now: DateTime<Utc>) {
        let flagged: Vec<String> = objects
            .iter()
            .filter(|label| self.config.unauthorized_objects.contains(*label))
            .cloned()
            .collect();

        if flagged.is_empty() {
            return;
        }

        // No sustain requirement: a single sighting is alert-worthy.
        self.dispatcher.dispatch(
            ViolationKind::ObjectDetected,
            format!("Unauthorized item(s) in view: {}.", flagged.join(", ")),
            Some(json!({ "items": flagged })),
            now,
        );
    }

    /// Audio violations arrive out-of-band from the transport, not from
    /// frame snapshots; they go straight to the dispatcher (cooldown still
    /// applies, shared with the frame-derived kinds).
    pub fn report_audio(&mut self, message: &str, now: DateTime<Utc>) {
        self.dispatcher.dispatch(
            ViolationKind::AudioDetected,
            message.to_string(),
            None,
            now,
        );
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tokio::sync::{broadcast, mpsc};

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn session() -> (ProctorSession, mpsc::UnboundedReceiver<Event>) {
        let (alert_tx, _) = broadcast::channel(16);
        let (store_tx, store_rx) = mpsc::unbounded_channel();
        let session = ProctorSession::new(
            "session-1".to_string(),
            "Ada Lovelace".to_string(),
            ProctorConfig::default(),
            alert_tx,
            store_tx,
        );
        (session, store_rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn sustained_no_face_fires_once_then_respects_cooldown() {
        let (mut session, mut store_rx) = session();

        // faceCount=0 at t=0..14, one second apart. Sustain 10s, cooldown
        // 5s: first fire at t=11, and nothing more before t=16.
        for t in 0..=14 {
            session.process(&SignalSnapshot::with_face_count(0), at(t));
        }

        let events = drain(&mut store_rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ViolationKind::NoFace);
        assert_eq!(events[0].timestamp, at(11));

        // The condition still holds; the next emission lands at t=17,
        // the first tick past the cooldown edge.
        for t in 15..=17 {
            session.process(&SignalSnapshot::with_face_count(0), at(t));
        }
        let events = drain(&mut store_rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp, at(17));
    }

    #[test]
    fn face_reappearing_resets_the_sustain_timer() {
        let (mut session, mut store_rx) = session();

        for t in 0..=9 {
            session.process(&SignalSnapshot::with_face_count(0), at(t));
        }
        // One good tick at t=10 wipes the accumulated 9 seconds.
        session.process(&SignalSnapshot::with_face_count(1), at(10));
        for t in 11..=20 {
            session.process(&SignalSnapshot::with_face_count(0), at(t));
        }

        assert!(drain(&mut store_rx).is_empty());
    }

    #[test]
    fn centered_gaze_never_violates() {
        let (mut session, mut store_rx) = session();

        for t in 0..=30 {
            let snapshot = SignalSnapshot {
                face_count: 1,
                gaze_ratio: Some(0.5),
                ..SignalSnapshot::default()
            };
            session.process(&snapshot, at(t));
        }

        assert!(drain(&mut store_rx).is_empty());
    }

    #[test]
    fn extreme_gaze_violates_after_sustain() {
        let (mut session, mut store_rx) = session();

        for t in 0..=4 {
            let snapshot = SignalSnapshot {
                face_count: 1,
                gaze_ratio: Some(0.95),
                ..SignalSnapshot::default()
            };
            session.process(&snapshot, at(t));
        }

        let events = drain(&mut store_rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ViolationKind::GazeOffScreen);
        // Sustain 3s: first tick past the threshold is t=4.
        assert_eq!(events[0].timestamp, at(4));
    }

    #[test]
    fn missing_metric_skips_rule_without_clearing_state() {
        let (mut session, mut store_rx) = session();

        // Drowsy for 3 ticks, then two ticks with no landmark data; the
        // sustain timer must survive the gap untouched.
        for t in 0..=2 {
            let snapshot = SignalSnapshot {
                face_count: 1,
                eye_aspect_ratio: Some(0.15),
                ..SignalSnapshot::default()
            };
            session.process(&snapshot, at(t));
        }
        for t in 3..=4 {
            session.process(&SignalSnapshot::with_face_count(1), at(t));
        }
        let snapshot = SignalSnapshot {
            face_count: 1,
            eye_aspect_ratio: Some(0.15),
            ..SignalSnapshot::default()
        };
        session.process(&snapshot, at(5));

        let events = drain(&mut store_rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ViolationKind::Drowsiness);
        assert_eq!(events[0].timestamp, at(5));
    }

    #[test]
    fn landmark_rules_skip_when_multiple_faces_present() {
        let (mut session, mut store_rx) = session();

        // Landmarks present but faceCount != 1: only the multiple-faces
        // rule may act on these ticks.
        for t in 0..=6 {
            let snapshot = SignalSnapshot {
                face_count: 2,
                eye_aspect_ratio: Some(0.10),
                gaze_ratio: Some(0.95),
                head_yaw_degrees: Some(40.0),
                ..SignalSnapshot::default()
            };
            session.process(&snapshot, at(t));
        }

        let events = drain(&mut store_rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ViolationKind::MultipleFaces);
    }

    #[test]
    fn objects_only_checked_on_sampled_frames() {
        let (mut session, mut store_rx) = session();

        let snapshot = SignalSnapshot {
            face_count: 1,
            detected_objects: Some(vec!["cell phone".to_string()]),
            ..SignalSnapshot::default()
        };

        // Frames 1-4 carry the object but are not sampled ticks.
        for t in 0..4 {
            session.process(&snapshot, at(t));
            assert!(drain(&mut store_rx).is_empty());
        }

        // Frame 5 is sampled and fires immediately, no sustain needed.
        session.process(&snapshot, at(4));
        let events = drain(&mut store_rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ViolationKind::ObjectDetected);
        assert!(events[0].message.contains("cell phone"));
        assert_eq!(
            events[0].metadata,
            Some(json!({ "items": ["cell phone"] }))
        );
    }

    #[test]
    fn authorized_objects_are_ignored() {
        let (mut session, mut store_rx) = session();

        let snapshot = SignalSnapshot {
            face_count: 1,
            detected_objects: Some(vec!["coffee mug".to_string()]),
            ..SignalSnapshot::default()
        };
        for t in 0..10 {
            session.process(&snapshot, at(t));
        }

        assert!(drain(&mut store_rx).is_empty());
    }

    #[test]
    fn audio_events_bypass_sustain_but_share_cooldown() {
        let (mut session, mut store_rx) = session();

        session.report_audio("Potential background noise detected.", at(0));
        session.report_audio("Potential background noise detected.", at(2));
        session.report_audio("Potential background noise detected.", at(6));

        let events = drain(&mut store_rx);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].timestamp, at(0));
        assert_eq!(events[1].timestamp, at(6));
        assert!(events.iter().all(|e| e.kind == ViolationKind::AudioDetected));
    }
}
