use serde::{Deserialize, Serialize};

use super::violation::ViolationKind;

/// Configuration for violation detection with tunable thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProctorConfig {
    /// Seconds the camera must see no face before an alert fires
    pub no_face_sustain_secs: u64,

    /// Seconds more than one face must stay in frame before an alert fires
    pub multiple_faces_sustain_secs: u64,

    /// Seconds the head must stay turned away before an alert fires
    pub focus_lost_sustain_secs: u64,

    /// Seconds the eyes must stay closed before an alert fires
    pub drowsiness_sustain_secs: u64,

    /// Seconds the gaze must stay off-center before an alert fires
    pub gaze_off_screen_sustain_secs: u64,

    /// Minimum spacing between two alerts of the same kind
    pub alert_cooldown_secs: u64,

    /// Head yaw beyond this magnitude (degrees) counts as looking away
    pub head_yaw_limit_degrees: f64,

    /// Eye aspect ratio below this reads as drowsy
    pub eye_aspect_ratio_floor: f64,

    /// Gaze ratio outside [min, max] reads as off-screen
    pub gaze_ratio_min: f64,
    pub gaze_ratio_max: f64,

    /// Object detection runs on every Nth processed frame
    pub object_sample_interval: u64,

    /// Detected-object labels that count as unauthorized items
    pub unauthorized_objects: Vec<String>,
}

impl Default for ProctorConfig {
    fn default() -> Self {
        Self {
            no_face_sustain_secs: 10,
            multiple_faces_sustain_secs: 5,
            focus_lost_sustain_secs: 4,
            drowsiness_sustain_secs: 3,
            gaze_off_screen_sustain_secs: 3,
            alert_cooldown_secs: 5,
            head_yaw_limit_degrees: 25.0,
            eye_aspect_ratio_floor: 0.21,
            gaze_ratio_min: 0.30,
            gaze_ratio_max: 0.70,
            object_sample_interval: 5,
            unauthorized_objects: vec![
                "cell phone".to_string(),
                "book".to_string(),
                "laptop".to_string(),
                "tablet".to_string(),
                "remote".to_string(),
            ],
        }
    }
}

impl ProctorConfig {
    /// Sustain threshold for a kind, in seconds. `None` for the kinds that
    /// fire immediately and bypass the debouncer (objects, audio).
    pub fn sustain_secs(&self, kind: ViolationKind) -> Option<u64> {
        match kind {
            ViolationKind::NoFace => Some(self.no_face_sustain_secs),
            ViolationKind::MultipleFaces => Some(self.multiple_faces_sustain_secs),
            ViolationKind::FocusLost => Some(self.focus_lost_sustain_secs),
            ViolationKind::Drowsiness => Some(self.drowsiness_sustain_secs),
            ViolationKind::GazeOffScreen => Some(self.gaze_off_screen_sustain_secs),
            ViolationKind::ObjectDetected | ViolationKind::AudioDetected => None,
        }
    }
}
