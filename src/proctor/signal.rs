use serde::{Deserialize, Serialize};

/// One tick's bundle of derived measurements from the upstream perception
/// pipeline. The engine never sees pixels; this is its sole frame input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignalSnapshot {
    /// Number of faces detected in the frame.
    pub face_count: u32,

    /// Landmark metrics, present only when exactly one face was detected
    /// and the landmark pass resolved.
    pub eye_aspect_ratio: Option<f64>,
    pub gaze_ratio: Option<f64>,
    pub head_yaw_degrees: Option<f64>,

    /// Labels from the object detector, present only on the sampled ticks
    /// where it actually ran.
    pub detected_objects: Option<Vec<String>>,
}

impl SignalSnapshot {
    /// A snapshot carrying only a face count, the common transport case.
    pub fn with_face_count(face_count: u32) -> Self {
        Self {
            face_count,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_sparse_transport_payload() {
        let snapshot: SignalSnapshot = serde_json::from_str(r#"{"faceCount": 1}"#).unwrap();
        assert_eq!(snapshot.face_count, 1);
        assert!(snapshot.eye_aspect_ratio.is_none());
        assert!(snapshot.detected_objects.is_none());
    }

    #[test]
    fn deserializes_full_payload() {
        let raw = r#"{
            "faceCount": 1,
            "eyeAspectRatio": 0.28,
            "gazeRatio": 0.51,
            "headYawDegrees": -3.2,
            "detectedObjects": ["cell phone"]
        }"#;
        let snapshot: SignalSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.eye_aspect_ratio, Some(0.28));
        assert_eq!(
            snapshot.detected_objects.as_deref(),
            Some(["cell phone".to_string()].as_slice())
        );
    }
}
