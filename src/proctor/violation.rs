use serde::{Deserialize, Serialize};

/// The closed set of integrity violations the engine can raise.
///
/// Wire and storage names are the snake_case strings in the serde renames;
/// they match the event records the report pipeline consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationKind {
    #[serde(rename = "no_face")]
    NoFace,
    #[serde(rename = "multiple_faces")]
    MultipleFaces,
    #[serde(rename = "focus_lost")]
    FocusLost,
    #[serde(rename = "drowsiness")]
    Drowsiness,
    #[serde(rename = "gaze_off_screen")]
    GazeOffScreen,
    #[serde(rename = "object_detection")]
    ObjectDetected,
    #[serde(rename = "audio_detection")]
    AudioDetected,
}

impl ViolationKind {
    /// Every kind, in the order report sections are rendered.
    pub const ALL: [ViolationKind; 7] = [
        ViolationKind::NoFace,
        ViolationKind::MultipleFaces,
        ViolationKind::FocusLost,
        ViolationKind::Drowsiness,
        ViolationKind::GazeOffScreen,
        ViolationKind::ObjectDetected,
        ViolationKind::AudioDetected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::NoFace => "no_face",
            ViolationKind::MultipleFaces => "multiple_faces",
            ViolationKind::FocusLost => "focus_lost",
            ViolationKind::Drowsiness => "drowsiness",
            ViolationKind::GazeOffScreen => "gaze_off_screen",
            ViolationKind::ObjectDetected => "object_detection",
            ViolationKind::AudioDetected => "audio_detection",
        }
    }

    /// Human-readable name used in report deduction lines.
    pub fn label(&self) -> &'static str {
        match self {
            ViolationKind::NoFace => "No Face",
            ViolationKind::MultipleFaces => "Multiple Faces",
            ViolationKind::FocusLost => "Focus Lost",
            ViolationKind::Drowsiness => "Drowsiness",
            ViolationKind::GazeOffScreen => "Gaze Off Screen",
            ViolationKind::ObjectDetected => "Object Detection",
            ViolationKind::AudioDetected => "Audio Detection",
        }
    }

    pub fn parse(value: &str) -> Option<ViolationKind> {
        match value {
            "no_face" => Some(ViolationKind::NoFace),
            "multiple_faces" => Some(ViolationKind::MultipleFaces),
            "focus_lost" => Some(ViolationKind::FocusLost),
            "drowsiness" => Some(ViolationKind::Drowsiness),
            "gaze_off_screen" => Some(ViolationKind::GazeOffScreen),
            "object_detection" => Some(ViolationKind::ObjectDetected),
            "audio_detection" => Some(ViolationKind::AudioDetected),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for kind in ViolationKind::ALL {
            assert_eq!(ViolationKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&ViolationKind::ObjectDetected).unwrap();
        assert_eq!(json, "\"object_detection\"");
        let kind: ViolationKind = serde_json::from_str("\"gaze_off_screen\"").unwrap();
        assert_eq!(kind, ViolationKind::GazeOffScreen);
    }
}
