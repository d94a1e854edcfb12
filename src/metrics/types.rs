use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameMetrics {
    pub timestamp: DateTime<Utc>,
    pub processing_us: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub cpu_percent: f32,
    pub memory_mb: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub system: SystemMetrics,
    pub recent_frames: Vec<FrameMetrics>,
    pub frame_count: u64,
    pub audio_event_count: u64,
    pub events_persisted: u64,
    pub store_failure_count: u64,
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self {
            system: SystemMetrics {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            },
            recent_frames: Vec::new(),
            frame_count: 0,
            audio_event_count: 0,
            events_persisted: 0,
            store_failure_count: 0,
        }
    }
}
