mod types;

pub use types::{FrameMetrics, MetricsSnapshot, SystemMetrics};

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sysinfo::{Pid, ProcessesToUpdate, System};
use tokio::sync::Mutex;

const MAX_RECENT_FRAMES: usize = 20;

/// Lightweight instrumentation for the signal path: frame/audio counters,
/// persistence outcomes, a bounded ring of recent frame timings, and the
/// process's own CPU/memory usage.
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsState>>,
}

struct MetricsState {
    recent_frames: Vec<FrameMetrics>,
    frame_count: u64,
    audio_event_count: u64,
    events_persisted: u64,
    store_failure_count: u64,
    system: System,
    pid: Pid,
}

impl MetricsCollector {
    pub fn new() -> Self {
        let mut system = System::new();
        let pid = Pid::from_u32(std::process::id());

        // Initial refresh to establish a baseline for CPU calculation.
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        Self {
            inner: Arc::new(Mutex::new(MetricsState {
                recent_frames: Vec::with_capacity(MAX_RECENT_FRAMES),
                frame_count: 0,
                audio_event_count: 0,
                events_persisted: 0,
                store_failure_count: 0,
                system,
                pid,
            })),
        }
    }

    pub async fn record_frame(&self, processing: Duration) {
        let mut state = self.inner.lock().await;

        state.frame_count += 1;
        state.recent_frames.push(FrameMetrics {
            timestamp: Utc::now(),
            processing_us: processing.as_micros() as u64,
        });

        if state.recent_frames.len() > MAX_RECENT_FRAMES {
            state.recent_frames.remove(0);
        }
    }

    pub async fn record_audio_event(&self) {
        self.inner.lock().await.audio_event_count += 1;
    }

    pub async fn record_event_persisted(&self) {
        self.inner.lock().await.events_persisted += 1;
    }

    pub async fn record_store_failure(&self) {
        self.inner.lock().await.store_failure_count += 1;
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        let mut state = self.inner.lock().await;
        let pid = state.pid;

        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));

        let system = if let Some(process) = state.system.process(pid) {
            SystemMetrics {
                cpu_percent: process.cpu_usage(),
                memory_mb: process.memory() as f64 / 1024.0 / 1024.0,
            }
        } else {
            SystemMetrics {
                cpu_percent: 0.0,
                memory_mb: 0.0,
            }
        };

        MetricsSnapshot {
            system,
            recent_frames: state.recent_frames.clone(),
            frame_count: state.frame_count,
            audio_event_count: state.audio_event_count,
            events_persisted: state.events_persisted,
            store_failure_count: state.store_failure_count,
        }
    }

    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        let pid = state.pid;
        state.recent_frames.clear();
        state.frame_count = 0;
        state.audio_event_count = 0;
        state.events_persisted = 0;
        state.store_failure_count = 0;
        state.system.refresh_processes(ProcessesToUpdate::Some(&[pid]));
    }
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
