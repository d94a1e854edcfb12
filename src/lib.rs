pub mod db;
pub mod metrics;
pub mod proctor;
pub mod report;
pub mod settings;
pub mod utils;

pub use db::{models::Event, Database};
pub use metrics::MetricsCollector;
pub use proctor::{LiveAlert, ProctorConfig, SessionRegistry, SignalSnapshot, ViolationKind};
pub use report::{generate_session_report, ScoreReport};
pub use settings::SettingsStore;
