pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod registry;
pub mod session;
pub mod signal;
pub mod store_worker;
pub mod violation;

pub use config::ProctorConfig;
pub use dispatch::LiveAlert;
pub use registry::SessionRegistry;
pub use session::ProctorSession;
pub use signal::SignalSnapshot;
pub use violation::ViolationKind;
