pub mod event;
pub mod session;

pub use event::Event;
pub use session::{InterviewSession, SessionStatus};
