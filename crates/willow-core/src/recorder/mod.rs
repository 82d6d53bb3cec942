//! Recording session management.

mod manager;
mod session;
pub(crate) mod writer;

pub(crate) use session::ActiveSession;

pub use {
    manager::RecordingManager,
    session::{DiscardReason, SessionOutcome, SessionState, StopReason, TriggerOutcome},
};
