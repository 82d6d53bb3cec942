use crate::{config::InteractionMode, secrets::Secret};

use std::time::{Duration, Instant};

use uuid::Uuid;

/// Recording state machine.
///
/// `Idle → Capturing → Finalizing → Idle` on success,
/// `Capturing → Discarded → Idle` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Ready for a trigger.
    Idle,
    /// Reading chunks from the input device.
    Capturing,
    /// Writing and publishing the file.
    Finalizing,
    /// Dropping the attempt; about to return to idle.
    Discarded,
}

/// Result of asking the manager to start recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// A new session is capturing.
    Started {
        /// Session ID for log correlation.
        session_id: Uuid,
    },
    /// A session was already active or the manager is shutting down.
    Ignored,
}

impl TriggerOutcome {
    /// Whether this call created a session.
    pub fn is_started(&self) -> bool {
        matches!(self, TriggerOutcome::Started { .. })
    }
}

/// Why capture stopped reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The button was released.
    Released,
    /// Toggle mode reached its configured length.
    FixedDuration,
    /// The hard cap ended the session.
    MaxDuration,
    /// The process is shutting down.
    Shutdown,
}

/// Why a session produced no secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardReason {
    /// Shorter than the minimum duration.
    TooShort {
        /// Wall-clock length of the attempt.
        elapsed: Duration,
    },
    /// Not a single chunk was captured.
    NoAudio,
    /// Opening or reading the input device failed.
    CaptureFailed {
        /// Error text for logs.
        reason: String,
    },
    /// Writing or renaming the file failed.
    FinalizeFailed {
        /// Error text for logs.
        reason: String,
    },
}

/// How a finished session ended.
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    /// A new secret is visible in the store.
    Published {
        /// Session ID for log correlation.
        session_id: Uuid,
        /// The published secret.
        secret: Secret,
        /// What ended the capture.
        stop: StopReason,
        /// Chunks written to the file.
        chunks: u64,
        /// Wall-clock length of the session.
        elapsed: Duration,
    },
    /// Nothing was published.
    Discarded {
        /// Session ID for log correlation.
        session_id: Uuid,
        /// Why the attempt was dropped.
        reason: DiscardReason,
        /// Wall-clock length of the session.
        elapsed: Duration,
    },
}

impl SessionOutcome {
    /// The published secret, if any.
    pub fn secret(&self) -> Option<&Secret> {
        match self {
            SessionOutcome::Published { secret, .. } => Some(secret),
            SessionOutcome::Discarded { .. } => None,
        }
    }
}

/// The session currently owned by the recording worker.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ActiveSession {
    pub(crate) session_id: Uuid,
    pub(crate) started_at: Instant,
    pub(crate) mode: InteractionMode,
}
