use crate::{
    CoreResult,
    audio::{AudioBackend, AudioGate},
    config::{InteractionMode, RecorderConfig},
    recorder::{
        ActiveSession, DiscardReason, SessionOutcome, SessionState, StopReason, TriggerOutcome,
        writer::write_wav,
    },
    secrets::SecretsStore,
};

use std::{
    fs,
    sync::{
        Arc, Condvar, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug)]
struct Status {
    state: SessionState,
    active: Option<ActiveSession>,
    last_outcome: Option<SessionOutcome>,
    sessions_started: u64,
    accepting: bool,
}

struct Shared {
    status: Mutex<Status>,
    changed: Condvar,
    /// Observed by the capture loop at every chunk boundary.
    stop: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Status> {
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: SessionState) {
        self.lock().state = state;
        self.changed.notify_all();
    }

    fn finish(&self, outcome: SessionOutcome) {
        let mut status = self.lock();
        status.state = SessionState::Idle;
        status.active = None;
        status.last_outcome = Some(outcome);
        drop(status);
        self.changed.notify_all();
    }
}

/// Everything the recording worker needs, moved onto its thread.
struct Worker {
    backend: Arc<dyn AudioBackend>,
    store: SecretsStore,
    gate: Arc<AudioGate>,
    config: RecorderConfig,
    shared: Arc<Shared>,
}

/// Owns the "at most one recording" invariant.
///
/// A single long-lived worker thread performs every capture. Triggers only
/// flip the mutex-guarded state from `Idle` to `Capturing` and hand the
/// session to the worker over a channel, so they never block on audio I/O
/// and a second trigger while busy is rejected rather than queued.
pub struct RecordingManager {
    shared: Arc<Shared>,
    mode: InteractionMode,
    command_tx: Mutex<Option<mpsc::Sender<ActiveSession>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RecordingManager {
    /// Create the manager and start its recording worker.
    ///
    /// # Errors
    ///
    /// Returns error if the secrets directory cannot be created or the
    /// worker thread cannot be spawned.
    #[track_caller]
    #[instrument(skip(backend, store, gate))]
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        store: SecretsStore,
        gate: Arc<AudioGate>,
        config: RecorderConfig,
    ) -> CoreResult<Self> {
        store.ensure_dir()?;

        let shared = Arc::new(Shared {
            status: Mutex::new(Status {
                state: SessionState::Idle,
                active: None,
                last_outcome: None,
                sessions_started: 0,
                accepting: true,
            }),
            changed: Condvar::new(),
            stop: AtomicBool::new(false),
        });

        let (command_tx, command_rx) = mpsc::channel();
        let mode = config.mode;
        let worker = Worker {
            backend,
            store,
            gate,
            config,
            shared: Arc::clone(&shared),
        };

        let handle = thread::Builder::new()
            .name("willow-recorder".to_string())
            .spawn(move || worker.run(command_rx))?;

        info!(mode = ?mode, "RecordingManager initialized");

        Ok(Self {
            shared,
            mode,
            command_tx: Mutex::new(Some(command_tx)),
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Start a session if none is active. Never blocks on audio I/O.
    #[instrument(skip(self))]
    pub fn trigger_or_begin(&self) -> TriggerOutcome {
        let mut status = self.shared.lock();

        if !status.accepting {
            debug!("Trigger ignored, shutting down");
            return TriggerOutcome::Ignored;
        }

        if status.state != SessionState::Idle {
            info!(
                session_id = ?status.active.map(|s| s.session_id),
                state = ?status.state,
                "Trigger ignored, recording in progress"
            );
            return TriggerOutcome::Ignored;
        }

        let session = ActiveSession {
            session_id: Uuid::new_v4(),
            started_at: Instant::now(),
            mode: self.mode,
        };

        self.shared.stop.store(false, Ordering::Release);

        // Hand off FIRST -- if the worker is gone, state stays Idle.
        let sent = self
            .command_tx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|tx| tx.send(session).is_ok());
        if !sent {
            error!(session_id = %session.session_id, "Recording worker unavailable");
            return TriggerOutcome::Ignored;
        }

        status.state = SessionState::Capturing;
        status.active = Some(session);
        status.sessions_started += 1;
        drop(status);
        self.shared.changed.notify_all();

        info!(session_id = %session.session_id, mode = ?self.mode, "Recording started");

        TriggerOutcome::Started {
            session_id: session.session_id,
        }
    }

    /// Ask the active press/release session to stop after its current read.
    ///
    /// Returns `true` if a capturing session was signalled. Ignored in
    /// toggle mode, where sessions end on their own.
    #[instrument(skip(self))]
    pub fn end(&self) -> bool {
        if self.mode == InteractionMode::Toggle {
            debug!("End ignored in toggle mode");
            return false;
        }

        let status = self.shared.lock();
        if status.state != SessionState::Capturing {
            debug!(state = ?status.state, "End ignored, nothing capturing");
            return false;
        }

        self.shared.stop.store(true, Ordering::Release);
        info!(
            session_id = ?status.active.map(|s| s.session_id),
            "Stop signal sent"
        );
        true
    }

    /// Current state machine state.
    pub fn state(&self) -> SessionState {
        self.shared.lock().state
    }

    /// Whether a session is capturing or finalizing.
    pub fn is_busy(&self) -> bool {
        self.state() != SessionState::Idle
    }

    /// Outcome of the most recently finished session.
    pub fn last_outcome(&self) -> Option<SessionOutcome> {
        self.shared.lock().last_outcome.clone()
    }

    /// Sessions started since creation.
    pub fn sessions_started(&self) -> u64 {
        self.shared.lock().sessions_started
    }

    /// Block until the manager is idle or `timeout` elapses.
    ///
    /// Returns `true` if idle.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let status = self.shared.lock();
        let (status, _) = self
            .shared
            .changed
            .wait_timeout_while(status, timeout, |s| s.state != SessionState::Idle)
            .unwrap_or_else(|e| e.into_inner());
        status.state == SessionState::Idle
    }

    /// Stop accepting triggers, stop any active session and wait up to
    /// `grace` for it to finalize.
    ///
    /// Returns `true` if the worker finished within the grace period.
    #[instrument(skip(self))]
    pub fn shutdown(&self, grace: Duration) -> bool {
        {
            let mut status = self.shared.lock();
            status.accepting = false;
        }
        self.shared.stop.store(true, Ordering::Release);

        // Closing the channel lets the worker exit once it is idle.
        drop(
            self.command_tx
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .take(),
        );

        if !self.wait_idle(grace) {
            warn!(
                grace_ms = grace.as_millis(),
                "Recording did not finalize within grace period"
            );
            return false;
        }

        if let Some(handle) = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take() {
            if handle.join().is_err() {
                error!("Recording worker panicked");
                return false;
            }
        }

        info!("RecordingManager shut down");
        true
    }
}

impl Drop for RecordingManager {
    fn drop(&mut self) {
        self.shared.lock().accepting = false;
        self.shared.stop.store(true, Ordering::Release);
        drop(
            self.command_tx
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .take(),
        );
    }
}

impl Worker {
    fn run(self, commands: mpsc::Receiver<ActiveSession>) {
        debug!("Recording worker started");
        while let Ok(session) = commands.recv() {
            let outcome = self.record(session);
            log_outcome(&outcome);
            self.shared.finish(outcome);
        }
        debug!("Recording worker exiting");
    }

    #[instrument(skip(self, session), fields(session_id = %session.session_id, mode = ?session.mode))]
    fn record(&self, session: ActiveSession) -> SessionOutcome {
        let id = self.store.next_id();
        let limit = self.config.chunk_limit();

        let lease = self.gate.acquire_capture();
        let mut stream = match self.backend.open_capture(&self.config.format) {
            Ok(stream) => stream,
            Err(e) => {
                error!(error = ?e, "Failed to open capture stream");
                return self.discard(
                    &session,
                    DiscardReason::CaptureFailed {
                        reason: e.to_string(),
                    },
                );
            }
        };
        // Time spent waiting for the gate does not count toward the minimum.
        let capture_started = Instant::now();

        let mut chunks: Vec<Vec<i16>> = Vec::new();
        let stop = loop {
            if self.shared.stop.load(Ordering::Acquire) {
                break self.stop_cause();
            }
            if chunks.len() as u64 >= limit {
                break self.limit_cause();
            }
            match stream.read_chunk() {
                Ok(chunk) => chunks.push(chunk),
                Err(e) => {
                    drop(stream);
                    drop(lease);
                    error!(error = ?e, chunks = chunks.len(), "Capture failed");
                    return self.discard(
                        &session,
                        DiscardReason::CaptureFailed {
                            reason: e.to_string(),
                        },
                    );
                }
            }
        };

        // Release the input device before touching the disk.
        drop(stream);
        drop(lease);

        let elapsed = capture_started.elapsed();
        debug!(
            chunks = chunks.len(),
            elapsed_ms = elapsed.as_millis(),
            stop = ?stop,
            "Capture finished"
        );

        if chunks.is_empty() {
            return self.discard(&session, DiscardReason::NoAudio);
        }
        if elapsed < self.config.min_duration {
            return self.discard(&session, DiscardReason::TooShort { elapsed });
        }

        self.shared.set_state(SessionState::Finalizing);

        let temp_path = self.store.temp_path_for(&id);
        let final_path = self.store.path_of(&id);
        let published = write_wav(&temp_path, &self.config.format, &chunks).and_then(|frames| {
            self.store
                .publish(&temp_path, &final_path, &self.config.format, frames)
        });

        match published {
            Ok(secret) => SessionOutcome::Published {
                session_id: session.session_id,
                secret,
                stop,
                chunks: chunks.len() as u64,
                elapsed,
            },
            Err(e) => {
                error!(error = ?e, path = ?temp_path, "Failed to finalize recording");
                if temp_path.exists() {
                    if let Err(e) = fs::remove_file(&temp_path) {
                        warn!(error = ?e, path = ?temp_path, "Failed to remove temporary file");
                    }
                }
                self.discard(
                    &session,
                    DiscardReason::FinalizeFailed {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }

    fn discard(&self, session: &ActiveSession, reason: DiscardReason) -> SessionOutcome {
        self.shared.set_state(SessionState::Discarded);
        SessionOutcome::Discarded {
            session_id: session.session_id,
            reason,
            elapsed: session.started_at.elapsed(),
        }
    }

    fn stop_cause(&self) -> StopReason {
        if self.shared.lock().accepting {
            StopReason::Released
        } else {
            StopReason::Shutdown
        }
    }

    fn limit_cause(&self) -> StopReason {
        match self.config.mode {
            InteractionMode::Toggle
                if self.config.fixed_duration <= self.config.max_duration =>
            {
                StopReason::FixedDuration
            }
            _ => StopReason::MaxDuration,
        }
    }
}

fn log_outcome(outcome: &SessionOutcome) {
    match outcome {
        SessionOutcome::Published {
            session_id,
            secret,
            stop,
            chunks,
            elapsed,
        } => info!(
            session_id = %session_id,
            id = %secret.id,
            path = ?secret.path,
            bytes = secret.bytes,
            duration_ms = secret.duration.as_millis(),
            elapsed_ms = elapsed.as_millis(),
            chunks = chunks,
            stop = ?stop,
            "Secret saved"
        ),
        SessionOutcome::Discarded {
            session_id,
            reason: DiscardReason::TooShort { elapsed },
            ..
        } => info!(
            session_id = %session_id,
            elapsed_ms = elapsed.as_millis(),
            "Recording discarded (too short)"
        ),
        SessionOutcome::Discarded {
            session_id,
            reason,
            elapsed,
        } => warn!(
            session_id = %session_id,
            reason = ?reason,
            elapsed_ms = elapsed.as_millis(),
            "Recording discarded"
        ),
    }
}
