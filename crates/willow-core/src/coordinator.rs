//! Wires the input, recorder and playback loop into one installation.

use crate::{
    CancelToken, CoreResult,
    audio::{AudioBackend, AudioGate},
    config::InstallationConfig,
    input::{EdgeDetector, InputEventKind, InputEvents, InputPin},
    playback::{PlaybackStats, Player},
    recorder::{RecordingManager, SessionOutcome},
    secrets::SecretsStore,
};

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use tracing::{debug, error, info, instrument, warn};

const JOIN_POLL: Duration = Duration::from_millis(10);

/// What [`Coordinator::shutdown`] managed to do.
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    /// The recorder finished any in-flight session within the grace period.
    pub recorder_finalized: bool,
    /// The playback thread exited within the grace period.
    pub playback_stopped: bool,
    /// Outcome of the last recording session, if any ran.
    pub last_outcome: Option<SessionOutcome>,
    /// Final playback counters.
    pub playback: PlaybackStats,
}

impl ShutdownReport {
    /// Whether every component stopped cleanly.
    pub fn is_clean(&self) -> bool {
        self.recorder_finalized && self.playback_stopped
    }
}

/// A running installation.
pub struct Coordinator {
    store: SecretsStore,
    recorder: Arc<RecordingManager>,
    player: Arc<Player>,
    detector: EdgeDetector,
    dispatch: Option<JoinHandle<()>>,
    playback: Option<JoinHandle<()>>,
    playback_cancel: CancelToken,
    shutdown_grace: Duration,
}

impl Coordinator {
    /// Validate `config` and start every component.
    ///
    /// # Errors
    ///
    /// Returns error if the config is invalid, the secrets directory cannot
    /// be created, the pin cannot be read, or a thread cannot be spawned.
    #[instrument(skip_all, fields(secrets_dir = ?config.secrets_dir, duplex = ?config.duplex))]
    pub fn start(
        config: InstallationConfig,
        backend: Arc<dyn AudioBackend>,
        pin: Box<dyn InputPin>,
    ) -> CoreResult<Self> {
        config.validate()?;

        let gate = Arc::new(AudioGate::new(config.duplex));
        let store = SecretsStore::new(&config.secrets_dir);

        let recorder = Arc::new(RecordingManager::new(
            Arc::clone(&backend),
            store.clone(),
            Arc::clone(&gate),
            config.recorder.clone(),
        )?);
        let player = Arc::new(Player::new(
            backend,
            store.clone(),
            gate,
            config.playback.clone(),
        ));

        let playback_cancel = CancelToken::new();
        let playback = {
            let player = Arc::clone(&player);
            let cancel = playback_cancel.clone();
            thread::Builder::new()
                .name("willow-playback".to_string())
                .spawn(move || player.run_forever(&cancel))?
        };

        let (detector, events) =
            match EdgeDetector::spawn(pin, config.debounce.clone(), config.recorder.mode) {
                Ok(started) => started,
                Err(e) => {
                    playback_cancel.cancel();
                    let _ = playback.join();
                    recorder.shutdown(config.shutdown_grace);
                    return Err(e);
                }
            };

        let spawned = {
            let recorder = Arc::clone(&recorder);
            thread::Builder::new()
                .name("willow-dispatch".to_string())
                .spawn(move || dispatch(events, &recorder))
        };
        let dispatch = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                drop(detector);
                playback_cancel.cancel();
                let _ = playback.join();
                recorder.shutdown(config.shutdown_grace);
                return Err(e.into());
            }
        };

        info!(
            mode = ?config.recorder.mode,
            polling = detector.is_polling(),
            "Installation running"
        );

        Ok(Self {
            store,
            recorder,
            player,
            detector,
            dispatch: Some(dispatch),
            playback: Some(playback),
            playback_cancel,
            shutdown_grace: config.shutdown_grace,
        })
    }

    /// The secrets store shared by recorder and player.
    pub fn store(&self) -> &SecretsStore {
        &self.store
    }

    /// The recording session manager.
    pub fn recorder(&self) -> &RecordingManager {
        &self.recorder
    }

    /// The playback loop.
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Whether input is being polled rather than interrupt driven.
    pub fn is_polling(&self) -> bool {
        self.detector.is_polling()
    }

    /// Stop input, let any recording finalize, then stop playback.
    #[instrument(skip(self))]
    pub fn shutdown(mut self) -> ShutdownReport {
        info!("Shutting down");

        self.detector.stop();
        if let Some(handle) = self.dispatch.take()
            && handle.join().is_err()
        {
            error!("Dispatch thread panicked");
        }

        let recorder_finalized = self.recorder.shutdown(self.shutdown_grace);

        self.playback_cancel.cancel();
        let playback_stopped = match self.playback.take() {
            Some(handle) => join_within(handle, self.shutdown_grace),
            None => true,
        };
        if !playback_stopped {
            warn!("Playback thread did not stop in time, detaching");
        }

        let report = ShutdownReport {
            recorder_finalized,
            playback_stopped,
            last_outcome: self.recorder.last_outcome(),
            playback: self.player.stats(),
        };

        info!(clean = report.is_clean(), "Shutdown complete");
        report
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.playback_cancel.cancel();
    }
}

fn dispatch(events: InputEvents, recorder: &RecordingManager) {
    for event in events {
        match event.kind {
            InputEventKind::Trigger | InputEventKind::Begin => {
                let outcome = recorder.trigger_or_begin();
                debug!(kind = ?event.kind, started = outcome.is_started(), "Press dispatched");
            }
            InputEventKind::End => {
                let stopped = recorder.end();
                debug!(stopped, "Release dispatched");
            }
        }
    }
    debug!("Input closed, dispatch finished");
}

/// Join `handle` if it finishes within `timeout`.
fn join_within(handle: JoinHandle<()>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(JOIN_POLL);
    }
    handle.join().is_ok()
}
