use crate::{
    CancelToken, CoreResult,
    config::{DebounceConfig, InteractionMode},
    input::{Debouncer, InputEvent, InputPin},
};

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Receiver, RecvTimeoutError, Sender},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use tracing::{debug, info, instrument, warn};

/// Longest the interrupt-driven loop sleeps before re-checking the pin.
const IDLE_RESAMPLE: Duration = Duration::from_millis(50);

/// Stream of debounced events from an [`EdgeDetector`].
///
/// Iteration ends once the detector has stopped.
#[derive(Debug)]
pub struct InputEvents {
    rx: Receiver<InputEvent>,
}

impl InputEvents {
    /// Wait up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<InputEvent> {
        self.rx.recv_timeout(timeout).ok()
    }
}

impl Iterator for InputEvents {
    type Item = InputEvent;

    fn next(&mut self) -> Option<InputEvent> {
        self.rx.recv().ok()
    }
}

enum Source {
    Interrupt(Receiver<(bool, Instant)>),
    Polling,
}

/// Owns the thread that turns raw pin levels into debounced events.
pub struct EdgeDetector {
    cancel: CancelToken,
    polling: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl EdgeDetector {
    /// Start watching `pin`.
    ///
    /// Hardware change notification is used when the pin supports it;
    /// otherwise the level is sampled every `config.poll_interval`. Either
    /// way the same debounce rules apply.
    ///
    /// # Errors
    ///
    /// Returns the pin's error if its initial level cannot be read, or an
    /// I/O error if the thread cannot be spawned.
    #[instrument(skip(pin), fields(pin = config.pin))]
    pub fn spawn(
        mut pin: Box<dyn InputPin>,
        config: DebounceConfig,
        mode: InteractionMode,
    ) -> CoreResult<(Self, InputEvents)> {
        let initial = pin.read_level()?;

        let (raw_tx, raw_rx) = mpsc::channel();
        let source = match pin.watch_edges(Box::new(move |level| {
            let _ = raw_tx.send((level, Instant::now()));
        })) {
            Ok(()) => {
                info!("Edge notification enabled");
                Source::Interrupt(raw_rx)
            }
            Err(e) => {
                warn!(
                    error = ?e,
                    poll_ms = config.poll_interval.as_millis(),
                    "Edge notification unavailable, falling back to polling"
                );
                Source::Polling
            }
        };

        let cancel = CancelToken::new();
        let polling = Arc::new(AtomicBool::new(matches!(source, Source::Polling)));
        let (tx, rx) = mpsc::channel();

        let debouncer = Debouncer::new(mode, config.polarity, config.window, initial);
        let worker = Worker {
            pin,
            config,
            debouncer,
            tx,
            cancel: cancel.clone(),
            polling: polling.clone(),
            health: ReadHealth::default(),
        };

        let handle = thread::Builder::new()
            .name("willow-input".to_string())
            .spawn(move || worker.run(source))?;

        Ok((
            Self {
                cancel,
                polling,
                handle: Some(handle),
            },
            InputEvents { rx },
        ))
    }

    /// Whether the detector is sampling the pin instead of using notifications.
    pub fn is_polling(&self) -> bool {
        self.polling.load(Ordering::Relaxed)
    }

    /// Stop the detector thread and wait for it.
    ///
    /// After this returns no further events are delivered.
    pub fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("Input thread panicked");
        }
    }
}

impl Drop for EdgeDetector {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker {
    pin: Box<dyn InputPin>,
    config: DebounceConfig,
    debouncer: Debouncer,
    tx: Sender<InputEvent>,
    cancel: CancelToken,
    polling: Arc<AtomicBool>,
    health: ReadHealth,
}

/// Tracks runs of failed pin reads so each run is logged once.
#[derive(Debug, Default)]
pub(crate) struct ReadHealth {
    failures: u64,
}

impl ReadHealth {
    /// Record a failed read. `true` when this starts a new run of failures.
    pub(crate) fn failed(&mut self) -> bool {
        self.failures += 1;
        self.failures == 1
    }

    /// Record a good read. Returns the length of the run it ended, if any.
    pub(crate) fn succeeded(&mut self) -> Option<u64> {
        match std::mem::take(&mut self.failures) {
            0 => None,
            run => Some(run),
        }
    }
}

impl Worker {
    fn run(mut self, mut source: Source) {
        debug!(pressed = self.debouncer.is_pressed(), "Input thread started");

        while !self.cancel.is_cancelled() {
            let keep_going = match &source {
                Source::Interrupt(raw) => match self.wait_raw(raw) {
                    Ok(Some((level, at))) => self.observe(level, at),
                    Ok(None) => self.sample(),
                    Err(()) => {
                        warn!("Edge notification channel closed, falling back to polling");
                        self.polling.store(true, Ordering::Relaxed);
                        source = Source::Polling;
                        true
                    }
                },
                Source::Polling => {
                    let keep_going = self.sample();
                    self.cancel.sleep(self.config.poll_interval);
                    keep_going
                }
            };

            if !keep_going {
                debug!("Event receiver dropped");
                break;
            }
        }

        self.pin.unwatch();
        debug!("Input thread stopped");
    }

    /// Next raw notification, or `None` once it is time to re-sample.
    fn wait_raw(
        &self,
        raw: &Receiver<(bool, Instant)>,
    ) -> Result<Option<(bool, Instant)>, ()> {
        let now = Instant::now();
        let wait = self
            .debouncer
            .deadline(now)
            .map_or(IDLE_RESAMPLE, |end| end.saturating_duration_since(now))
            .min(IDLE_RESAMPLE);

        match raw.recv_timeout(wait) {
            Ok(sample) => Ok(Some(sample)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(()),
        }
    }

    fn sample(&mut self) -> bool {
        match self.pin.read_level() {
            Ok(level) => {
                if let Some(failures) = self.health.succeeded() {
                    info!(failures, "Input pin readable again");
                }
                self.observe(level, Instant::now())
            }
            Err(e) => {
                if self.health.failed() {
                    warn!(error = ?e, "Failed to read input pin, retrying");
                }
                true
            }
        }
    }

    /// Returns `false` once nobody is listening.
    fn observe(&mut self, level: bool, at: Instant) -> bool {
        let Some((kind, edge)) = self.debouncer.observe(level, at) else {
            return true;
        };

        debug!(?kind, ?edge, "Input event");
        let event = InputEvent {
            kind,
            edge,
            at,
            channel: self.config.pin,
        };
        self.tx.send(event).is_ok()
    }
}
