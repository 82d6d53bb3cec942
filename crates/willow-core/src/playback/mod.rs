//! Continuous random playback of stored secrets.

use crate::{
    CancelToken, CoreResult,
    audio::{AudioBackend, AudioFormat, AudioGate},
    config::PlaybackConfig,
    secrets::{SecretId, SecretsStore},
};

use std::{
    fs::File,
    io::BufReader,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};

use hound::{SampleFormat, WavReader};
use tracing::{debug, info, instrument, warn};

/// Why a render stopped before the end of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptReason {
    /// A recording needed the audio device.
    Recording,
    /// Shutdown was requested.
    Shutdown,
}

/// Result of one play attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// The whole secret was rendered.
    Completed {
        /// The secret that played.
        id: SecretId,
    },
    /// Rendering stopped early.
    Interrupted {
        /// The secret that was playing.
        id: SecretId,
        /// What stopped it.
        reason: InterruptReason,
    },
}

/// Counters describing the playback loop so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    /// Secrets rendered to the end.
    pub completed: u64,
    /// Renders cut short.
    pub interrupted: u64,
    /// Attempts that found the store empty.
    pub empty: u64,
    /// Attempts that failed for any other reason.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct Counters {
    completed: AtomicU64,
    interrupted: AtomicU64,
    empty: AtomicU64,
    failed: AtomicU64,
}

/// Picks secrets at random and renders them, one at a time.
pub struct Player {
    backend: Arc<dyn AudioBackend>,
    store: SecretsStore,
    gate: Arc<AudioGate>,
    config: PlaybackConfig,
    cursor: Mutex<Option<SecretId>>,
    counters: Counters,
}

impl Player {
    /// Create a player over `store`.
    pub fn new(
        backend: Arc<dyn AudioBackend>,
        store: SecretsStore,
        gate: Arc<AudioGate>,
        config: PlaybackConfig,
    ) -> Self {
        Self {
            backend,
            store,
            gate,
            config,
            cursor: Mutex::new(None),
            counters: Counters::default(),
        }
    }

    /// The secret currently rendering, if any.
    pub fn now_playing(&self) -> Option<SecretId> {
        self.cursor.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Snapshot of the loop counters.
    pub fn stats(&self) -> PlaybackStats {
        PlaybackStats {
            completed: self.counters.completed.load(Ordering::Relaxed),
            interrupted: self.counters.interrupted.load(Ordering::Relaxed),
            empty: self.counters.empty.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Render one uniformly chosen secret, blocking until it ends.
    ///
    /// # Errors
    ///
    /// Returns [`WillowError::NoSecretsAvailable`](crate::WillowError::NoSecretsAvailable)
    /// when the store is empty, or the decode/device error that stopped the
    /// render.
    pub fn play_one(&self, cancel: &CancelToken) -> CoreResult<PlaybackOutcome> {
        let id = self.store.choose_random()?;
        self.play(&id, cancel)
    }

    /// Render a specific secret, blocking until it ends.
    #[instrument(skip(self, cancel))]
    pub fn play(&self, id: &SecretId, cancel: &CancelToken) -> CoreResult<PlaybackOutcome> {
        let path = self.store.path_of(id);
        let mut reader = WavReader::open(&path)?;
        let spec = reader.spec();
        let format = AudioFormat {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            chunk_size: self.config.chunk_size,
        };

        let Some(_lease) = self.gate.acquire_render(cancel) else {
            return Ok(PlaybackOutcome::Interrupted {
                id: id.clone(),
                reason: InterruptReason::Shutdown,
            });
        };

        *self.cursor.lock().unwrap_or_else(|e| e.into_inner()) = Some(id.clone());
        let result = self.render(id, &mut reader, &format, cancel);
        *self.cursor.lock().unwrap_or_else(|e| e.into_inner()) = None;

        result
    }

    fn render(
        &self,
        id: &SecretId,
        reader: &mut WavReader<BufReader<File>>,
        format: &AudioFormat,
        cancel: &CancelToken,
    ) -> CoreResult<PlaybackOutcome> {
        let started = Instant::now();
        let spec = reader.spec();
        let mut samples = decode(reader, spec.sample_format, spec.bits_per_sample);
        let mut stream = self.backend.open_render(format)?;

        info!(id = %id, rate = spec.sample_rate, channels = spec.channels, "Playing secret");

        let wanted = format.chunk_samples();
        let mut chunk = Vec::with_capacity(wanted);
        loop {
            if cancel.is_cancelled() {
                debug!(id = %id, "Playback cancelled");
                return Ok(PlaybackOutcome::Interrupted {
                    id: id.clone(),
                    reason: InterruptReason::Shutdown,
                });
            }
            if self.gate.render_should_yield() {
                info!(id = %id, "Playback yielding to recording");
                return Ok(PlaybackOutcome::Interrupted {
                    id: id.clone(),
                    reason: InterruptReason::Recording,
                });
            }

            chunk.clear();
            for sample in samples.by_ref().take(wanted) {
                chunk.push(sample?);
            }
            if chunk.is_empty() {
                break;
            }
            stream.write(&chunk)?;
        }

        stream.finish()?;

        debug!(
            id = %id,
            elapsed_ms = started.elapsed().as_millis(),
            "Playback complete"
        );

        Ok(PlaybackOutcome::Completed { id: id.clone() })
    }

    /// Play secrets until `cancel` fires.
    ///
    /// Every failure, including an empty store, is logged and followed by
    /// the retry delay; nothing here ends the loop except cancellation.
    #[instrument(skip(self, cancel))]
    pub fn run_forever(&self, cancel: &CancelToken) {
        info!("Playback loop started");
        let mut was_empty = false;

        while !cancel.is_cancelled() {
            match self.play_one(cancel) {
                Ok(PlaybackOutcome::Completed { .. }) => {
                    was_empty = false;
                    self.counters.completed.fetch_add(1, Ordering::Relaxed);
                    if !self.config.gap.is_zero() {
                        cancel.sleep(self.config.gap);
                    }
                }
                Ok(PlaybackOutcome::Interrupted { reason, .. }) => {
                    self.counters.interrupted.fetch_add(1, Ordering::Relaxed);
                    if reason == InterruptReason::Shutdown {
                        break;
                    }
                }
                Err(e) if e.is_empty_inventory() => {
                    self.counters.empty.fetch_add(1, Ordering::Relaxed);
                    if !was_empty {
                        info!(dir = ?self.store.dir(), "No secrets to play yet, waiting");
                        was_empty = true;
                    }
                    cancel.sleep(self.config.retry_delay);
                }
                Err(e) => {
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(error = ?e, "Playback error");
                    cancel.sleep(self.config.retry_delay);
                }
            }
        }

        info!("Playback loop stopped");
    }
}

type SampleIter<'a> = Box<dyn Iterator<Item = Result<f32, hound::Error>> + 'a>;

/// Decode any supported WAV sample layout to floats in `-1.0..=1.0`.
fn decode(
    reader: &mut WavReader<BufReader<File>>,
    format: SampleFormat,
    bits: u16,
) -> SampleIter<'_> {
    match format {
        SampleFormat::Float => Box::new(reader.samples::<f32>()),
        SampleFormat::Int if bits <= 16 => Box::new(
            reader
                .samples::<i16>()
                .map(|s| s.map(|v| f32::from(v) / 32_768.0)),
        ),
        SampleFormat::Int => {
            let scale = (1_i64 << (bits.min(32) - 1)) as f32;
            Box::new(reader.samples::<i32>().map(move |s| s.map(|v| v as f32 / scale)))
        }
    }
}
