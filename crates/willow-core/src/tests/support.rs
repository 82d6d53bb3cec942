use crate::{
    AudioBackend, AudioFormat, CaptureStream, CoreResult, DebounceConfig, DuplexMode,
    EdgeCallback, InputPin, InstallationConfig, InteractionMode, PlaybackConfig, Polarity,
    RecorderConfig, RenderStream, WillowError,
};

use std::{
    panic::Location,
    path::Path,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use error_location::ErrorLocation;
use hound::{SampleFormat, WavSpec, WavWriter};

pub(crate) const CHUNK_DELAY: Duration = Duration::from_millis(5);
pub(crate) const CAPTURE_VALUE: i16 = 1_000;

/// Scripted audio hardware: capture hands out constant chunks after a short
/// delay, render counts what it was given.
#[derive(Default)]
pub(crate) struct FakeBackend {
    pub(crate) chunk_delay: Duration,
    pub(crate) render_delay: Duration,
    /// Capture fails on the read after this many chunks.
    pub(crate) fail_capture_after: Option<u64>,
    pub(crate) fail_capture_open: bool,
    pub(crate) captures_opened: AtomicUsize,
    pub(crate) renders_opened: AtomicUsize,
    pub(crate) rendered_samples: Arc<AtomicU64>,
    pub(crate) capturing: Arc<AtomicBool>,
    pub(crate) rendering: Arc<AtomicBool>,
    /// Set if capture and render were ever open at the same time.
    pub(crate) overlapped: Arc<AtomicBool>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self {
            chunk_delay: CHUNK_DELAY,
            render_delay: Duration::from_millis(1),
            ..Self::default()
        }
    }
}

struct FakeCapture {
    samples: usize,
    delay: Duration,
    fail_after: Option<u64>,
    reads: u64,
    capturing: Arc<AtomicBool>,
}

impl CaptureStream for FakeCapture {
    fn read_chunk(&mut self) -> CoreResult<Vec<i16>> {
        thread::sleep(self.delay);
        if self.fail_after.is_some_and(|n| self.reads >= n) {
            return Err(WillowError::DeviceError {
                reason: "input overflow".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.reads += 1;
        Ok(vec![CAPTURE_VALUE; self.samples])
    }
}

impl Drop for FakeCapture {
    fn drop(&mut self) {
        self.capturing.store(false, Ordering::SeqCst);
    }
}

struct FakeRender {
    delay: Duration,
    rendered: Arc<AtomicU64>,
    rendering: Arc<AtomicBool>,
}

impl RenderStream for FakeRender {
    fn write(&mut self, samples: &[f32]) -> CoreResult<()> {
        thread::sleep(self.delay);
        self.rendered
            .fetch_add(samples.len() as u64, Ordering::SeqCst);
        Ok(())
    }

    fn finish(self: Box<Self>) -> CoreResult<()> {
        Ok(())
    }
}

impl Drop for FakeRender {
    fn drop(&mut self) {
        self.rendering.store(false, Ordering::SeqCst);
    }
}

impl AudioBackend for FakeBackend {
    fn open_capture(&self, format: &AudioFormat) -> CoreResult<Box<dyn CaptureStream>> {
        if self.fail_capture_open {
            return Err(WillowError::NoInputDevice {
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.captures_opened.fetch_add(1, Ordering::SeqCst);
        if self.rendering.load(Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.capturing.store(true, Ordering::SeqCst);
        Ok(Box::new(FakeCapture {
            samples: format.chunk_samples(),
            delay: self.chunk_delay,
            fail_after: self.fail_capture_after,
            reads: 0,
            capturing: Arc::clone(&self.capturing),
        }))
    }

    fn open_render(&self, _format: &AudioFormat) -> CoreResult<Box<dyn RenderStream>> {
        self.renders_opened.fetch_add(1, Ordering::SeqCst);
        if self.capturing.load(Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.rendering.store(true, Ordering::SeqCst);
        Ok(Box::new(FakeRender {
            delay: self.render_delay,
            rendered: Arc::clone(&self.rendered_samples),
            rendering: Arc::clone(&self.rendering),
        }))
    }
}

/// A pin with no interrupt support, driven through a shared level.
#[derive(Clone, Default)]
pub(crate) struct PolledPin {
    pub(crate) level: Arc<AtomicBool>,
}

impl InputPin for PolledPin {
    fn read_level(&mut self) -> CoreResult<bool> {
        Ok(self.level.load(Ordering::SeqCst))
    }
}

/// A pin that reports changes through a callback the test fires by hand.
#[derive(Clone, Default)]
pub(crate) struct InterruptPin {
    pub(crate) level: Arc<AtomicBool>,
    callback: Arc<Mutex<Option<EdgeCallback>>>,
}

impl InterruptPin {
    /// Set the level and fire the registered callback.
    pub(crate) fn set(&self, high: bool) {
        self.level.store(high, Ordering::SeqCst);
        self.notify(high);
    }

    /// Fire the callback without changing the level, like a bounce the
    /// hardware saw but that had already settled when sampled.
    pub(crate) fn notify(&self, high: bool) {
        if let Some(callback) = self.callback.lock().unwrap().as_mut() {
            callback(high);
        }
    }
}

impl InputPin for InterruptPin {
    fn read_level(&mut self) -> CoreResult<bool> {
        Ok(self.level.load(Ordering::SeqCst))
    }

    fn watch_edges(&mut self, on_change: EdgeCallback) -> CoreResult<()> {
        *self.callback.lock().unwrap() = Some(on_change);
        Ok(())
    }

    fn unwatch(&mut self) {
        self.callback.lock().unwrap().take();
    }
}

pub(crate) fn recorder_config(mode: InteractionMode) -> RecorderConfig {
    RecorderConfig {
        mode,
        fixed_duration: Duration::from_secs(5),
        min_duration: Duration::from_millis(250),
        max_duration: Duration::from_secs(600),
        format: AudioFormat::voice(),
    }
}

pub(crate) fn playback_config() -> PlaybackConfig {
    PlaybackConfig {
        retry_delay: Duration::from_millis(20),
        gap: Duration::ZERO,
        chunk_size: 2048,
    }
}

pub(crate) fn installation_config(dir: &Path, mode: InteractionMode) -> InstallationConfig {
    InstallationConfig {
        secrets_dir: dir.to_path_buf(),
        debounce: DebounceConfig::new(10, Polarity::ActiveHigh, Duration::from_millis(50)),
        recorder: recorder_config(mode),
        playback: playback_config(),
        duplex: DuplexMode::Exclusive,
        shutdown_grace: Duration::from_secs(2),
    }
}

/// Write a published-looking mono 16-bit secret with `frames` frames.
pub(crate) fn write_secret(dir: &Path, stem: &str, frames: u32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate: 16_000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(dir.join(format!("{stem}.wav")), spec).unwrap();
    for i in 0..frames {
        writer.write_sample((i % 100) as i16).unwrap();
    }
    writer.finalize().unwrap();
}
