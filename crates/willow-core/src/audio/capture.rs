use crate::{
    CoreResult, WillowError,
    audio::{
        AudioFormat, CaptureStream, Resampler,
        resampler::{downmix, to_i16, upmix},
    },
};

use std::{
    collections::VecDeque,
    panic::Location,
    sync::{
        Arc, Condvar, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument};

/// Maximum device-rate samples held between reads (30 seconds at 48kHz).
///
/// The recorder drains the buffer every chunk, so this only fills when the
/// reader stalls; the oldest samples are dropped past this point.
pub(crate) const MAX_BUFFER_SAMPLES: usize = 48_000 * 30;

/// Minimum time a read waits for audio before declaring the device stalled.
const MIN_STALL_TIMEOUT: Duration = Duration::from_secs(2);

type SharedBuffer = Arc<(Mutex<VecDeque<f32>>, Condvar)>;

/// Blocking chunk reader over a cpal input stream.
///
/// The cpal callback downmixes to mono and appends to a shared buffer;
/// [`read_chunk`](CaptureStream::read_chunk) converts that buffer to the
/// requested rate and channel count and hands out fixed-size 16-bit chunks.
pub struct CpalCapture {
    stream: Option<Stream>,
    buffer: SharedBuffer,
    /// Signals the audio callback to stop writing. Set before the stream is
    /// dropped so no in-flight callback appends after teardown starts.
    shutdown: Arc<AtomicBool>,
    resampler: Option<Resampler>,
    ready: VecDeque<f32>,
    format: AudioFormat,
    stall_timeout: Duration,
}

impl CpalCapture {
    #[track_caller]
    #[instrument(skip(device))]
    pub(crate) fn open(device: &Device, format: &AudioFormat) -> CoreResult<Self> {
        let supported = device
            .default_input_config()
            .map_err(|e| WillowError::DeviceError {
                reason: format!("Failed to get input config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        let config: StreamConfig = supported.into();

        let resampler = if config.sample_rate != format.sample_rate {
            Some(Resampler::new(config.sample_rate, format.sample_rate)?)
        } else {
            None
        };

        let buffer: SharedBuffer = Arc::new((
            Mutex::new(VecDeque::with_capacity(config.sample_rate as usize)),
            Condvar::new(),
        ));
        let shutdown = Arc::new(AtomicBool::new(false));

        let stream = {
            let buffer = Arc::clone(&buffer);
            let shutdown = Arc::clone(&shutdown);
            let device_channels = config.channels;

            device
                .build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if shutdown.load(Ordering::Acquire) {
                            return;
                        }
                        let mono = downmix(data, device_channels);
                        let (lock, cv) = &*buffer;
                        // Recover from lock poison rather than silently dropping audio.
                        let mut buf = lock.lock().unwrap_or_else(|e| {
                            error!("Capture buffer lock poisoned, recovering: {}", e);
                            e.into_inner()
                        });
                        buf.extend(mono);
                        while buf.len() > MAX_BUFFER_SAMPLES {
                            buf.pop_front();
                        }
                        cv.notify_one();
                    },
                    |err| {
                        error!("Audio input stream error: {}", err);
                    },
                    None,
                )
                .map_err(|e| WillowError::DeviceError {
                    reason: format!("Failed to build input stream: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?
        };

        stream.play().map_err(|e| WillowError::DeviceError {
            reason: format!("Failed to start input stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let stall_timeout = MIN_STALL_TIMEOUT.max(format.chunk_duration() * 4);

        info!(
            device_rate = config.sample_rate,
            device_channels = config.channels,
            target_rate = format.sample_rate,
            chunk_size = format.chunk_size,
            "Audio capture started"
        );

        Ok(Self {
            stream: Some(stream),
            buffer,
            shutdown,
            resampler,
            ready: VecDeque::with_capacity(format.chunk_samples() * 2),
            format: format.clone(),
            stall_timeout,
        })
    }

    /// Wait for device samples and move them, converted, into `ready`.
    #[track_caller]
    fn fill(&mut self) -> CoreResult<()> {
        let started = Instant::now();
        let raw: Vec<f32> = {
            let (lock, cv) = &*self.buffer;
            let guard = lock.lock().unwrap_or_else(|e| e.into_inner());
            let (mut guard, timeout) = cv
                .wait_timeout_while(guard, self.stall_timeout, |buf| buf.is_empty())
                .unwrap_or_else(|e| e.into_inner());
            if timeout.timed_out() && guard.is_empty() {
                return Err(WillowError::CaptureStalled {
                    waited_ms: started.elapsed().as_millis(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            guard.drain(..).collect()
        };

        let converted = match self.resampler.as_mut() {
            Some(resampler) => resampler.push(&raw)?,
            None => raw,
        };
        self.ready.extend(upmix(&converted, self.format.channels));
        Ok(())
    }
}

impl CaptureStream for CpalCapture {
    fn read_chunk(&mut self) -> CoreResult<Vec<i16>> {
        let wanted = self.format.chunk_samples();
        while self.ready.len() < wanted {
            self.fill()?;
        }
        Ok(self.ready.drain(..wanted).map(to_i16).collect())
    }
}

impl Drop for CpalCapture {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(stream) = self.stream.take() {
            drop(stream);
            debug!("Audio capture stopped");
        }
    }
}
