use crate::{
    CoreResult, WillowError,
    audio::{
        AudioFormat, RenderStream, Resampler,
        resampler::{downmix, upmix},
    },
};

use std::{
    collections::VecDeque,
    panic::Location,
    sync::{Arc, Condvar, Mutex},
    time::{Duration, Instant},
};

use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, StreamTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, error, info, instrument, warn};

/// Queued audio kept ahead of the device, in seconds.
const QUEUE_AHEAD_SECS: f32 = 0.25;

/// How long a write waits for the device to consume queued audio.
const STALL_TIMEOUT: Duration = Duration::from_secs(2);

/// Slack added to the drain wait on top of the queued duration.
const DRAIN_SLACK: Duration = Duration::from_millis(500);

type SharedQueue = Arc<(Mutex<VecDeque<f32>>, Condvar)>;

/// Blocking writer over a cpal output stream.
///
/// Writes block once about a quarter second of audio is queued, so a render
/// paces itself at device speed and can be abandoned at any chunk boundary.
pub struct CpalRender {
    stream: Option<Stream>,
    queue: SharedQueue,
    resampler: Option<Resampler>,
    source: AudioFormat,
    device_rate: u32,
    device_channels: u16,
    high_water: usize,
}

impl CpalRender {
    #[track_caller]
    #[instrument(skip(device))]
    pub(crate) fn open(device: &Device, source: &AudioFormat) -> CoreResult<Self> {
        let supported = device
            .default_output_config()
            .map_err(|e| WillowError::DeviceError {
                reason: format!("Failed to get output config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        let config: StreamConfig = supported.into();

        let resampler = if config.sample_rate != source.sample_rate {
            Some(Resampler::new(source.sample_rate, config.sample_rate)?)
        } else {
            None
        };

        let high_water =
            (config.sample_rate as f32 * f32::from(config.channels) * QUEUE_AHEAD_SECS) as usize;
        let queue: SharedQueue = Arc::new((
            Mutex::new(VecDeque::with_capacity(high_water * 2)),
            Condvar::new(),
        ));

        let stream = {
            let queue = Arc::clone(&queue);
            device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        let (lock, cv) = &*queue;
                        let mut buf = lock.lock().unwrap_or_else(|e| {
                            error!("Render queue lock poisoned, recovering: {}", e);
                            e.into_inner()
                        });
                        for slot in data.iter_mut() {
                            *slot = buf.pop_front().unwrap_or(0.0);
                        }
                        cv.notify_all();
                    },
                    |err| {
                        error!("Audio output stream error: {}", err);
                    },
                    None,
                )
                .map_err(|e| WillowError::DeviceError {
                    reason: format!("Failed to build output stream: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?
        };

        stream.play().map_err(|e| WillowError::DeviceError {
            reason: format!("Failed to start output stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(
            device_rate = config.sample_rate,
            device_channels = config.channels,
            source_rate = source.sample_rate,
            source_channels = source.channels,
            "Audio render started"
        );

        Ok(Self {
            stream: Some(stream),
            queue,
            resampler,
            source: source.clone(),
            device_rate: config.sample_rate,
            device_channels: config.channels,
            high_water,
        })
    }

    #[track_caller]
    fn enqueue(&self, mono_device_rate: &[f32]) -> CoreResult<()> {
        let samples = upmix(mono_device_rate, self.device_channels);
        let (lock, cv) = &*self.queue;
        let guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let (mut guard, timeout) = cv
            .wait_timeout_while(guard, STALL_TIMEOUT, |buf| buf.len() >= self.high_water)
            .unwrap_or_else(|e| e.into_inner());
        if timeout.timed_out() && guard.len() >= self.high_water {
            return Err(WillowError::DeviceError {
                reason: "Output device stopped consuming audio".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        guard.extend(samples);
        Ok(())
    }
}

impl RenderStream for CpalRender {
    fn write(&mut self, samples: &[f32]) -> CoreResult<()> {
        let mono = downmix(samples, self.source.channels);
        let converted = match self.resampler.as_mut() {
            Some(resampler) => resampler.push(&mono)?,
            None => mono,
        };
        self.enqueue(&converted)
    }

    fn finish(mut self: Box<Self>) -> CoreResult<()> {
        if let Some(resampler) = self.resampler.as_mut() {
            let tail = resampler.flush()?;
            self.enqueue(&tail)?;
        }

        let started = Instant::now();
        let queue = Arc::clone(&self.queue);
        let (lock, cv) = &*queue;
        let queued = lock.lock().unwrap_or_else(|e| e.into_inner()).len();
        let limit = Duration::from_secs_f64(
            queued as f64 / (f64::from(self.device_rate) * f64::from(self.device_channels)),
        ) + DRAIN_SLACK;

        let guard = lock.lock().unwrap_or_else(|e| e.into_inner());
        let (guard, timeout) = cv
            .wait_timeout_while(guard, limit, |buf| !buf.is_empty())
            .unwrap_or_else(|e| e.into_inner());
        if timeout.timed_out() {
            warn!(
                remaining = guard.len(),
                "Render queue did not drain before timeout"
            );
        }
        drop(guard);

        if let Some(stream) = self.stream.take() {
            drop(stream);
        }
        debug!(
            drain_ms = started.elapsed().as_millis(),
            "Audio render finished"
        );
        Ok(())
    }
}
