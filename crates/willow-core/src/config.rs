//! Construction-time configuration for every core component.
//!
//! The binary maps its TOML file and CLI flags onto these structs; nothing in
//! the core reads ambient constants.

use crate::{CoreResult, WillowError, audio::AudioFormat};

use std::{panic::Location, path::PathBuf, time::Duration};

use error_location::ErrorLocation;

/// Electrical level that means "pressed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Button wired to 3V3 with a pull-down; press is a rising edge.
    ActiveHigh,
    /// Button wired to GND with a pull-up; press is a falling edge.
    ActiveLow,
}

impl Polarity {
    /// Translate a raw pin level into "is the button pressed".
    pub fn is_pressed(self, level_high: bool) -> bool {
        match self {
            Polarity::ActiveHigh => level_high,
            Polarity::ActiveLow => !level_high,
        }
    }
}

/// How presses map onto recording sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionMode {
    /// Each press records for a fixed duration.
    Toggle,
    /// Recording lasts from press until release.
    PressRelease,
}

/// Whether capture and render may share the audio hardware at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplexMode {
    /// Recording preempts playback; they never overlap.
    #[default]
    Exclusive,
    /// The hardware is known to handle simultaneous capture and render.
    FullDuplex,
}

/// Edge detector settings.
#[derive(Debug, Clone)]
pub struct DebounceConfig {
    /// GPIO channel reported in every event.
    pub pin: u8,
    /// Which level counts as pressed.
    pub polarity: Polarity,
    /// Minimum spacing between accepted transitions.
    pub window: Duration,
    /// Sampling period when interrupts are unavailable.
    pub poll_interval: Duration,
}

impl DebounceConfig {
    /// Build a config with the polling interval derived from the window.
    pub fn new(pin: u8, polarity: Polarity, window: Duration) -> Self {
        Self {
            pin,
            polarity,
            window,
            poll_interval: default_poll_interval(window),
        }
    }
}

/// One twentieth of the debounce window, never below a millisecond.
pub fn default_poll_interval(window: Duration) -> Duration {
    (window / 20).max(Duration::from_millis(1))
}

/// Recording session settings.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Toggle or press/release.
    pub mode: InteractionMode,
    /// Length of a toggle-mode recording.
    pub fixed_duration: Duration,
    /// Recordings shorter than this (wall clock) are discarded.
    pub min_duration: Duration,
    /// Hard cap for any session.
    pub max_duration: Duration,
    /// Capture format; `chunk_size` is frames per read.
    pub format: AudioFormat,
}

impl RecorderConfig {
    /// Number of chunk reads covering `duration`, rounded up.
    pub fn chunks_for(&self, duration: Duration) -> u64 {
        let frames = (duration.as_secs_f64() * f64::from(self.format.sample_rate)).round() as u64;
        frames.div_ceil(self.format.chunk_size as u64).max(1)
    }

    /// Chunk budget for a session in the configured mode.
    pub fn chunk_limit(&self) -> u64 {
        let cap = self.chunks_for(self.max_duration);
        match self.mode {
            InteractionMode::Toggle => self.chunks_for(self.fixed_duration).min(cap),
            InteractionMode::PressRelease => cap,
        }
    }
}

/// Playback loop settings.
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Delay before retrying after a failed play or an empty store.
    pub retry_delay: Duration,
    /// Pause between two successful plays.
    pub gap: Duration,
    /// Frames handed to the render stream per write.
    pub chunk_size: usize,
}

/// Everything the coordinator needs to assemble an installation.
#[derive(Debug, Clone)]
pub struct InstallationConfig {
    /// Directory holding the secrets.
    pub secrets_dir: PathBuf,
    /// Edge detector settings.
    pub debounce: DebounceConfig,
    /// Recording session settings.
    pub recorder: RecorderConfig,
    /// Playback loop settings.
    pub playback: PlaybackConfig,
    /// Capture/render sharing policy.
    pub duplex: DuplexMode,
    /// How long shutdown waits for an in-flight recording to finalize.
    pub shutdown_grace: Duration,
}

impl InstallationConfig {
    /// Reject values the components cannot work with.
    #[track_caller]
    pub fn validate(&self) -> CoreResult<()> {
        let invalid = |reason: String| WillowError::InvalidConfig {
            reason,
            location: ErrorLocation::from(Location::caller()),
        };

        let format = &self.recorder.format;
        if format.sample_rate == 0 || format.channels == 0 || format.chunk_size == 0 {
            return Err(invalid(format!(
                "sample_rate, channels and chunk_size must be non-zero (got {format:?})"
            )));
        }
        if self.playback.chunk_size == 0 {
            return Err(invalid("playback chunk_size must be non-zero".to_string()));
        }
        if self.debounce.window.is_zero() {
            return Err(invalid("debounce window must be non-zero".to_string()));
        }
        if self.debounce.poll_interval.is_zero() || self.debounce.poll_interval > self.debounce.window
        {
            return Err(invalid(format!(
                "poll interval {:?} must be non-zero and within the debounce window {:?}",
                self.debounce.poll_interval, self.debounce.window
            )));
        }
        if self.recorder.min_duration > self.recorder.max_duration {
            return Err(invalid(format!(
                "min_duration {:?} exceeds max_duration {:?}",
                self.recorder.min_duration, self.recorder.max_duration
            )));
        }
        if self.recorder.mode == InteractionMode::Toggle
            && self.recorder.fixed_duration > self.recorder.max_duration
        {
            return Err(invalid(format!(
                "fixed_duration {:?} exceeds max_duration {:?}",
                self.recorder.fixed_duration, self.recorder.max_duration
            )));
        }
        Ok(())
    }
}
