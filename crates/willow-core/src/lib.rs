//! Whispering Willow Core Library
//!
//! Press-triggered recording and continuous random playback for an audio
//! installation: a debounced button starts recordings, at most one at a
//! time, each published atomically as a timestamped WAV "secret", while a
//! playback loop renders random secrets for as long as the process runs.
//!
//! # Example
//!
//! ```no_run
//! use willow_core::{
//!     AudioFormat, Coordinator, CoreResult, CpalBackend, DebounceConfig, DuplexMode,
//!     InputPin, InstallationConfig, InteractionMode, PlaybackConfig, Polarity,
//!     RecorderConfig,
//! };
//!
//! use std::{sync::Arc, thread::sleep, time::Duration};
//!
//! struct AlwaysReleased;
//!
//! impl InputPin for AlwaysReleased {
//!     fn read_level(&mut self) -> CoreResult<bool> {
//!         Ok(false)
//!     }
//! }
//!
//! fn main() -> CoreResult<()> {
//!     let config = InstallationConfig {
//!         secrets_dir: "secrets".into(),
//!         debounce: DebounceConfig::new(10, Polarity::ActiveHigh, Duration::from_millis(200)),
//!         recorder: RecorderConfig {
//!             mode: InteractionMode::Toggle,
//!             fixed_duration: Duration::from_secs(5),
//!             min_duration: Duration::from_millis(250),
//!             max_duration: Duration::from_secs(600),
//!             format: AudioFormat::voice(),
//!         },
//!         playback: PlaybackConfig {
//!             retry_delay: Duration::from_secs(1),
//!             gap: Duration::ZERO,
//!             chunk_size: 2048,
//!         },
//!         duplex: DuplexMode::Exclusive,
//!         shutdown_grace: Duration::from_secs(2),
//!     };
//!
//!     let backend = Arc::new(CpalBackend::default());
//!     let installation = Coordinator::start(config, backend, Box::new(AlwaysReleased))?;
//!
//!     sleep(Duration::from_secs(30));
//!     let report = installation.shutdown();
//!     println!("Clean shutdown: {}", report.is_clean());
//!     Ok(())
//! }
//! ```

mod audio;
mod cancel;
mod config;
mod coordinator;
mod error;
mod input;
mod playback;
mod recorder;
mod secrets;

pub use {
    audio::{
        AudioBackend, AudioFormat, AudioGate, CaptureLease, CaptureStream, CpalBackend,
        DeviceDirection, DeviceInfo, RenderLease, RenderStream,
    },
    cancel::CancelToken,
    config::{
        DebounceConfig, DuplexMode, InstallationConfig, InteractionMode, PlaybackConfig,
        Polarity, RecorderConfig, default_poll_interval,
    },
    coordinator::{Coordinator, ShutdownReport},
    error::Result as CoreResult,
    error::WillowError,
    input::{
        Debouncer, Edge, EdgeCallback, EdgeDetector, InputEvent, InputEventKind, InputEvents,
        InputPin,
    },
    playback::{InterruptReason, PlaybackOutcome, PlaybackStats, Player},
    recorder::{
        DiscardReason, RecordingManager, SessionOutcome, SessionState, StopReason,
        TriggerOutcome,
    },
    secrets::{SampleEncoding, Secret, SecretId, SecretsStore},
};

#[cfg(test)]
mod tests;
