use std::{panic::Location, path::PathBuf};

use error_location::ErrorLocation;
use thiserror::Error;

/// Installation core errors with source location tracking.
#[derive(Error, Debug)]
pub enum WillowError {
    /// The secrets directory holds nothing playable.
    #[error("No secrets available in {dir:?} {location}")]
    NoSecretsAvailable {
        /// Directory that was listed.
        dir: PathBuf,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No audio input device found.
    #[error("No microphone found {location}")]
    NoInputDevice {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No audio output device found.
    #[error("No speaker found {location}")]
    NoOutputDevice {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio device operation failed.
    #[error("Audio device error: {reason} {location}")]
    DeviceError {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The capture device stopped delivering audio.
    #[error("Capture stalled after {waited_ms}ms without audio {location}")]
    CaptureStalled {
        /// How long the read waited.
        waited_ms: u128,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio resampling failed.
    #[error("Resampling error: {reason} {location}")]
    ResamplingError {
        /// Description of the resampling error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A configuration value is out of range.
    #[error("Invalid configuration: {reason} {location}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The input pin cannot deliver edge notifications.
    #[error("Edge notifications unsupported: {reason} {location}")]
    EdgeWatchUnsupported {
        /// Why registration failed.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Reading the input pin failed.
    #[error("Input pin error: {reason} {location}")]
    PinError {
        /// Description of the pin failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Filesystem operation failed.
    #[error("IO error: {source} {location}")]
    Io {
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// WAV encoding or decoding failed.
    #[error("WAV error: {source} {location}")]
    Wav {
        /// The underlying hound error.
        #[source]
        source: hound::Error,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl WillowError {
    /// Whether this is the expected "nothing to play yet" condition.
    pub fn is_empty_inventory(&self) -> bool {
        matches!(self, WillowError::NoSecretsAvailable { .. })
    }
}

// Manual From impls with location tracking.
// Cannot use #[from] because it does not support extra fields.
impl From<std::io::Error> for WillowError {
    #[track_caller]
    fn from(source: std::io::Error) -> Self {
        WillowError::Io {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<hound::Error> for WillowError {
    #[track_caller]
    fn from(source: hound::Error) -> Self {
        WillowError::Wav {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

/// Result type alias using [`WillowError`].
pub type Result<T> = std::result::Result<T, WillowError>;
