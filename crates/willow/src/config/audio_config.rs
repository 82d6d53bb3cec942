use crate::config::{default_channels, default_chunk_size, default_mixer_control, default_sample_rate};

use willow_core::{AudioFormat, DuplexMode};

use serde::{Deserialize, Serialize};

/// Whether recording and playback may use the hardware at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplexSetting {
    /// Recording preempts playback.
    #[default]
    Exclusive,
    /// Capture and render run concurrently.
    FullDuplex,
}

impl From<DuplexSetting> for DuplexMode {
    fn from(setting: DuplexSetting) -> Self {
        match setting {
            DuplexSetting::Exclusive => DuplexMode::Exclusive,
            DuplexSetting::FullDuplex => DuplexMode::FullDuplex,
        }
    }
}

/// Audio device and format configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Frames per second of recorded secrets.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Channels of recorded secrets.
    #[serde(default = "default_channels")]
    pub channels: u16,
    /// Frames per capture read.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Substring of the microphone name (None = default device).
    #[serde(default)]
    pub input_device: Option<String>,
    /// Substring of the speaker name (None = default device).
    #[serde(default)]
    pub output_device: Option<String>,
    /// Capture/render sharing policy.
    #[serde(default)]
    pub duplex: DuplexSetting,
    /// Output volume applied with `amixer` at startup (None = leave as is).
    #[serde(default)]
    pub volume_percent: Option<u8>,
    /// ALSA mixer control that `volume_percent` adjusts.
    #[serde(default = "default_mixer_control")]
    pub mixer_control: String,
}

impl AudioConfig {
    /// The capture format recorded secrets use.
    pub fn format(&self) -> AudioFormat {
        AudioFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
            chunk_size: self.chunk_size,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_channels(),
            chunk_size: default_chunk_size(),
            input_device: None,
            output_device: None,
            duplex: DuplexSetting::default(),
            volume_percent: None,
            mixer_control: default_mixer_control(),
        }
    }
}
