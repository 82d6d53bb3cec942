use crate::config::{default_debounce_ms, default_pin};

use willow_core::{InteractionMode, Polarity};

use serde::{Deserialize, Serialize};

/// Where button presses come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    /// A GPIO pin on the Raspberry Pi.
    #[default]
    Gpio,
    /// Enter on stdin, for bench testing.
    Keyboard,
}

/// Electrical level that means "pressed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolaritySetting {
    /// Pull-down wiring, press reads high.
    #[default]
    ActiveHigh,
    /// Pull-up wiring, press reads low.
    ActiveLow,
}

impl From<PolaritySetting> for Polarity {
    fn from(setting: PolaritySetting) -> Self {
        match setting {
            PolaritySetting::ActiveHigh => Polarity::ActiveHigh,
            PolaritySetting::ActiveLow => Polarity::ActiveLow,
        }
    }
}

/// How presses map onto recordings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ModeSetting {
    /// Each press records for a fixed duration.
    #[default]
    Toggle,
    /// Record while the button is held.
    PressRelease,
}

impl From<ModeSetting> for InteractionMode {
    fn from(setting: ModeSetting) -> Self {
        match setting {
            ModeSetting::Toggle => InteractionMode::Toggle,
            ModeSetting::PressRelease => InteractionMode::PressRelease,
        }
    }
}

/// Button configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// GPIO or keyboard.
    #[serde(default)]
    pub source: InputSource,
    /// BCM pin number.
    #[serde(default = "default_pin")]
    pub pin: u8,
    /// Which level counts as pressed.
    #[serde(default)]
    pub polarity: PolaritySetting,
    /// Minimum spacing between accepted transitions.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Polling period when interrupts are unavailable (None = derived).
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    /// Toggle or press/release.
    #[serde(default)]
    pub mode: ModeSetting,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            source: InputSource::default(),
            pin: default_pin(),
            polarity: PolaritySetting::default(),
            debounce_ms: default_debounce_ms(),
            poll_interval_ms: None,
            mode: ModeSetting::default(),
        }
    }
}
