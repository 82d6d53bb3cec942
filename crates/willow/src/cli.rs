//! Command-line interface.

use crate::config::{Config, InputSource, ModeSetting, PolaritySetting};

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Whispering Willow: press a button, whisper a secret, hear someone else's.
#[derive(Debug, Parser, Clone)]
#[command(name = "willow", about, author, version)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, env = "WILLOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// GPIO pin (BCM numbering) wired to the button
    #[arg(long, global = true)]
    pub pin: Option<u8>,

    /// Treat a low level as pressed (pull-up wiring)
    #[arg(long, global = true, default_value_t = false)]
    pub active_low: bool,

    /// Debounce window in milliseconds
    #[arg(long, global = true)]
    pub debounce_ms: Option<u64>,

    /// Interaction mode
    #[arg(long, global = true, value_enum)]
    pub mode: Option<ModeSetting>,

    /// Discard recordings shorter than this many seconds
    #[arg(long, global = true)]
    pub min_duration: Option<f64>,

    /// Stop recordings after this many seconds
    #[arg(long, global = true)]
    pub max_duration: Option<f64>,

    /// Directory holding the secrets
    #[arg(long, global = true, env = "WILLOW_SECRETS_DIR")]
    pub secrets_dir: Option<PathBuf>,

    /// Use Enter on stdin as the button instead of GPIO
    #[arg(long, global = true, default_value_t = false)]
    pub keyboard: bool,

    /// What to do (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands.
#[derive(Debug, Subcommand, Clone, PartialEq)]
pub enum Command {
    /// Run the installation until interrupted
    Run,
    /// List audio input and output devices
    Devices,
    /// List stored secrets with their metadata
    Secrets,
    /// Make one fixed-length recording and exit
    Record {
        /// Recording length in seconds (defaults to the configured fixed duration)
        #[arg(long)]
        seconds: Option<f64>,
    },
    /// Play one random secret and exit
    Play,
}

impl Cli {
    /// The requested subcommand, `run` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    /// Overlay command-line flags onto the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(pin) = self.pin {
            config.input.pin = pin;
        }
        if self.active_low {
            config.input.polarity = PolaritySetting::ActiveLow;
        }
        if let Some(debounce_ms) = self.debounce_ms {
            config.input.debounce_ms = debounce_ms;
        }
        if let Some(mode) = self.mode {
            config.input.mode = mode;
        }
        if let Some(min) = self.min_duration {
            config.recording.min_duration_s = min;
        }
        if let Some(max) = self.max_duration {
            config.recording.max_duration_s = max;
        }
        if let Some(dir) = &self.secrets_dir {
            config.storage.secrets_dir = dir.clone();
        }
        if self.keyboard {
            config.input.source = InputSource::Keyboard;
        }
    }
}
