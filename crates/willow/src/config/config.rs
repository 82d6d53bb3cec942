//! Configuration management for willow.
//!
//! Handles loading and saving TOML configuration files with cross-platform
//! paths, validation, and atomic write operations.

use crate::{
    AppError, AppResult,
    config::{
        AudioConfig, InputConfig, LoggingConfig, PlaybackConfig, RecordingConfig, StorageConfig,
    },
};

use willow_core::{
    DebounceConfig, InstallationConfig, PlaybackConfig as CorePlaybackConfig, RecorderConfig,
};

use std::{
    fs,
    io::Write,
    panic::Location,
    path::{Path, PathBuf},
    time::Duration,
};

use directories::ProjectDirs;
use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Button configuration.
    #[serde(default)]
    pub input: InputConfig,
    /// Recording lengths.
    #[serde(default)]
    pub recording: RecordingConfig,
    /// Audio devices and format.
    #[serde(default)]
    pub audio: AudioConfig,
    /// Playback loop timing.
    #[serde(default)]
    pub playback: PlaybackConfig,
    /// Secrets location.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration, creating a default file if none exists.
    ///
    /// `path` overrides the platform config location.
    #[track_caller]
    #[instrument]
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!(config_path = ?config_path, "No config found, creating default");
            Self::create_default(&config_path)
        }
    }

    /// Parse configuration from a TOML file.
    #[track_caller]
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to read config {:?}: {}", path, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config = Self::from_toml(&contents)?;
        info!(config_path = ?path, "Configuration loaded");
        Ok(config)
    }

    /// Parse configuration from TOML text. Missing keys take defaults.
    #[track_caller]
    pub fn from_toml(contents: &str) -> AppResult<Self> {
        toml::from_str(contents).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Save configuration to `path` using atomic write pattern.
    ///
    /// Writes to a temporary file first, then renames to prevent corruption
    /// if the process crashes during the write.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        let contents = toml::to_string_pretty(self).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent)?;
            debug!(config_dir = ?parent, "Created config directory");
        }

        // Atomic write: write to temp file then rename
        let temp_path = path.with_extension("toml.tmp");

        let mut temp_file = fs::File::create(&temp_path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to create temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| AppError::ConfigError {
                reason: format!("Failed to write temp config file: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        temp_file.sync_all().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to sync temp config file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        fs::rename(&temp_path, path).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to rename temp config to final: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(config_path = ?path, "Configuration saved (atomic write)");

        Ok(())
    }

    /// Convert into the core's construction-time configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for negative or non-finite durations, a volume
    /// above 100%, or anything the core rejects.
    #[track_caller]
    pub fn to_installation(&self) -> AppResult<InstallationConfig> {
        if self.audio.volume_percent.is_some_and(|v| v > 100) {
            return Err(AppError::ConfigError {
                reason: format!(
                    "volume_percent must be at most 100 (got {:?})",
                    self.audio.volume_percent
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let window = Duration::from_millis(self.input.debounce_ms);
        let mut debounce = DebounceConfig::new(self.input.pin, self.input.polarity.into(), window);
        if let Some(poll_ms) = self.input.poll_interval_ms {
            debounce.poll_interval = Duration::from_millis(poll_ms);
        }

        let installation = InstallationConfig {
            secrets_dir: self.storage.secrets_dir.clone(),
            debounce,
            recorder: RecorderConfig {
                mode: self.input.mode.into(),
                fixed_duration: seconds("fixed_duration_s", self.recording.fixed_duration_s)?,
                min_duration: seconds("min_duration_s", self.recording.min_duration_s)?,
                max_duration: seconds("max_duration_s", self.recording.max_duration_s)?,
                format: self.audio.format(),
            },
            playback: CorePlaybackConfig {
                retry_delay: Duration::from_millis(self.playback.retry_delay_ms),
                gap: Duration::from_millis(self.playback.gap_ms),
                chunk_size: self.audio.chunk_size,
            },
            duplex: self.audio.duplex.into(),
            shutdown_grace: Duration::from_millis(self.playback.shutdown_grace_ms),
        };

        installation.validate().map_err(|e| AppError::ConfigError {
            reason: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(installation)
    }

    #[track_caller]
    fn project_dirs() -> AppResult<ProjectDirs> {
        ProjectDirs::from("org", "whispering-willow", "Willow").ok_or_else(|| {
            AppError::ConfigError {
                reason: "Failed to get project directories".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }

    #[track_caller]
    fn config_path() -> AppResult<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    #[track_caller]
    fn create_default(path: &Path) -> AppResult<Self> {
        let proj_dirs = Self::project_dirs()?;
        let data_dir = proj_dirs.data_dir();

        let mut config = Config::default();
        config.storage.secrets_dir = data_dir.join("secrets");
        config.logging.directory = Some(data_dir.join("logs"));

        config.save_to(path)?;

        info!(
            secrets_dir = ?config.storage.secrets_dir,
            "Default config created"
        );

        Ok(config)
    }
}

#[track_caller]
fn seconds(name: &str, value: f64) -> AppResult<Duration> {
    Duration::try_from_secs_f64(value).map_err(|e| AppError::ConfigError {
        reason: format!("{} must be a non-negative number of seconds (got {}): {}", name, value, e),
        location: ErrorLocation::from(Location::caller()),
    })
}
