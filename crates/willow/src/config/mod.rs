mod audio_config;
#[allow(clippy::module_inception)]
mod config;
mod input_config;
mod logging_config;
mod playback_config;
mod recording_config;
mod storage_config;

pub(crate) use {
    audio_config::{AudioConfig, DuplexSetting},
    config::Config,
    input_config::{InputConfig, InputSource, ModeSetting, PolaritySetting},
    logging_config::LoggingConfig,
    playback_config::PlaybackConfig,
    recording_config::RecordingConfig,
    storage_config::StorageConfig,
};

pub(crate) const DEFAULT_PIN: u8 = 10;
pub(crate) const DEFAULT_DEBOUNCE_MS: u64 = 200;
pub(crate) const DEFAULT_FIXED_DURATION_S: f64 = 5.0;
pub(crate) const DEFAULT_MIN_DURATION_S: f64 = 0.25;
pub(crate) const DEFAULT_MAX_DURATION_S: f64 = 600.0;
pub(crate) const DEFAULT_SAMPLE_RATE: u32 = 16_000;
pub(crate) const DEFAULT_CHANNELS: u16 = 1;
pub(crate) const DEFAULT_CHUNK_SIZE: usize = 2048;
pub(crate) const DEFAULT_MIXER_CONTROL: &str = "PCM";
pub(crate) const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
pub(crate) const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 2_000;
pub(crate) const DEFAULT_SECRETS_DIR: &str = "secrets";
pub(crate) const DEFAULT_LOG_FILTER: &str = "willow=info,willow_core=info";

pub(crate) fn default_pin() -> u8 {
    DEFAULT_PIN
}

pub(crate) fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

pub(crate) fn default_fixed_duration_s() -> f64 {
    DEFAULT_FIXED_DURATION_S
}

pub(crate) fn default_min_duration_s() -> f64 {
    DEFAULT_MIN_DURATION_S
}

pub(crate) fn default_max_duration_s() -> f64 {
    DEFAULT_MAX_DURATION_S
}

pub(crate) fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

pub(crate) fn default_channels() -> u16 {
    DEFAULT_CHANNELS
}

pub(crate) fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

pub(crate) fn default_mixer_control() -> String {
    DEFAULT_MIXER_CONTROL.to_string()
}

pub(crate) fn default_retry_delay_ms() -> u64 {
    DEFAULT_RETRY_DELAY_MS
}

pub(crate) fn default_shutdown_grace_ms() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_MS
}

pub(crate) fn default_secrets_dir() -> std::path::PathBuf {
    std::path::PathBuf::from(DEFAULT_SECRETS_DIR)
}

pub(crate) fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}
