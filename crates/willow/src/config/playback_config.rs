use crate::config::{default_retry_delay_ms, default_shutdown_grace_ms};

use serde::{Deserialize, Serialize};

/// Playback loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Pause after an empty store or a failed play.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Silence between two secrets.
    #[serde(default)]
    pub gap_ms: u64,
    /// How long shutdown waits for a recording to finish.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
            gap_ms: 0,
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}
