use crate::config::{default_fixed_duration_s, default_max_duration_s, default_min_duration_s};

use serde::{Deserialize, Serialize};

/// Recording session lengths, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Length of a toggle-mode recording.
    #[serde(default = "default_fixed_duration_s")]
    pub fixed_duration_s: f64,
    /// Recordings shorter than this are discarded.
    #[serde(default = "default_min_duration_s")]
    pub min_duration_s: f64,
    /// Hard cap for any recording.
    #[serde(default = "default_max_duration_s")]
    pub max_duration_s: f64,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            fixed_duration_s: default_fixed_duration_s(),
            min_duration_s: default_min_duration_s(),
            max_duration_s: default_max_duration_s(),
        }
    }
}
