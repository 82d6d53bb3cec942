use crate::config::default_secrets_dir;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where secrets live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// The secrets directory.
    #[serde(default = "default_secrets_dir")]
    pub secrets_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            secrets_dir: default_secrets_dir(),
        }
    }
}
