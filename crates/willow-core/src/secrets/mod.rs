//! The secrets directory.
//!
//! One WAV file per secret, named from its second-resolution creation time.
//! In-progress recordings use hidden `.rec_*` names in the same directory and
//! become visible only through [`SecretsStore::publish`], an atomic rename.
//! The store itself takes no locks.

mod secret;

pub use secret::{SampleEncoding, Secret, SecretId};

use crate::{CoreResult, WillowError, audio::AudioFormat};

use std::{
    fs,
    io::ErrorKind,
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use rand::seq::SliceRandom;
use tracing::{debug, info, instrument, warn};

const SECRET_EXTENSION: &str = "wav";
const TEMP_PREFIX: &str = ".rec_";

/// Filesystem-backed secrets inventory.
#[derive(Debug, Clone)]
pub struct SecretsStore {
    dir: PathBuf,
}

impl SecretsStore {
    /// Use `dir` as the secrets directory. Nothing is touched on disk.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory this store reads and writes.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory if it does not exist yet.
    #[track_caller]
    #[instrument(skip(self), fields(dir = ?self.dir))]
    pub fn ensure_dir(&self) -> CoreResult<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
            info!(dir = ?self.dir, "Created secrets directory");
        }
        Ok(())
    }

    /// Published secrets currently on disk, in directory order.
    ///
    /// Hidden files (including in-progress recordings) are never listed. A
    /// missing directory lists as empty.
    #[track_caller]
    pub fn list(&self) -> CoreResult<Vec<SecretId>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if let Some(id) = SecretId::from_path(&path) {
                ids.push(id);
            }
        }

        Ok(ids)
    }

    /// Pick one published secret uniformly at random.
    ///
    /// # Errors
    ///
    /// Returns [`WillowError::NoSecretsAvailable`] when nothing is published.
    #[track_caller]
    pub fn choose_random(&self) -> CoreResult<SecretId> {
        let ids = self.list()?;
        ids.choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| WillowError::NoSecretsAvailable {
                dir: self.dir.clone(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Atomically move a finished recording to its published name.
    ///
    /// Both paths must live in the secrets directory so the rename never
    /// crosses a filesystem boundary. `format` and `frames` describe what was
    /// written; they stand in for the header if it cannot be read back, since
    /// the secret is already visible once the rename succeeds.
    ///
    /// # Errors
    ///
    /// Returns error only if the rename fails.
    #[track_caller]
    #[instrument(skip(self, format))]
    pub fn publish(
        &self,
        temp_path: &Path,
        final_path: &Path,
        format: &AudioFormat,
        frames: u64,
    ) -> CoreResult<Secret> {
        fs::rename(temp_path, final_path)?;
        let secret = match Secret::inspect(final_path) {
            Ok(secret) => secret,
            Err(e) => {
                warn!(
                    error = ?e,
                    path = ?final_path,
                    "Published secret unreadable, using written metadata"
                );
                Secret::written(final_path, format, frames)
            }
        };
        debug!(id = %secret.id, "Secret published");
        Ok(secret)
    }

    /// Identifier for a recording that starts now.
    pub fn next_id(&self) -> SecretId {
        SecretId::now()
    }

    /// Where the published file for `id` lives.
    pub fn path_of(&self, id: &SecretId) -> PathBuf {
        self.dir.join(format!("{}.{}", id.as_str(), SECRET_EXTENSION))
    }

    /// Hidden scratch path for an in-progress recording of `id`.
    pub fn temp_path_for(&self, id: &SecretId) -> PathBuf {
        let stamp = id.as_str().trim_start_matches(secret::SECRET_PREFIX);
        self.dir
            .join(format!("{}{}.{}", TEMP_PREFIX, stamp, SECRET_EXTENSION))
    }

    /// Read the full metadata of a published secret.
    #[track_caller]
    pub fn inspect(&self, id: &SecretId) -> CoreResult<Secret> {
        Secret::inspect(&self.path_of(id))
    }
}
