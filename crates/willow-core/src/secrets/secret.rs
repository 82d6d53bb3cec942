use crate::{CoreResult, audio::AudioFormat};

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::{Local, NaiveDateTime};
use hound::{SampleFormat, WavReader};

pub(crate) const SECRET_PREFIX: &str = "secret_";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Identifier of a secret: its file stem.
///
/// Recordings made here are `secret_YYYYMMDD_HHMMSS`. Two recordings
/// finished within the same second share an identifier and the later one
/// replaces the earlier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SecretId(String);

impl SecretId {
    /// Identifier for the current local second.
    pub fn now() -> Self {
        Self::from_timestamp(Local::now().naive_local())
    }

    /// Identifier for a given creation time.
    pub fn from_timestamp(at: NaiveDateTime) -> Self {
        Self(format!("{}{}", SECRET_PREFIX, at.format(TIMESTAMP_FORMAT)))
    }

    /// Identifier of a published file, if `path` names one.
    ///
    /// Hidden files and anything without a `.wav` extension are rejected.
    pub fn from_path(path: &Path) -> Option<Self> {
        let is_wav = path
            .extension()
            .is_some_and(|ext| ext == "wav");
        let stem = path.file_stem()?.to_str()?;
        if !is_wav || stem.is_empty() || stem.starts_with('.') {
            return None;
        }
        Some(Self(stem.to_string()))
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Creation time, when the identifier follows the naming scheme.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        let stamp = self.0.strip_prefix(SECRET_PREFIX)?;
        NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()
    }
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How samples are stored in a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleEncoding {
    /// Signed integer PCM.
    Int,
    /// IEEE float PCM.
    Float,
}

/// A published recording and its header metadata.
#[derive(Debug, Clone)]
pub struct Secret {
    /// File stem identifier.
    pub id: SecretId,
    /// Location on disk.
    pub path: PathBuf,
    /// Playback length derived from the frame count.
    pub duration: Duration,
    /// File size including the header.
    pub bytes: u64,
    /// Interleaved channels.
    pub channels: u16,
    /// Frames per second.
    pub sample_rate: u32,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// Integer or float samples.
    pub encoding: SampleEncoding,
}

impl Secret {
    /// Read a secret's metadata from its WAV header.
    #[track_caller]
    pub fn inspect(path: &Path) -> CoreResult<Self> {
        let id = id_of(path);

        let bytes = fs::metadata(path)?.len();
        let reader = WavReader::open(path)?;
        let spec = reader.spec();
        let frames = reader.duration();

        Ok(Self {
            id,
            path: path.to_path_buf(),
            duration: Duration::from_secs_f64(f64::from(frames) / f64::from(spec.sample_rate.max(1))),
            bytes,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            encoding: match spec.sample_format {
                SampleFormat::Int => SampleEncoding::Int,
                SampleFormat::Float => SampleEncoding::Float,
            },
        })
    }

    /// Metadata for a file just written as 16-bit PCM in `format`.
    ///
    /// Used when the header cannot be read back; the size is zero if the
    /// file cannot be stat'ed either.
    pub fn written(path: &Path, format: &AudioFormat, frames: u64) -> Self {
        Self {
            id: id_of(path),
            path: path.to_path_buf(),
            duration: Duration::from_secs_f64(
                frames as f64 / f64::from(format.sample_rate.max(1)),
            ),
            bytes: fs::metadata(path).map(|m| m.len()).unwrap_or(0),
            channels: format.channels,
            sample_rate: format.sample_rate,
            bits_per_sample: 16,
            encoding: SampleEncoding::Int,
        }
    }
}

fn id_of(path: &Path) -> SecretId {
    SecretId::from_path(path).unwrap_or_else(|| {
        SecretId(
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        )
    })
}
