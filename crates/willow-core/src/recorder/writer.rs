use crate::{CoreResult, audio::AudioFormat};

use std::{fs::File, path::Path};

use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::debug;

/// Write captured chunks as 16-bit PCM and sync the file to disk.
///
/// Returns the number of frames written.
#[track_caller]
pub(crate) fn write_wav(path: &Path, format: &AudioFormat, chunks: &[Vec<i16>]) -> CoreResult<u64> {
    let spec = WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    let mut samples = 0u64;
    for chunk in chunks {
        for &sample in chunk {
            writer.write_sample(sample)?;
        }
        samples += chunk.len() as u64;
    }
    writer.finalize()?;

    File::open(path)?.sync_all()?;

    let frames = samples / u64::from(format.channels.max(1));
    debug!(path = ?path, chunks = chunks.len(), frames, "WAV written");
    Ok(frames)
}
