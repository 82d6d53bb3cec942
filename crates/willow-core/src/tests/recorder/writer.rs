use crate::{AudioFormat, recorder::writer::write_wav};

use hound::{SampleFormat, WavReader};
use tempfile::TempDir;

/// WHAT: Chunks are written back to back as 16-bit PCM
/// WHY: Secrets must play back exactly what was captured
#[test]
fn given_two_chunks_when_written_then_samples_concatenated() {
    // Given: Two small chunks of mono audio
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".rec_test.wav");
    let format = AudioFormat {
        sample_rate: 16_000,
        channels: 1,
        chunk_size: 3,
    };
    let chunks = vec![vec![1_i16, 2, 3], vec![-1, -2, -3]];

    // When: Written to disk
    let frames = write_wav(&path, &format, &chunks).unwrap();

    // Then: The header and samples match
    assert_eq!(frames, 6);
    let mut reader = WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 16_000);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, SampleFormat::Int);
    let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(samples, vec![1, 2, 3, -1, -2, -3]);
}

/// WHAT: Writing into a missing directory fails instead of panicking
/// WHY: The recorder turns this into a discarded session
#[test]
fn given_missing_directory_when_written_then_error_returned() {
    // Given: A path under a directory that does not exist
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join(".rec_test.wav");

    // When: Writing
    let result = write_wav(&path, &AudioFormat::voice(), &[vec![0; 2048]]);

    // Then: An error comes back
    assert!(result.is_err());
}
