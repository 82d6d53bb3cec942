use crate::audio::Resampler;

// Test constants
const INPUT_SAMPLE_RATE: u32 = 48000;
const OUTPUT_SAMPLE_RATE: u32 = 16000;
const ONE_SECOND_INPUT_SAMPLES: usize = INPUT_SAMPLE_RATE as usize;
const ONE_SECOND_OUTPUT_SAMPLES: usize = OUTPUT_SAMPLE_RATE as usize;
const LENGTH_TOLERANCE: u64 = 100;
const TEST_SIGNAL_AMPLITUDE: f32 = 0.5;
const TONE_INPUT_SAMPLES: usize = 4800;
const TONE_FREQUENCY_FACTOR: f32 = 0.1;
const TONE_OUTPUT_SAMPLES: usize = 1600;
const MAX_AMPLITUDE: f32 = 1.5;
const CALLBACK_SIZE: usize = 480;
const UPSAMPLE_INPUT_SAMPLES: usize = 16384;

/// WHAT: Pushing one second at 48kHz and flushing yields about one second at 16kHz
/// WHY: Capture devices run at 48kHz while secrets are stored at 16kHz
#[test]
fn given_48khz_audio_when_pushed_and_flushed_then_output_length_approximately_correct() {
    // Given: Resampler configured for 48kHz -> 16kHz
    let mut resampler = Resampler::new(INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE).unwrap();
    let input = vec![TEST_SIGNAL_AMPLITUDE; ONE_SECOND_INPUT_SAMPLES];

    // When: Pushing everything then flushing the tail
    let mut output = resampler.push(&input).unwrap();
    output.extend(resampler.flush().unwrap());

    // Then: Output is approximately 1 second at 16kHz
    assert!(
        (output.len() as i64 - ONE_SECOND_OUTPUT_SAMPLES as i64).unsigned_abs() < LENGTH_TOLERANCE,
        "Expected ~{} samples, got {}",
        ONE_SECOND_OUTPUT_SAMPLES,
        output.len()
    );
    assert!(output.iter().all(|&s| s.is_finite())); // No NaN/Inf
}

/// WHAT: Input smaller than one chunk is held until more arrives
/// WHY: Device callbacks deliver a few hundred frames at a time
#[test]
fn given_small_callbacks_when_pushed_then_output_only_on_whole_chunks() {
    // Given: A resampler and callback-sized slices
    let mut resampler = Resampler::new(INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE).unwrap();
    let callback = vec![TEST_SIGNAL_AMPLITUDE; CALLBACK_SIZE];

    // When: Pushing two callbacks (960 samples, under one chunk) then a third
    let first = resampler.push(&callback).unwrap();
    let second = resampler.push(&callback).unwrap();
    let third = resampler.push(&callback).unwrap();

    // Then: Nothing comes out until a whole chunk is buffered
    assert!(first.is_empty());
    assert!(second.is_empty());
    assert!(!third.is_empty());
}

/// WHAT: Flushing with nothing pending returns nothing
/// WHY: Edge case handling for zero-length input
#[test]
fn given_empty_resampler_when_flushing_then_empty_output() {
    // Given: A fresh resampler
    let mut resampler = Resampler::new(INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE).unwrap();

    // When: Pushing nothing and flushing
    let pushed = resampler.push(&[]).unwrap();
    let flushed = resampler.flush().unwrap();

    // Then: Both are empty
    assert!(pushed.is_empty());
    assert!(flushed.is_empty());
}

/// WHAT: Resampling preserves signal characteristics
/// WHY: Validates that audio quality is maintained through resampling
#[test]
fn given_tone_signal_when_resampling_then_output_preserves_characteristics() {
    // Given: Resampler and a simple tone signal
    let mut resampler = Resampler::new(INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE).unwrap();
    let input: Vec<f32> = (0..TONE_INPUT_SAMPLES)
        .map(|i| (i as f32 * TONE_FREQUENCY_FACTOR).sin())
        .collect();

    // When: Resampling the signal
    let mut output = resampler.push(&input).unwrap();
    output.extend(resampler.flush().unwrap());

    // Then: Output has expected length and all samples are finite
    assert!(
        (output.len() as i64 - TONE_OUTPUT_SAMPLES as i64).unsigned_abs() < LENGTH_TOLERANCE,
        "Expected ~{} samples, got {}",
        TONE_OUTPUT_SAMPLES,
        output.len()
    );
    assert!(
        output
            .iter()
            .all(|&s| s.is_finite() && s.abs() <= MAX_AMPLITUDE)
    );
}

/// WHAT: Upsampled output starts with the signal, not the filter's lead-in
/// WHY: Playback resamples 16kHz secrets to 48kHz and must not pad them with silence
#[test]
fn given_16khz_audio_when_upsampled_then_output_aligned_and_complete() {
    // Given: Resampler configured for 16kHz -> 48kHz and a constant signal
    let mut resampler = Resampler::new(OUTPUT_SAMPLE_RATE, INPUT_SAMPLE_RATE).unwrap();
    let input = vec![TEST_SIGNAL_AMPLITUDE; UPSAMPLE_INPUT_SAMPLES];

    // When: Pushing in callback-sized slices then flushing
    let mut output = Vec::new();
    for slice in input.chunks(CALLBACK_SIZE) {
        output.extend(resampler.push(slice).unwrap());
    }
    output.extend(resampler.flush().unwrap());

    // Then: Length is three times the input
    let expected = UPSAMPLE_INPUT_SAMPLES * 3;
    assert!(
        (output.len() as i64 - expected as i64).unsigned_abs() < LENGTH_TOLERANCE,
        "Expected ~{} samples, got {}",
        expected,
        output.len()
    );

    // Then: The signal is present right after the attack, not delayed
    let early = &output[100..700];
    let mean = early.iter().sum::<f32>() / early.len() as f32;
    assert!(mean > 0.4, "Expected signal near the start, mean was {}", mean);
}
