use crate::audio::{
    capture::MAX_BUFFER_SAMPLES,
    resampler::{downmix, to_i16, upmix},
};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// WHAT: Stereo frames are averaged to mono
/// WHY: USB microphones often open as stereo even with one capsule
#[test]
fn given_stereo_frames_when_downmixing_then_channels_averaged() {
    // Given: Two stereo frames
    let stereo = [0.2f32, 0.4, -1.0, 1.0];

    // When: Downmixing
    let mono = downmix(&stereo, 2);

    // Then: One averaged sample per frame
    assert_eq!(mono.len(), 2);
    assert!((mono[0] - 0.3).abs() < f32::EPSILON);
    assert!(mono[1].abs() < f32::EPSILON);
}

/// WHAT: Mono samples are duplicated across channels
/// WHY: Secrets may be recorded with more than one channel
#[test]
fn given_mono_samples_when_upmixing_then_each_frame_repeated() {
    // Given / When: Two mono samples spread over two channels
    let stereo = upmix(&[0.5, -0.5], 2);

    // Then: Interleaved duplicates
    assert_eq!(stereo, vec![0.5, 0.5, -0.5, -0.5]);
}

/// WHAT: Float samples are clamped into 16-bit range
/// WHY: Resampling can overshoot slightly past full scale
#[test]
fn given_out_of_range_float_when_converting_then_clamped() {
    assert_eq!(to_i16(0.0), 0);
    assert_eq!(to_i16(1.0), i16::MAX);
    assert_eq!(to_i16(1.7), i16::MAX);
    assert_eq!(to_i16(-3.0), -i16::MAX);
}

/// WHAT: Buffer respects MAX_BUFFER_SAMPLES limit
/// WHY: Prevents unbounded memory growth when reads fall behind the device
#[test]
fn given_buffer_at_max_capacity_when_adding_samples_then_oldest_discarded() {
    // Given: A VecDeque at max capacity filled with 0.0
    let mut buf = VecDeque::with_capacity(MAX_BUFFER_SAMPLES);
    buf.extend(std::iter::repeat_n(0.0f32, MAX_BUFFER_SAMPLES));
    assert_eq!(buf.len(), MAX_BUFFER_SAMPLES);

    // When: Adding 1024 new samples (value 1.0) beyond the limit
    let new_samples = vec![1.0f32; 1024];
    buf.extend(new_samples.iter().copied());
    while buf.len() > MAX_BUFFER_SAMPLES {
        buf.pop_front();
    }

    // Then: Buffer stays at MAX_BUFFER_SAMPLES and newest samples preserved
    assert_eq!(buf.len(), MAX_BUFFER_SAMPLES);
    assert!((buf[MAX_BUFFER_SAMPLES - 1] - 1.0).abs() < f32::EPSILON);
    assert!((buf[MAX_BUFFER_SAMPLES - 1024] - 1.0).abs() < f32::EPSILON);
}

/// WHAT: Lock poison recovery preserves buffer data
/// WHY: Ensures audio data is never silently lost on mutex poison
#[test]
fn given_poisoned_mutex_when_recovering_then_data_preserved() {
    // Given: A mutex poisoned by a panic while holding the lock
    let buf = Arc::new(Mutex::new(VecDeque::from(vec![0.5f32; 100])));
    let buf_clone = Arc::clone(&buf);

    let _ = std::thread::spawn(move || {
        let _guard = buf_clone.lock().unwrap();
        panic!("intentional panic to poison mutex");
    })
    .join();

    // When: Recovering from poisoned lock using unwrap_or_else
    let recovered = buf.lock().unwrap_or_else(|e| e.into_inner());

    // Then: Original data is fully preserved
    assert_eq!(recovered.len(), 100);
    assert!(recovered.iter().all(|&s| (s - 0.5).abs() < f32::EPSILON));
}
