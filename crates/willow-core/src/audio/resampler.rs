use crate::{CoreResult, WillowError};

use std::panic::Location;

use audioadapter_buffers::direct::InterleavedSlice;
use error_location::ErrorLocation;
use rubato::{Fft, FixedSync, Resampler as RubatoResampler};
use tracing::{debug, instrument};

/// Streaming mono resampler.
///
/// Input arrives in arbitrary slices; whole chunks are converted as soon as
/// they are available and the remainder waits for the next call. The rubato
/// state carries across chunks so consecutive calls produce one continuous
/// signal. The filter's output delay is dropped from the front of the stream
/// and flushed out of the tail, so output lines up with input.
pub struct Resampler {
    resampler: Fft<f32>,
    input_rate: u32,
    output_rate: u32,
    chunk_size: usize,
    pending: Vec<f32>,
    /// Leading output frames still to discard.
    skip: usize,
    /// Input samples accepted so far.
    consumed: usize,
    /// Output samples returned so far.
    produced: usize,
}

impl Resampler {
    /// Mono resampler from `input_rate` to `output_rate`.
    #[track_caller]
    #[instrument]
    pub fn new(input_rate: u32, output_rate: u32) -> CoreResult<Self> {
        let chunk_size = 1024;
        let sub_chunks = 2;

        let resampler = Fft::<f32>::new(
            input_rate as usize,  // sample_rate_input
            output_rate as usize, // sample_rate_output
            chunk_size,           // chunk_size
            sub_chunks,           // sub_chunks
            1,                    // nbr_channels (mono)
            FixedSync::Input,     // fixed
        )
        .map_err(|e| WillowError::ResamplingError {
            reason: format!("Failed to create resampler: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;
        let skip = resampler.output_delay();

        debug!(
            input_rate = input_rate,
            output_rate = output_rate,
            chunk_size = chunk_size,
            delay = skip,
            "Resampler initialized"
        );

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
            chunk_size,
            pending: Vec::with_capacity(chunk_size * 2),
            skip,
            consumed: 0,
            produced: 0,
        })
    }

    /// Feed samples and return whatever output is ready.
    #[track_caller]
    pub fn push(&mut self, samples: &[f32]) -> CoreResult<Vec<f32>> {
        self.pending.extend_from_slice(samples);
        self.consumed += samples.len();

        let ready = self.pending.len() / self.chunk_size * self.chunk_size;
        if ready == 0 {
            return Ok(Vec::new());
        }

        let mut output = Vec::with_capacity(self.estimate(ready) + self.chunk_size);
        let input: Vec<f32> = self.pending.drain(..ready).collect();
        for chunk in input.chunks(self.chunk_size) {
            self.process_chunk(chunk, &mut output)?;
        }

        self.produced += output.len();
        Ok(output)
    }

    /// Convert the leftover samples, ending the stream.
    ///
    /// Feeds silence until the delayed tail has come out, then trims so the
    /// stream's total output matches its total input at the new rate.
    #[track_caller]
    pub fn flush(&mut self) -> CoreResult<Vec<f32>> {
        let remaining = self.estimate(self.consumed).saturating_sub(self.produced);
        if remaining == 0 {
            self.pending.clear();
            return Ok(Vec::new());
        }

        let mut chunk = std::mem::take(&mut self.pending);
        let mut output = Vec::with_capacity(remaining + self.chunk_size);
        while output.len() < remaining {
            chunk.resize(self.chunk_size, 0.0);
            let before = (output.len(), self.skip);
            self.process_chunk(&chunk, &mut output)?;
            chunk.clear();
            if (output.len(), self.skip) == before {
                break;
            }
        }
        output.truncate(remaining);
        self.produced += output.len();

        debug!(
            output_len = output.len(),
            input_rate = self.input_rate,
            output_rate = self.output_rate,
            "Resampler flushed"
        );

        Ok(output)
    }

    fn estimate(&self, input_len: usize) -> usize {
        (input_len as f64 * f64::from(self.output_rate) / f64::from(self.input_rate)).round()
            as usize
    }

    #[track_caller]
    fn process_chunk(&mut self, chunk: &[f32], output: &mut Vec<f32>) -> CoreResult<()> {
        let input_adapter = InterleavedSlice::new(chunk, 1, self.chunk_size).map_err(|e| {
            WillowError::ResamplingError {
                reason: format!("Failed to create input adapter: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        let output_frames = self.resampler.output_frames_max();
        let mut output_chunk = vec![0.0f32; output_frames];

        let mut output_adapter = InterleavedSlice::new_mut(&mut output_chunk, 1, output_frames)
            .map_err(|e| WillowError::ResamplingError {
                reason: format!("Failed to create output adapter: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let (_input_frames, output_frames_written) = self
            .resampler
            .process_into_buffer(&input_adapter, &mut output_adapter, None)
            .map_err(|e| WillowError::ResamplingError {
                reason: format!("Resampling failed: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let written = &output_chunk[..output_frames_written];
        let skipped = self.skip.min(written.len());
        self.skip -= skipped;
        output.extend_from_slice(&written[skipped..]);
        Ok(())
    }
}

/// Average interleaved frames down to one channel.
pub(crate) fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = usize::from(channels.max(1));
    if channels == 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}

/// Duplicate a mono signal across `channels` interleaved channels.
pub(crate) fn upmix(mono: &[f32], channels: u16) -> Vec<f32> {
    let channels = usize::from(channels.max(1));
    if channels == 1 {
        return mono.to_vec();
    }
    let mut out = Vec::with_capacity(mono.len() * channels);
    for &sample in mono {
        out.extend(std::iter::repeat_n(sample, channels));
    }
    out
}

/// Clamp a float sample into 16-bit PCM.
pub(crate) fn to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}
