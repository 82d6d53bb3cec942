//! Audio device boundary.
//!
//! The coordination logic only sees two byte-stream endpoints: a capture
//! stream handing out fixed-size chunks and a render stream accepting them.
//! Both are opened per session or per play and closed on drop.

mod backend;
pub(crate) mod capture;
mod gate;
mod render;
pub(crate) mod resampler;

pub(crate) use {capture::CpalCapture, render::CpalRender, resampler::Resampler};

pub use {
    backend::{CpalBackend, DeviceDirection, DeviceInfo},
    gate::{AudioGate, CaptureLease, RenderLease},
};

use crate::CoreResult;

use std::time::Duration;

/// Sample layout shared by capture, files and render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFormat {
    /// Frames per second.
    pub sample_rate: u32,
    /// Interleaved channels per frame.
    pub channels: u16,
    /// Frames per chunk.
    pub chunk_size: usize,
}

impl AudioFormat {
    /// 16kHz mono in 2048-frame chunks.
    pub fn voice() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
            chunk_size: 2048,
        }
    }

    /// Interleaved samples in one chunk.
    pub fn chunk_samples(&self) -> usize {
        self.chunk_size * usize::from(self.channels)
    }

    /// Wall-clock length of one chunk.
    pub fn chunk_duration(&self) -> Duration {
        Duration::from_secs_f64(self.chunk_size as f64 / f64::from(self.sample_rate.max(1)))
    }
}

/// A capture stream delivering fixed-size chunks of 16-bit samples.
pub trait CaptureStream {
    /// Block until the next chunk is available.
    ///
    /// Returns exactly [`AudioFormat::chunk_samples`] interleaved samples.
    fn read_chunk(&mut self) -> CoreResult<Vec<i16>>;
}

/// A render stream accepting interleaved float samples.
pub trait RenderStream {
    /// Queue samples, blocking while the device is behind.
    fn write(&mut self, samples: &[f32]) -> CoreResult<()>;

    /// Wait for queued audio to play out, then close.
    ///
    /// Dropping without calling this abandons whatever is still queued.
    fn finish(self: Box<Self>) -> CoreResult<()>;
}

/// Opens capture and render streams on the installation's hardware.
pub trait AudioBackend: Send + Sync {
    /// Open a capture stream producing `format`.
    fn open_capture(&self, format: &AudioFormat) -> CoreResult<Box<dyn CaptureStream>>;

    /// Open a render stream accepting `format`.
    fn open_render(&self, format: &AudioFormat) -> CoreResult<Box<dyn RenderStream>>;
}
