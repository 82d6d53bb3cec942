//! Serializes access to the shared audio hardware.
//!
//! In [`DuplexMode::Exclusive`] a capture request makes the active render
//! yield at its next chunk boundary and blocks new renders until the capture
//! lease is dropped. Capture always wins.

use crate::{CancelToken, config::DuplexMode};

use std::{
    sync::{Condvar, Mutex, MutexGuard},
    time::Duration,
};

use tracing::debug;

/// How often a waiting render re-checks its cancellation token.
const RENDER_WAIT_SLICE: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
struct GateState {
    capture_waiting: usize,
    capturing: bool,
    rendering: bool,
}

/// Capture/render arbitration for one physical device.
#[derive(Debug)]
pub struct AudioGate {
    mode: DuplexMode,
    state: Mutex<GateState>,
    changed: Condvar,
}

impl AudioGate {
    /// Create a gate enforcing `mode`.
    pub fn new(mode: DuplexMode) -> Self {
        Self {
            mode,
            state: Mutex::new(GateState::default()),
            changed: Condvar::new(),
        }
    }

    /// The sharing policy this gate enforces.
    pub fn mode(&self) -> DuplexMode {
        self.mode
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Take the device for capture, waiting for any render to yield.
    pub fn acquire_capture(&self) -> CaptureLease<'_> {
        if self.mode == DuplexMode::FullDuplex {
            return CaptureLease { gate: None };
        }

        let mut state = self.lock();
        state.capture_waiting += 1;
        if state.rendering {
            debug!("Capture waiting for playback to yield");
        }
        let mut state = self
            .changed
            .wait_while(state, |s| s.rendering || s.capturing)
            .unwrap_or_else(|e| e.into_inner());
        state.capture_waiting -= 1;
        state.capturing = true;

        CaptureLease { gate: Some(self) }
    }

    /// Take the device for render.
    ///
    /// Blocks while a capture is active or pending. Returns `None` if
    /// `cancel` fires while waiting.
    pub fn acquire_render(&self, cancel: &CancelToken) -> Option<RenderLease<'_>> {
        if self.mode == DuplexMode::FullDuplex {
            return Some(RenderLease { gate: None });
        }

        let mut state = self.lock();
        loop {
            if cancel.is_cancelled() {
                return None;
            }
            if !state.capturing && state.capture_waiting == 0 && !state.rendering {
                state.rendering = true;
                return Some(RenderLease { gate: Some(self) });
            }
            state = self
                .changed
                .wait_timeout(state, RENDER_WAIT_SLICE)
                .unwrap_or_else(|e| e.into_inner())
                .0;
        }
    }

    /// Whether an active render should stop to let a capture start.
    pub fn render_should_yield(&self) -> bool {
        self.mode == DuplexMode::Exclusive && self.lock().capture_waiting > 0
    }

    fn release_capture(&self) {
        self.lock().capturing = false;
        self.changed.notify_all();
    }

    fn release_render(&self) {
        self.lock().rendering = false;
        self.changed.notify_all();
    }
}

/// Held for the lifetime of a capture stream.
#[must_use = "the device is released when the lease is dropped"]
pub struct CaptureLease<'a> {
    gate: Option<&'a AudioGate>,
}

impl Drop for CaptureLease<'_> {
    fn drop(&mut self) {
        if let Some(gate) = self.gate {
            gate.release_capture();
        }
    }
}

/// Held for the lifetime of a render stream.
#[must_use = "the device is released when the lease is dropped"]
pub struct RenderLease<'a> {
    gate: Option<&'a AudioGate>,
}

impl Drop for RenderLease<'_> {
    fn drop(&mut self) {
        if let Some(gate) = self.gate {
            gate.release_render();
        }
    }
}
