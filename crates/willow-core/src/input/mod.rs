//! Debounced edge detection for the installation's button.

mod debounce;
pub(crate) mod detector;

pub use {
    debounce::Debouncer,
    detector::{EdgeDetector, InputEvents},
};

use crate::{CoreResult, WillowError};

use std::{panic::Location, time::Instant};

use error_location::ErrorLocation;

/// Called with the new raw level (`true` = high) whenever the pin changes.
pub type EdgeCallback = Box<dyn FnMut(bool) + Send + 'static>;

/// A boolean input readable at any time, with optional change notification.
pub trait InputPin: Send {
    /// Current raw level, `true` for high.
    fn read_level(&mut self) -> CoreResult<bool>;

    /// Register for change notifications on both edges.
    ///
    /// Pins without interrupt support keep the default, which makes the edge
    /// detector fall back to polling.
    #[track_caller]
    fn watch_edges(&mut self, on_change: EdgeCallback) -> CoreResult<()> {
        drop(on_change);
        Err(WillowError::EdgeWatchUnsupported {
            reason: "pin only supports polling".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Drop any registered notification.
    fn unwatch(&mut self) {}
}

/// Physical edge behind an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Low to high.
    Rising,
    /// High to low.
    Falling,
}

/// Logical meaning of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEventKind {
    /// Toggle mode: start a fixed-duration recording.
    Trigger,
    /// Press/release mode: the button went down.
    Begin,
    /// Press/release mode: the button came up.
    End,
}

/// A debounced input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    /// What the event means.
    pub kind: InputEventKind,
    /// Which electrical edge produced it.
    pub edge: Edge,
    /// When the transition was accepted.
    pub at: Instant,
    /// Source pin.
    pub channel: u8,
}
