use crate::{
    config::{InteractionMode, Polarity},
    input::{Edge, InputEventKind},
};

use std::time::{Duration, Instant};

/// Leading-edge debouncer with a lockout window.
///
/// A change of the logical (pressed/released) state is accepted immediately
/// unless another change was accepted less than `window` ago. Changes inside
/// the lockout are not dropped: the caller re-samples the level once
/// [`deadline`](Self::deadline) passes and the pending change is accepted
/// then if the level still disagrees with the last accepted state.
#[derive(Debug, Clone)]
pub struct Debouncer {
    mode: InteractionMode,
    polarity: Polarity,
    window: Duration,
    pressed: bool,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    /// Start from the pin's current level without emitting anything for it.
    pub fn new(
        mode: InteractionMode,
        polarity: Polarity,
        window: Duration,
        initial_level_high: bool,
    ) -> Self {
        Self {
            mode,
            polarity,
            window,
            pressed: polarity.is_pressed(initial_level_high),
            last_accepted: None,
        }
    }

    /// Whether the last accepted state is "pressed".
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// When the current lockout ends, if one is running at `now`.
    pub fn deadline(&self, now: Instant) -> Option<Instant> {
        let end = self.last_accepted? + self.window;
        (end > now).then_some(end)
    }

    /// Feed a raw level sample taken at `now`.
    ///
    /// Returns the logical event to deliver, if this sample completes an
    /// accepted transition that maps to one in the configured mode.
    pub fn observe(&mut self, level_high: bool, now: Instant) -> Option<(InputEventKind, Edge)> {
        let pressed = self.polarity.is_pressed(level_high);
        if pressed == self.pressed {
            return None;
        }
        if self.deadline(now).is_some() {
            return None;
        }

        self.pressed = pressed;
        self.last_accepted = Some(now);

        let edge = if level_high {
            Edge::Rising
        } else {
            Edge::Falling
        };
        let kind = match (self.mode, pressed) {
            (InteractionMode::Toggle, true) => InputEventKind::Trigger,
            (InteractionMode::Toggle, false) => return None,
            (InteractionMode::PressRelease, true) => InputEventKind::Begin,
            (InteractionMode::PressRelease, false) => InputEventKind::End,
        };
        Some((kind, edge))
    }
}
