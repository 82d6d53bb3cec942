//! Enter on stdin as a stand-in for the button.

use crate::AppResult;

use willow_core::{CoreResult, EdgeCallback, InputPin, InteractionMode, Polarity};

use std::{
    io::{self, BufRead},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use tracing::{debug, info};

#[derive(Default)]
struct Shared {
    pressed: AtomicBool,
    callback: Mutex<Option<EdgeCallback>>,
}

/// Simulated button driven by lines on a reader.
///
/// In toggle mode every line is a short press. In press/release mode every
/// line flips the button between held and released.
pub(crate) struct KeyboardPin {
    shared: Arc<Shared>,
    polarity: Polarity,
}

impl KeyboardPin {
    /// Read lines from stdin on a background thread.
    #[track_caller]
    pub(crate) fn spawn(
        mode: InteractionMode,
        polarity: Polarity,
        pulse: Duration,
    ) -> AppResult<Self> {
        Self::from_reader(io::BufReader::new(io::stdin()), mode, polarity, pulse)
    }

    /// Read lines from `reader` on a background thread.
    #[track_caller]
    pub(crate) fn from_reader<R>(
        reader: R,
        mode: InteractionMode,
        polarity: Polarity,
        pulse: Duration,
    ) -> AppResult<Self>
    where
        R: BufRead + Send + 'static,
    {
        let shared = Arc::new(Shared::default());

        {
            let shared = Arc::clone(&shared);
            thread::Builder::new()
                .name("willow-keyboard".to_string())
                .spawn(move || read_lines(reader, &shared, mode, polarity, pulse))?;
        }

        match mode {
            InteractionMode::Toggle => info!("Press Enter to record"),
            InteractionMode::PressRelease => info!("Press Enter to start recording, Enter again to stop"),
        }

        Ok(Self { shared, polarity })
    }
}

fn level_for(pressed: bool, polarity: Polarity) -> bool {
    match polarity {
        Polarity::ActiveHigh => pressed,
        Polarity::ActiveLow => !pressed,
    }
}

fn set_pressed(shared: &Shared, pressed: bool, polarity: Polarity) {
    shared.pressed.store(pressed, Ordering::SeqCst);
    if let Some(callback) = shared
        .callback
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .as_mut()
    {
        callback(level_for(pressed, polarity));
    }
}

fn read_lines<R: BufRead>(
    reader: R,
    shared: &Shared,
    mode: InteractionMode,
    polarity: Polarity,
    pulse: Duration,
) {
    for line in reader.lines() {
        if line.is_err() {
            break;
        }
        match mode {
            InteractionMode::Toggle => {
                set_pressed(shared, true, polarity);
                thread::sleep(pulse);
                set_pressed(shared, false, polarity);
            }
            InteractionMode::PressRelease => {
                let pressed = !shared.pressed.load(Ordering::SeqCst);
                set_pressed(shared, pressed, polarity);
            }
        }
        debug!(pressed = shared.pressed.load(Ordering::SeqCst), "Keyboard button");
    }
    debug!("Keyboard input closed");
}

impl InputPin for KeyboardPin {
    fn read_level(&mut self) -> CoreResult<bool> {
        Ok(level_for(
            self.shared.pressed.load(Ordering::SeqCst),
            self.polarity,
        ))
    }

    fn watch_edges(&mut self, on_change: EdgeCallback) -> CoreResult<()> {
        *self
            .shared
            .callback
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(on_change);
        Ok(())
    }

    fn unwatch(&mut self) {
        self.shared
            .callback
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
    }
}
