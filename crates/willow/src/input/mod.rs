//! Button sources for the installation.

#[cfg(feature = "rpi")]
mod gpio;
mod keyboard;

#[cfg(feature = "rpi")]
pub(crate) use gpio::GpioPin;
pub(crate) use keyboard::KeyboardPin;

use crate::{
    AppResult,
    config::{Config, InputSource},
};

use willow_core::InputPin;

use std::time::Duration;

use tracing::info;

/// Open the input configured in `config`.
///
/// # Errors
///
/// Returns error if the GPIO pin cannot be claimed, or if GPIO was requested
/// from a build without the `rpi` feature.
#[track_caller]
pub(crate) fn open(config: &Config) -> AppResult<Box<dyn InputPin>> {
    let polarity = config.input.polarity.into();
    match config.input.source {
        InputSource::Keyboard => {
            let pulse = Duration::from_millis(config.input.debounce_ms.saturating_mul(2).max(50));
            info!("Using Enter on stdin as the button");
            Ok(Box::new(KeyboardPin::spawn(
                config.input.mode.into(),
                polarity,
                pulse,
            )?))
        }
        InputSource::Gpio => open_gpio(config.input.pin, polarity),
    }
}

#[cfg(feature = "rpi")]
#[track_caller]
fn open_gpio(pin: u8, polarity: willow_core::Polarity) -> AppResult<Box<dyn InputPin>> {
    Ok(Box::new(GpioPin::open(pin, polarity)?))
}

#[cfg(not(feature = "rpi"))]
#[track_caller]
fn open_gpio(pin: u8, _polarity: willow_core::Polarity) -> AppResult<Box<dyn InputPin>> {
    Err(crate::AppError::ConfigError {
        reason: format!(
            "GPIO pin {} requested but this build has no GPIO support; rebuild with --features rpi or pass --keyboard",
            pin
        ),
        location: error_location::ErrorLocation::from(std::panic::Location::caller()),
    })
}
