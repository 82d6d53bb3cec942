use crate::{AppError, AppResult};

use willow_core::{CoreResult, EdgeCallback, InputPin, Polarity, WillowError};

use std::panic::Location;

use error_location::ErrorLocation;
use rppal::gpio::{Event, Gpio, InputPin as RppalInputPin, Trigger};
use tracing::{info, instrument, warn};

/// A Raspberry Pi GPIO input with the pull resistor matching its polarity.
pub(crate) struct GpioPin {
    pin: RppalInputPin,
}

impl GpioPin {
    /// Claim BCM pin `bcm`.
    ///
    /// Active-high buttons get the internal pull-down, active-low buttons
    /// the pull-up.
    #[track_caller]
    #[instrument]
    pub(crate) fn open(bcm: u8, polarity: Polarity) -> AppResult<Self> {
        let gpio = Gpio::new().map_err(|e| AppError::ConfigError {
            reason: format!("Failed to open GPIO: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;
        let pin = gpio.get(bcm).map_err(|e| AppError::ConfigError {
            reason: format!("Failed to claim GPIO pin {}: {}", bcm, e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let pin = match polarity {
            Polarity::ActiveHigh => pin.into_input_pulldown(),
            Polarity::ActiveLow => pin.into_input_pullup(),
        };

        info!(pin = bcm, ?polarity, "GPIO input ready");
        Ok(Self { pin })
    }
}

impl InputPin for GpioPin {
    fn read_level(&mut self) -> CoreResult<bool> {
        Ok(self.pin.is_high())
    }

    #[track_caller]
    fn watch_edges(&mut self, mut on_change: EdgeCallback) -> CoreResult<()> {
        self.pin
            .set_async_interrupt(Trigger::Both, None, move |event: Event| {
                on_change(event.trigger == Trigger::RisingEdge);
            })
            .map_err(|e| WillowError::EdgeWatchUnsupported {
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn unwatch(&mut self) {
        if let Err(e) = self.pin.clear_async_interrupt() {
            warn!(error = %e, "Failed to clear GPIO interrupt");
        }
    }
}
