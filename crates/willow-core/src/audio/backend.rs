use crate::{
    CoreResult, WillowError,
    audio::{AudioBackend, AudioFormat, CaptureStream, CpalCapture, CpalRender, RenderStream},
};

use std::panic::Location;

use cpal::{
    Device, Host,
    traits::{DeviceTrait, HostTrait},
};
use error_location::ErrorLocation;
use tracing::{debug, info, instrument, warn};

/// Direction of an audio device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceDirection {
    /// Microphone side.
    Input,
    /// Speaker side.
    Output,
}

/// One enumerated audio device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Host-reported device name.
    pub name: String,
    /// Input or output.
    pub direction: DeviceDirection,
    /// Default sample rate, if the device reports one.
    pub sample_rate: Option<u32>,
    /// Default channel count, if the device reports one.
    pub channels: Option<u16>,
    /// Whether this is the host default for its direction.
    pub is_default: bool,
}

/// cpal-backed device access.
///
/// Holds only device preferences; the host and device are looked up each
/// time a stream is opened so nothing stays open between sessions.
#[derive(Debug, Clone, Default)]
pub struct CpalBackend {
    input_device: Option<String>,
    output_device: Option<String>,
}

impl CpalBackend {
    /// Prefer devices whose names contain the given substrings.
    pub fn new(input_device: Option<String>, output_device: Option<String>) -> Self {
        Self {
            input_device,
            output_device,
        }
    }

    /// Confirm both an input and an output device are reachable.
    ///
    /// # Errors
    ///
    /// Returns [`WillowError::NoInputDevice`] or [`WillowError::NoOutputDevice`]
    /// when the installation has nothing to record from or play to.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn probe(&self) -> CoreResult<()> {
        let host = cpal::default_host();
        let input = self.input(&host)?;
        let output = self.output(&host)?;
        info!(
            input = %device_name(&input),
            output = %device_name(&output),
            "Audio devices available"
        );
        Ok(())
    }

    /// Enumerate every input and output device on the default host.
    #[track_caller]
    #[instrument]
    pub fn list_devices() -> CoreResult<Vec<DeviceInfo>> {
        let host = cpal::default_host();
        let default_in = host.default_input_device().map(|d| device_name(&d));
        let default_out = host.default_output_device().map(|d| device_name(&d));

        let mut devices = Vec::new();

        let inputs = host.input_devices().map_err(|e| WillowError::DeviceError {
            reason: format!("Failed to enumerate input devices: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;
        for device in inputs {
            let name = device_name(&device);
            let config = device.default_input_config().ok();
            devices.push(DeviceInfo {
                is_default: default_in.as_deref() == Some(name.as_str()),
                name,
                direction: DeviceDirection::Input,
                sample_rate: config.as_ref().map(|c| c.sample_rate()),
                channels: config.as_ref().map(|c| c.channels()),
            });
        }

        let outputs = host.output_devices().map_err(|e| WillowError::DeviceError {
            reason: format!("Failed to enumerate output devices: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;
        for device in outputs {
            let name = device_name(&device);
            let config = device.default_output_config().ok();
            devices.push(DeviceInfo {
                is_default: default_out.as_deref() == Some(name.as_str()),
                name,
                direction: DeviceDirection::Output,
                sample_rate: config.as_ref().map(|c| c.sample_rate()),
                channels: config.as_ref().map(|c| c.channels()),
            });
        }

        debug!(count = devices.len(), "Audio devices enumerated");
        Ok(devices)
    }

    #[track_caller]
    fn input(&self, host: &Host) -> CoreResult<Device> {
        if let Some(wanted) = &self.input_device {
            if let Some(device) = host
                .input_devices()
                .ok()
                .and_then(|mut devices| devices.find(|d| name_matches(d, wanted)))
            {
                return Ok(device);
            }
            warn!(wanted = %wanted, "Preferred input device not found, using default");
        }
        host.default_input_device()
            .ok_or(WillowError::NoInputDevice {
                location: ErrorLocation::from(Location::caller()),
            })
    }

    #[track_caller]
    fn output(&self, host: &Host) -> CoreResult<Device> {
        if let Some(wanted) = &self.output_device {
            if let Some(device) = host
                .output_devices()
                .ok()
                .and_then(|mut devices| devices.find(|d| name_matches(d, wanted)))
            {
                return Ok(device);
            }
            warn!(wanted = %wanted, "Preferred output device not found, using default");
        }
        host.default_output_device()
            .ok_or(WillowError::NoOutputDevice {
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

impl AudioBackend for CpalBackend {
    fn open_capture(&self, format: &AudioFormat) -> CoreResult<Box<dyn CaptureStream>> {
        let host = cpal::default_host();
        let device = self.input(&host)?;
        Ok(Box::new(CpalCapture::open(&device, format)?))
    }

    fn open_render(&self, format: &AudioFormat) -> CoreResult<Box<dyn RenderStream>> {
        let host = cpal::default_host();
        let device = self.output(&host)?;
        Ok(Box::new(CpalRender::open(&device, format)?))
    }
}

#[allow(deprecated)]
fn device_name(device: &Device) -> String {
    device.name().unwrap_or_else(|_| "<unnamed>".to_string())
}

fn name_matches(device: &Device, wanted: &str) -> bool {
    device_name(device)
        .to_lowercase()
        .contains(&wanted.to_lowercase())
}
