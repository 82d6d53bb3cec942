//! Output volume through ALSA's `amixer`.

use crate::{AppError, AppResult};

use std::{panic::Location, process::Command};

use error_location::ErrorLocation;
use tracing::{info, instrument};

/// Set `control` to `percent` with `amixer sset`.
#[track_caller]
#[instrument]
pub fn set_volume(control: &str, percent: u8) -> AppResult<()> {
    let output = Command::new("amixer")
        .args(["sset", control, &format!("{}%", percent)])
        .output()?;

    if !output.status.success() {
        return Err(AppError::RuntimeError {
            reason: format!(
                "amixer exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    info!(control, percent, "Output volume set");
    Ok(())
}
