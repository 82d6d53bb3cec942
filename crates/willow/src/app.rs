use crate::{AppError, AppResult, cli::Command, config::Config, input, volume};

use willow_core::{
    AudioGate, CancelToken, Coordinator, CoreResult, CpalBackend, DeviceDirection,
    InstallationConfig, InteractionMode, PlaybackOutcome, Player, RecorderConfig,
    RecordingManager, Secret, SecretsStore, SessionOutcome,
};

use std::{panic::Location, sync::Arc, time::Duration};

use error_location::ErrorLocation;
use tokio::task::spawn_blocking;
use tracing::{error, info, instrument, warn};

/// Extra time allowed beyond the grace period for the blocking shutdown task.
const SHUTDOWN_SLACK: Duration = Duration::from_secs(5);

/// Slack on top of a one-off recording's length before giving up on it.
const RECORD_SLACK: Duration = Duration::from_secs(10);

/// The willow process: one configuration, several ways to run it.
pub struct App {
    pub(crate) config: Config,
    pub(crate) installation: InstallationConfig,
}

impl App {
    /// Validate `config` up front so every command starts from good values.
    #[track_caller]
    pub fn new(config: Config) -> AppResult<Self> {
        let installation = config.to_installation()?;
        Ok(Self {
            config,
            installation,
        })
    }

    fn backend(&self) -> CpalBackend {
        CpalBackend::new(
            self.config.audio.input_device.clone(),
            self.config.audio.output_device.clone(),
        )
    }

    /// Dispatch a subcommand.
    pub async fn execute(self, command: Command) -> AppResult<()> {
        match command {
            Command::Run => self.run().await,
            Command::Devices => self.devices().await,
            Command::Secrets => self.secrets().await,
            Command::Record { seconds } => self.record(seconds).await,
            Command::Play => self.play().await,
        }
    }

    /// Run the installation until SIGINT or SIGTERM.
    #[instrument(skip(self))]
    pub async fn run(self) -> AppResult<()> {
        info!(
            secrets_dir = ?self.installation.secrets_dir,
            mode = ?self.installation.recorder.mode,
            "Whispering Willow starting"
        );

        if let Some(percent) = self.config.audio.volume_percent {
            let control = self.config.audio.mixer_control.clone();
            if let Err(e) = spawn_blocking(move || volume::set_volume(&control, percent)).await? {
                warn!(error = ?e, "Failed to set output volume, continuing");
            }
        }

        let backend = self.backend();
        {
            let backend = backend.clone();
            spawn_blocking(move || backend.probe()).await??;
        }

        let pin = input::open(&self.config)?;
        let installation = self.installation.clone();
        let grace = installation.shutdown_grace;
        let coordinator =
            spawn_blocking(move || Coordinator::start(installation, Arc::new(backend), pin))
                .await??;

        info!(polling = coordinator.is_polling(), "Whispering Willow running");

        shutdown_signal().await?;
        info!("Shutdown requested");

        let shutdown = spawn_blocking(move || coordinator.shutdown());
        match tokio::time::timeout(grace + SHUTDOWN_SLACK, shutdown).await {
            Ok(Ok(report)) => {
                info!(
                    clean = report.is_clean(),
                    recorder_finalized = report.recorder_finalized,
                    playback_stopped = report.playback_stopped,
                    played = report.playback.completed,
                    "Whispering Willow shut down"
                );
            }
            Ok(Err(e)) => error!(error = ?e, "Shutdown task panicked"),
            Err(_) => warn!("Shutdown did not finish within timeout, exiting anyway"),
        }

        Ok(())
    }

    /// Print every audio device.
    #[instrument(skip(self))]
    pub async fn devices(self) -> AppResult<()> {
        let devices = spawn_blocking(CpalBackend::list_devices).await??;

        if devices.is_empty() {
            println!("No audio devices found");
            return Ok(());
        }

        for device in devices {
            let direction = match device.direction {
                DeviceDirection::Input => "input ",
                DeviceDirection::Output => "output",
            };
            let format = match (device.sample_rate, device.channels) {
                (Some(rate), Some(channels)) => format!("{} Hz, {} ch", rate, channels),
                _ => "no default config".to_string(),
            };
            let marker = if device.is_default { " (default)" } else { "" };
            println!("{}  {}{}  [{}]", direction, device.name, marker, format);
        }

        Ok(())
    }

    /// Print every stored secret with its metadata.
    #[instrument(skip(self))]
    pub async fn secrets(self) -> AppResult<()> {
        let store = SecretsStore::new(&self.installation.secrets_dir);
        let secrets = spawn_blocking(move || -> CoreResult<Vec<Secret>> {
            let mut ids = store.list()?;
            ids.sort();
            ids.into_iter()
                .map(|id| store.inspect(&id))
                .collect()
        })
        .await??;

        println!("Found {} secrets:", secrets.len());
        for secret in secrets {
            println!(
                "  {}  {:>7.2}s  {} Hz  {} ch  {}-bit  {} bytes",
                secret.id,
                secret.duration.as_secs_f64(),
                secret.sample_rate,
                secret.channels,
                secret.bits_per_sample,
                secret.bytes,
            );
        }

        Ok(())
    }

    /// Make one recording of `seconds` (or the configured fixed duration).
    #[instrument(skip(self))]
    pub async fn record(self, seconds: Option<f64>) -> AppResult<()> {
        let mut recorder = self.installation.recorder.clone();
        if let Some(seconds) = seconds {
            recorder.fixed_duration = Duration::try_from_secs_f64(seconds).map_err(|e| {
                AppError::ConfigError {
                    reason: format!("--seconds must be a non-negative number (got {}): {}", seconds, e),
                    location: ErrorLocation::from(Location::caller()),
                }
            })?;
        }
        let config = RecorderConfig {
            mode: InteractionMode::Toggle,
            max_duration: recorder.max_duration.max(recorder.fixed_duration),
            ..recorder
        };
        let timeout = config.fixed_duration + RECORD_SLACK;

        let backend = Arc::new(self.backend());
        let store = SecretsStore::new(&self.installation.secrets_dir);
        let gate = Arc::new(AudioGate::new(self.installation.duplex));

        let outcome = spawn_blocking(move || -> AppResult<Option<SessionOutcome>> {
            let manager = RecordingManager::new(backend, store, gate, config)?;
            if !manager.trigger_or_begin().is_started() {
                return Ok(None);
            }
            info!("Recording...");
            if !manager.wait_idle(timeout) {
                warn!(?timeout, "Recording still busy, shutting it down");
            }
            let outcome = manager.last_outcome();
            manager.shutdown(Duration::from_secs(1));
            Ok(outcome)
        })
        .await??;

        match outcome {
            Some(SessionOutcome::Published { secret, .. }) => {
                println!(
                    "Saved {} ({:.2}s) to {:?}",
                    secret.id,
                    secret.duration.as_secs_f64(),
                    secret.path
                );
                Ok(())
            }
            Some(SessionOutcome::Discarded { reason, .. }) => Err(AppError::RuntimeError {
                reason: format!("Recording discarded: {:?}", reason),
                location: ErrorLocation::from(Location::caller()),
            }),
            None => Err(AppError::RuntimeError {
                reason: "Recording did not start".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    /// Play one random secret, stopping early on Ctrl+C.
    #[instrument(skip(self))]
    pub async fn play(self) -> AppResult<()> {
        let player = Player::new(
            Arc::new(self.backend()),
            SecretsStore::new(&self.installation.secrets_dir),
            Arc::new(AudioGate::new(self.installation.duplex)),
            self.installation.playback.clone(),
        );
        let cancel = CancelToken::new();

        let playing = {
            let cancel = cancel.clone();
            spawn_blocking(move || player.play_one(&cancel))
        };
        tokio::pin!(playing);

        let outcome = tokio::select! {
            result = &mut playing => result??,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping playback");
                cancel.cancel();
                playing.await??
            }
        };

        match outcome {
            PlaybackOutcome::Completed { id } => println!("Played {}", id),
            PlaybackOutcome::Interrupted { id, .. } => println!("Stopped {}", id),
        }
        Ok(())
    }
}

/// Resolve on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() -> AppResult<()> {
    let location = ErrorLocation::from(Location::caller());
    let signal_error = |e: std::io::Error| AppError::RuntimeError {
        reason: format!("Failed to listen for shutdown signal: {}", e),
        location: location.clone(),
    };

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate()).map_err(signal_error)?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map_err(signal_error)?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await.map_err(signal_error)?;

    Ok(())
}
