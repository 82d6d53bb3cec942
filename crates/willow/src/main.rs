//! Whispering Willow: a button-triggered secret recorder with random playback.

mod app;
mod cli;
mod config;
mod error;
mod input;
mod logging;
mod volume;

pub(crate) use {
    app::App,
    error::{AppError, Result as AppResult},
};

use crate::{cli::Cli, config::Config};

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

/// Application entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {:?}", e);
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut config);

    // Flushes the log file on drop; held until main returns.
    let _log_guard = match logging::init(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:?}", e);
            return ExitCode::FAILURE;
        }
    };

    let app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            error!(error = ?e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("willow-runtime")
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = ?e, "Failed to create tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    let command = cli.command();
    match runtime.block_on(app.execute(command.clone())) {
        Ok(()) => {
            info!(?command, "Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = ?e, ?command, "Command failed");
            ExitCode::FAILURE
        }
    }
}
