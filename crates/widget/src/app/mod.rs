mod bootstrap;
mod cli;
mod commands;
mod loop_runner;

use std::io;
use std::process::ExitCode;

use gym_engine::{FetchError, SettingsError, StartupError};
use thiserror::Error;
use tracing::{error, info};

use cli::Command;

#[derive(Debug, Error)]
pub(crate) enum WidgetAppError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to start observer thread: {0}")]
    Observer(#[source] io::Error),
    #[error("failed to encode estimate: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

pub(crate) fn run(args: &[String]) -> ExitCode {
    let command = match cli::parse_args(args) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(1);
        }
    };
    if command == Command::Help {
        println!("{}", cli::usage_text());
        return ExitCode::SUCCESS;
    }

    bootstrap::init_tracing();
    match execute(&command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(WidgetAppError::Usage(message)) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
        Err(err) => {
            error!(error = %err, "command_failed");
            ExitCode::FAILURE
        }
    }
}

fn execute(command: &Command) -> Result<(), WidgetAppError> {
    let mut stdout = io::stdout();
    match command {
        Command::Help => Ok(()),
        Command::Estimate(args) => commands::run_estimate(args, &mut stdout),
        Command::Settings(settings_command) => {
            let file = bootstrap::open_settings()?;
            commands::run_settings(settings_command, &file, &mut stdout)
        }
        Command::Watch(args) => {
            let file = bootstrap::open_settings()?;
            let totals = loop_runner::run_watch(args, &file, &mut stdout, &mut io::stderr())?;
            info!(ticks = totals.ticks, renders = totals.renders, "watch_finished");
            Ok(())
        }
    }
}
