use std::io::{self, Write};

use gym_engine::{resolve_app_paths, BonusSource, Settings, SettingsFile, KEY_PROMPT_TEXT};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::WidgetAppError;

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Panels own stdout.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

pub(crate) fn open_settings() -> Result<SettingsFile, WidgetAppError> {
    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        settings = %paths.settings_path.display(),
        "settings_root_resolved"
    );
    Ok(paths.settings_file())
}

/// Loads settings for a widget run. Without a usable key the prompt is shown
/// once per settings file; later runs only render it inside the panel.
pub(crate) fn load_run_settings(
    file: &SettingsFile,
    bonus_source: BonusSource,
    notice: &mut dyn Write,
) -> Settings {
    let mut settings = file.load();
    if bonus_source != BonusSource::Api
        || settings.credential().is_some()
        || settings.prompt_shown
    {
        return settings;
    }

    if let Err(error) = writeln!(notice, "{KEY_PROMPT_TEXT}") {
        warn!(error = %error, "key_prompt_write_failed");
    }
    settings.prompt_shown = true;
    match file.save(&settings) {
        Ok(()) => info!("key_prompt_recorded"),
        Err(error) => warn!(error = %error, "key_prompt_record_failed"),
    }
    settings
}
