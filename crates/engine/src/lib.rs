use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod calc;
pub mod remote;
pub mod store;

pub use app::{
    format_days_left, format_thousands, resolve_poll_interval, run_widget,
    spawn_counter_observer, spawn_settings_observer, BonusSource, HostError, HostPage,
    ObserverHandle, PageSnapshot, PanelBody, PanelSink, PanelView, ProgressSample, RunConfig,
    RunTotals, SnapshotHostPage, Widget, WidgetConfig, WidgetEvent, WidgetMetricsSnapshot,
    DEFAULT_POLL_INTERVAL, KEY_PROMPT_TEXT, POLL_INTERVAL_ENV_VAR,
};
pub use calc::{
    adjusted_total, estimate, requirement, Estimate, EstimateMode, Estimation, ModifierOrigin,
    Modifiers, OffsetAccumulator, TierRequirement, TierTable,
};
pub use remote::{spawn_modifier_fetch, FetchError, ModifierProvider, TornApiClient};
pub use store::{Settings, SettingsError, SettingsFile, SettingsReadState};

pub const ROOT_ENV_VAR: &str = "GYM_ENERGY_ROOT";
const CONFIG_DIR_NAME: &str = "gym_energy";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub settings_path: PathBuf,
}

impl AppPaths {
    pub fn settings_file(&self) -> SettingsFile {
        SettingsFile::new(&self.settings_path)
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to create settings directory at {path}: {source}")]
    CreateRootDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(
        "Could not locate a settings directory.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"$HOME/.config/gym_energy\""
    )]
    RootNotFound { env_var: &'static str },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root(&|var| env::var(var))?;
    app_paths_in(root)
}

fn app_paths_in(root: PathBuf) -> Result<AppPaths, StartupError> {
    fs::create_dir_all(&root).map_err(|source| StartupError::CreateRootDir {
        path: root.clone(),
        source,
    })?;
    let root = normalize_path(&root);
    let settings_path = root.join(store::SETTINGS_FILE_NAME);
    Ok(AppPaths {
        root,
        settings_path,
    })
}

type EnvLookup<'a> = &'a dyn Fn(&'static str) -> Result<String, env::VarError>;

fn resolve_root(lookup: EnvLookup<'_>) -> Result<PathBuf, StartupError> {
    if let Some(explicit) = non_empty_var(lookup, ROOT_ENV_VAR)? {
        return Ok(PathBuf::from(explicit));
    }
    if let Some(config_home) = non_empty_var(lookup, "XDG_CONFIG_HOME")? {
        return Ok(PathBuf::from(config_home).join(CONFIG_DIR_NAME));
    }
    if let Some(home) = non_empty_var(lookup, "HOME")? {
        return Ok(PathBuf::from(home).join(".config").join(CONFIG_DIR_NAME));
    }
    Err(StartupError::RootNotFound {
        env_var: ROOT_ENV_VAR,
    })
}

fn non_empty_var(
    lookup: EnvLookup<'_>,
    var: &'static str,
) -> Result<Option<String>, StartupError> {
    match lookup(var) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(StartupError::EnvVar { var, source }),
    }
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
