use std::io::Write;

use gym_engine::app::DEFAULT_TIER_NAME;
use gym_engine::calc::MUSIC_STORE_MULTIPLIER;
use gym_engine::store::is_valid_api_key;
use gym_engine::{
    estimate, requirement, EstimateMode, Estimation, Modifiers, PanelView, Settings, SettingsFile,
};
use serde::Serialize;
use tracing::info;

use super::cli::{EstimateArgs, SettingsCommand};
use super::WidgetAppError;

#[derive(Debug, Serialize)]
struct EstimateReport {
    tier: u32,
    percent: f64,
    mode: EstimateMode,
    spent_offset: u64,
    modifiers: Modifiers,
    estimation: Estimation,
}

fn modifiers_for(args: &EstimateArgs) -> Modifiers {
    let bonus = args.bonus || args.multiplier.is_some();
    let mut modifiers = Modifiers::manual(bonus);
    if bonus {
        modifiers.bonus_multiplier = args.multiplier.unwrap_or(MUSIC_STORE_MULTIPLIER);
    }
    if let Some(daily_energy) = args.daily_energy {
        modifiers.daily_energy = daily_energy;
    }
    modifiers
}

pub(crate) fn run_estimate(args: &EstimateArgs, out: &mut dyn Write) -> Result<(), WidgetAppError> {
    let modifiers = modifiers_for(args);
    let estimation = estimate(
        requirement(args.tier),
        &modifiers,
        args.percent,
        args.mode,
        args.spent,
    );

    if args.json {
        let report = EstimateReport {
            tier: args.tier,
            percent: args.percent,
            mode: args.mode,
            spent_offset: args.spent,
            modifiers,
            estimation,
        };
        let text = serde_json::to_string_pretty(&report).map_err(WidgetAppError::Encode)?;
        writeln!(out, "{text}").map_err(WidgetAppError::Output)?;
        return Ok(());
    }

    let view = PanelView::for_estimation(DEFAULT_TIER_NAME, estimation, &modifiers, args.spent);
    writeln!(out, "{}", view.render()).map_err(WidgetAppError::Output)
}

pub(crate) fn run_settings(
    command: &SettingsCommand,
    file: &SettingsFile,
    out: &mut dyn Write,
) -> Result<(), WidgetAppError> {
    let mut settings = file.load();
    match command {
        SettingsCommand::Show => {
            return write_settings(&settings, file, out);
        }
        SettingsCommand::SetKey(key) => {
            let key = key.trim();
            if !is_valid_api_key(key) {
                return Err(WidgetAppError::Usage(
                    "api key must be 16 letters or digits".to_string(),
                ));
            }
            settings.api_key = key.to_string();
        }
        SettingsCommand::ClearKey => settings.api_key.clear(),
        SettingsCommand::Bonus(enabled) => settings.bonus_enabled = *enabled,
    }

    file.save(&settings)?;
    info!(path = %file.path().display(), "settings_saved");
    write_settings(&settings, file, out)
}

fn write_settings(
    settings: &Settings,
    file: &SettingsFile,
    out: &mut dyn Write,
) -> Result<(), WidgetAppError> {
    let key = match settings.credential() {
        Some(key) => mask_key(key),
        None if settings.api_key.trim().is_empty() => "(none)".to_string(),
        None => "(invalid)".to_string(),
    };
    let bonus = if settings.bonus_enabled { "on" } else { "off" };
    writeln!(out, "settings: {}", file.path().display())
        .and_then(|()| writeln!(out, "api key: {key}"))
        .and_then(|()| writeln!(out, "music store bonus: {bonus}"))
        .and_then(|()| writeln!(out, "key prompt shown: {}", settings.prompt_shown))
        .map_err(WidgetAppError::Output)
}

fn mask_key(key: &str) -> String {
    let visible = key.get(..4).unwrap_or_default();
    format!("{visible}{}", "*".repeat(key.len().saturating_sub(visible.len())))
}
