use std::path::PathBuf;
use std::str::FromStr;

use gym_engine::{BonusSource, EstimateMode};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Help,
    Estimate(EstimateArgs),
    Settings(SettingsCommand),
    Watch(WatchArgs),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EstimateArgs {
    pub tier: u32,
    pub percent: f64,
    pub mode: EstimateMode,
    pub spent: u64,
    pub bonus: bool,
    pub multiplier: Option<f64>,
    pub daily_energy: Option<f64>,
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SettingsCommand {
    Show,
    SetKey(String),
    ClearKey,
    Bonus(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WatchArgs {
    pub page: PathBuf,
    pub mode: EstimateMode,
    pub bonus_source: BonusSource,
    pub fetch: bool,
    pub poll_ms: Option<u64>,
    pub max_ticks: Option<u64>,
}

pub(crate) fn parse_args(args: &[String]) -> Result<Command, String> {
    let Some(command) = args.first() else {
        return Err(usage_text());
    };
    let command_args = &args[1..];

    match command.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help),
        "estimate" => parse_estimate(command_args).map(Command::Estimate),
        "settings" => parse_settings(command_args).map(Command::Settings),
        "watch" => parse_watch(command_args).map(Command::Watch),
        other => Err(format!("unknown subcommand '{other}'")),
    }
}

fn parse_estimate(args: &[String]) -> Result<EstimateArgs, String> {
    let mut positional = Vec::new();
    let mut parsed = EstimateArgs {
        tier: 0,
        percent: 0.0,
        mode: EstimateMode::Point,
        spent: 0,
        bonus: false,
        multiplier: None,
        daily_energy: None,
        json: false,
    };

    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--range" => {
                parsed.mode = EstimateMode::Range;
                index += 1;
            }
            "--bonus" => {
                parsed.bonus = true;
                index += 1;
            }
            "--json" => {
                parsed.json = true;
                index += 1;
            }
            "--spent" => {
                parsed.spent = parse_flag_value(args, index, "--spent", "u64")?;
                index += 2;
            }
            "--multiplier" => {
                let multiplier: f64 = parse_flag_value(args, index, "--multiplier", "f64")?;
                if !multiplier.is_finite() || multiplier < 1.0 {
                    return Err(format!(
                        "invalid --multiplier value '{multiplier}' (expected >= 1.0)"
                    ));
                }
                parsed.multiplier = Some(multiplier);
                index += 2;
            }
            "--daily" => {
                let daily: f64 = parse_flag_value(args, index, "--daily", "f64")?;
                if !daily.is_finite() || daily <= 0.0 {
                    return Err(format!("invalid --daily value '{daily}' (expected > 0)"));
                }
                parsed.daily_energy = Some(daily);
                index += 2;
            }
            flag if flag.starts_with("--") => {
                return Err(format!("unknown estimate argument '{flag}'"));
            }
            value => {
                positional.push(value);
                index += 1;
            }
        }
    }

    let [tier, percent] = positional.as_slice() else {
        return Err("estimate requires <tier> <percent>".to_string());
    };
    parsed.tier = tier
        .parse::<u32>()
        .map_err(|_| format!("invalid tier '{tier}' (expected u32)"))?;
    parsed.percent = percent
        .trim_end_matches('%')
        .parse::<f64>()
        .map_err(|_| format!("invalid percent '{percent}' (expected a number)"))?;
    Ok(parsed)
}

fn parse_settings(args: &[String]) -> Result<SettingsCommand, String> {
    let action = args.first().map(String::as_str).unwrap_or("show");
    let rest = args.get(1..).unwrap_or_default();

    match (action, rest) {
        ("show", []) => Ok(SettingsCommand::Show),
        ("set-key", [key]) => Ok(SettingsCommand::SetKey(key.clone())),
        ("set-key", _) => Err("settings set-key requires exactly one key".to_string()),
        ("clear-key", []) => Ok(SettingsCommand::ClearKey),
        ("bonus", [state]) => match state.as_str() {
            "on" => Ok(SettingsCommand::Bonus(true)),
            "off" => Ok(SettingsCommand::Bonus(false)),
            other => Err(format!("invalid bonus state '{other}' (expected on|off)")),
        },
        ("bonus", _) => Err("settings bonus requires on|off".to_string()),
        ("show" | "clear-key", _) => Err(format!("settings {action} takes no arguments")),
        (other, _) => Err(format!("unknown settings action '{other}'")),
    }
}

fn parse_watch(args: &[String]) -> Result<WatchArgs, String> {
    let mut page = None;
    let mut parsed = WatchArgs {
        page: PathBuf::new(),
        mode: EstimateMode::Point,
        bonus_source: BonusSource::Api,
        fetch: true,
        poll_ms: None,
        max_ticks: None,
    };

    let mut index = 0usize;
    while index < args.len() {
        match args[index].as_str() {
            "--range" => {
                parsed.mode = EstimateMode::Range;
                index += 1;
            }
            "--manual-bonus" => {
                parsed.bonus_source = BonusSource::Manual;
                index += 1;
            }
            "--no-fetch" => {
                parsed.fetch = false;
                index += 1;
            }
            "--poll-ms" => {
                let poll_ms: u64 = parse_flag_value(args, index, "--poll-ms", "u64")?;
                if poll_ms == 0 {
                    return Err("invalid --poll-ms value '0' (expected > 0)".to_string());
                }
                parsed.poll_ms = Some(poll_ms);
                index += 2;
            }
            "--max-ticks" => {
                parsed.max_ticks = Some(parse_flag_value(args, index, "--max-ticks", "u64")?);
                index += 2;
            }
            flag if flag.starts_with("--") => {
                return Err(format!("unknown watch argument '{flag}'"));
            }
            value => {
                if page.is_some() {
                    return Err(format!("unexpected watch argument '{value}'"));
                }
                page = Some(PathBuf::from(value));
                index += 1;
            }
        }
    }

    parsed.page = page.ok_or_else(|| "watch requires a page snapshot path".to_string())?;
    Ok(parsed)
}

fn parse_flag_value<T: FromStr>(
    args: &[String],
    index: usize,
    flag: &str,
    expected: &str,
) -> Result<T, String> {
    let value = args
        .get(index + 1)
        .ok_or_else(|| format!("missing value for {flag}"))?;
    value
        .parse::<T>()
        .map_err(|_| format!("invalid {flag} value '{value}' (expected {expected})"))
}

pub(crate) fn usage_text() -> String {
    [
        "gym_widget - gym energy estimator",
        "",
        "Usage:",
        "  gym_widget estimate <tier> <percent> [--range] [--spent <u64>] [--bonus] [--multiplier <f64>] [--daily <f64>] [--json]",
        "  gym_widget settings [show | set-key <key> | clear-key | bonus on|off]",
        "  gym_widget watch <page.json> [--range] [--manual-bonus] [--no-fetch] [--poll-ms <u64>] [--max-ticks <u64>]",
        "",
        "Environment:",
        "  GYM_ENERGY_ROOT      settings directory",
        "  GYM_WIDGET_POLL_MS   watch poll interval (default 500)",
        "  GYM_ENERGY_API_BASE  account API base url",
        "  RUST_LOG             log filter (default info)",
    ]
    .join("\n")
}
