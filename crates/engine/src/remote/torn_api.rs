use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::calc::{ModifierOrigin, Modifiers, MUSIC_STORE_MULTIPLIER, NEUTRAL_MULTIPLIER};

pub const DEFAULT_API_BASE: &str = "https://api.torn.com";
pub const API_BASE_ENV_VAR: &str = "GYM_ENERGY_API_BASE";
const USER_SELECTIONS: &str = "perks,profile,bars";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const FETCH_THREAD_NAME: &str = "modifier-fetch";

const MINUTES_PER_DAY: f64 = 24.0 * 60.0;
const ENERGY_PER_REGEN_TICK: f64 = 5.0;
const DONATOR_REGEN_MINUTES: f64 = 10.0;
const STANDARD_REGEN_MINUTES: f64 = 15.0;
/// One energy refill per day.
const DAILY_REFILL_ENERGY: f64 = 750.0;
const DEFAULT_MAX_ENERGY: u32 = 150;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no usable api key configured")]
    MissingKey,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("api returned http status {0}")]
    Status(u16),
    #[error("failed to decode api response at {path}: {message}")]
    Decode { path: String, message: String },
    #[error("api error {code:?}: {message}")]
    Api { code: Option<i64>, message: String },
    #[error("failed to spawn fetch thread: {0}")]
    Spawn(#[source] io::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    pub error: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EnergyBar {
    pub maximum: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserStatsResponse {
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
    #[serde(default)]
    pub job_perks: Vec<String>,
    #[serde(default)]
    pub energy: Option<EnergyBar>,
    #[serde(default)]
    pub donator: Option<u8>,
}

impl UserStatsResponse {
    pub fn has_music_store_perk(&self) -> bool {
        self.job_perks.iter().any(|perk| is_gym_gain_perk(perk))
    }

    pub fn is_donator(&self) -> bool {
        self.donator == Some(1)
    }

    pub fn max_energy(&self) -> u32 {
        self.energy.map_or(DEFAULT_MAX_ENERGY, |bar| bar.maximum)
    }
}

fn is_gym_gain_perk(perk: &str) -> bool {
    let lower = perk.to_lowercase();
    lower.contains("gym") && (lower.contains("gain") || lower.contains("music"))
}

/// Natural regen over a day, plus one refill and one full bar.
pub fn daily_energy_estimate(is_donator: bool, max_energy: u32) -> f64 {
    let regen_minutes = if is_donator {
        DONATOR_REGEN_MINUTES
    } else {
        STANDARD_REGEN_MINUTES
    };
    (MINUTES_PER_DAY / regen_minutes) * ENERGY_PER_REGEN_TICK
        + DAILY_REFILL_ENERGY
        + f64::from(max_energy)
}

pub fn decode_response(body: &str) -> Result<UserStatsResponse, FetchError> {
    let deserializer = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(deserializer).map_err(|error| FetchError::Decode {
        path: error.path().to_string(),
        message: error.inner().to_string(),
    })
}

pub fn modifiers_from_response(response: &UserStatsResponse) -> Result<Modifiers, FetchError> {
    if let Some(error) = &response.error {
        return Err(FetchError::Api {
            code: error.code,
            message: error.error.clone(),
        });
    }

    let bonus_active = response.has_music_store_perk();
    Ok(Modifiers {
        bonus_multiplier: if bonus_active {
            MUSIC_STORE_MULTIPLIER
        } else {
            NEUTRAL_MULTIPLIER
        },
        daily_energy: daily_energy_estimate(response.is_donator(), response.max_energy()),
        bonus_active,
        origin: ModifierOrigin::Api,
    })
}

/// Anything that can turn an api key into account modifiers.
pub trait ModifierProvider {
    fn fetch_modifiers(&self, api_key: &str) -> Result<Modifiers, FetchError>;
}

#[derive(Debug, Clone)]
pub struct TornApiClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl TornApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("gym_energy/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_env() -> Result<Self, FetchError> {
        let base = std::env::var(API_BASE_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self::new(base)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ModifierProvider for TornApiClient {
    fn fetch_modifiers(&self, api_key: &str) -> Result<Modifiers, FetchError> {
        if api_key.is_empty() {
            return Err(FetchError::MissingKey);
        }

        let response = self
            .http
            .get(format!("{}/user/", self.base_url))
            .query(&[("selections", USER_SELECTIONS), ("key", api_key)])
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text()?;
        debug!(bytes = body.len(), "modifier_response_received");
        let modifiers = modifiers_from_response(&decode_response(&body)?)?;
        info!(
            bonus_active = modifiers.bonus_active,
            daily_energy = modifiers.daily_energy,
            "modifiers_fetched"
        );
        Ok(modifiers)
    }
}

/// Runs one fetch on a named thread and hands the result to `on_done`.
/// There is no retry.
pub fn spawn_modifier_fetch<P, F>(
    provider: P,
    api_key: String,
    on_done: F,
) -> Result<JoinHandle<()>, FetchError>
where
    P: ModifierProvider + Send + 'static,
    F: FnOnce(Result<Modifiers, FetchError>) + Send + 'static,
{
    thread::Builder::new()
        .name(FETCH_THREAD_NAME.to_string())
        .spawn(move || on_done(provider.fetch_modifiers(&api_key)))
        .map_err(FetchError::Spawn)
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn music_store_perk_sets_bonus() {
        let response = decode_response(
            r#"{"job_perks": ["+ 30% gym experience gain", "Free coffee"], "energy": {"maximum": 150}, "donator": 0}"#,
        )
        .expect("decode");
        let modifiers = modifiers_from_response(&response).expect("modifiers");

        assert!(modifiers.bonus_active);
        assert_eq!(modifiers.bonus_multiplier, MUSIC_STORE_MULTIPLIER);
        assert_eq!(modifiers.origin, ModifierOrigin::Api);
        assert_eq!(modifiers.daily_energy, 480.0 + 750.0 + 150.0);
    }

    #[test]
    fn perk_match_is_case_insensitive_and_needs_gym() {
        assert!(is_gym_gain_perk("Gym MUSIC boost"));
        assert!(!is_gym_gain_perk("+10% music store sales"));
        assert!(!is_gym_gain_perk("Gym membership discount"));
    }

    #[test]
    fn donator_regenerates_faster() {
        assert_eq!(daily_energy_estimate(true, 150), 720.0 + 750.0 + 150.0);
        assert_eq!(daily_energy_estimate(false, 100), 480.0 + 750.0 + 100.0);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let response = decode_response("{}").expect("decode");
        let modifiers = modifiers_from_response(&response).expect("modifiers");

        assert!(!modifiers.bonus_active);
        assert_eq!(modifiers.bonus_multiplier, NEUTRAL_MULTIPLIER);
        assert_eq!(modifiers.daily_energy, 480.0 + 750.0 + 150.0);
    }

    #[test]
    fn api_error_is_reported() {
        let response =
            decode_response(r#"{"error": {"code": 2, "error": "Incorrect key"}}"#).expect("decode");
        match modifiers_from_response(&response) {
            Err(FetchError::Api { code, message }) => {
                assert_eq!(code, Some(2));
                assert_eq!(message, "Incorrect key");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_body_reports_path() {
        match decode_response(r#"{"energy": {"maximum": "lots"}}"#) {
            Err(FetchError::Decode { path, .. }) => assert_eq!(path, "energy.maximum"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    struct CannedProvider(Result<Modifiers, ()>);

    impl ModifierProvider for CannedProvider {
        fn fetch_modifiers(&self, _api_key: &str) -> Result<Modifiers, FetchError> {
            self.0.map_err(|_| FetchError::Status(503))
        }
    }

    #[test]
    fn spawned_fetch_delivers_result() {
        let expected = Modifiers::manual(true);
        let (sender, receiver) = mpsc::channel();
        let handle = spawn_modifier_fetch(
            CannedProvider(Ok(expected)),
            "abcdEFGH12345678".to_string(),
            move |result| {
                let _ = sender.send(result);
            },
        )
        .expect("spawn");
        handle.join().expect("join");

        let result = receiver.recv().expect("result");
        assert_eq!(result.expect("modifiers"), expected);
    }

    #[test]
    fn spawned_fetch_delivers_failure() {
        let (sender, receiver) = mpsc::channel();
        spawn_modifier_fetch(CannedProvider(Err(())), String::new(), move |result| {
            let _ = sender.send(result);
        })
        .expect("spawn")
        .join()
        .expect("join");

        assert!(matches!(
            receiver.recv().expect("result"),
            Err(FetchError::Status(503))
        ));
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = TornApiClient::new("http://localhost:9/").expect("client");
        assert_eq!(client.base_url(), "http://localhost:9");
        assert!(matches!(
            client.fetch_modifiers(""),
            Err(FetchError::MissingKey)
        ));
    }
}
