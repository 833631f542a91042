mod torn_api;

pub use torn_api::{
    daily_energy_estimate, decode_response, modifiers_from_response, spawn_modifier_fetch,
    ApiErrorBody, EnergyBar, FetchError, ModifierProvider, TornApiClient, UserStatsResponse,
    API_BASE_ENV_VAR, DEFAULT_API_BASE,
};
