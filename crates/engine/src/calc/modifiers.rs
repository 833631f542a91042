use serde::Serialize;

pub const NEUTRAL_MULTIPLIER: f64 = 1.0;
pub const MUSIC_STORE_MULTIPLIER: f64 = 1.3;
/// Conservative daily energy used until account data is known.
pub const DEFAULT_DAILY_ENERGY: f64 = 1470.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierOrigin {
    Defaults,
    Api,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Modifiers {
    pub bonus_multiplier: f64,
    pub daily_energy: f64,
    pub bonus_active: bool,
    pub origin: ModifierOrigin,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            bonus_multiplier: NEUTRAL_MULTIPLIER,
            daily_energy: DEFAULT_DAILY_ENERGY,
            bonus_active: false,
            origin: ModifierOrigin::Defaults,
        }
    }
}

impl Modifiers {
    /// Modifiers for the manual toggle variant: fixed bonus, default regen.
    pub fn manual(bonus_enabled: bool) -> Self {
        Self {
            bonus_multiplier: if bonus_enabled {
                MUSIC_STORE_MULTIPLIER
            } else {
                NEUTRAL_MULTIPLIER
            },
            daily_energy: DEFAULT_DAILY_ENERGY,
            bonus_active: bonus_enabled,
            origin: ModifierOrigin::Manual,
        }
    }

    pub(crate) fn effective_multiplier(&self) -> f64 {
        if self.bonus_multiplier.is_finite() && self.bonus_multiplier >= NEUTRAL_MULTIPLIER {
            self.bonus_multiplier
        } else {
            NEUTRAL_MULTIPLIER
        }
    }

    pub(crate) fn effective_daily_energy(&self) -> f64 {
        if self.daily_energy.is_finite() && self.daily_energy > 0.0 {
            self.daily_energy
        } else {
            DEFAULT_DAILY_ENERGY
        }
    }
}
