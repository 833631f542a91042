mod engine;
mod modifiers;
mod offset;
mod tiers;

pub use engine::{adjusted_total, estimate, remaining, Estimate, EstimateMode, Estimation};
pub use modifiers::{
    ModifierOrigin, Modifiers, DEFAULT_DAILY_ENERGY, MUSIC_STORE_MULTIPLIER, NEUTRAL_MULTIPLIER,
};
pub use offset::{OffsetAccumulator, OffsetState, MAX_TRAINING_DELTA};
pub use tiers::{requirement, TierRequirement, TierTable, FIRST_TABULATED_TIER, GYM_ENERGIES};
