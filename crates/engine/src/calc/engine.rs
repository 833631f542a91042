use serde::Serialize;

use super::modifiers::Modifiers;
use super::tiers::TierRequirement;

const FULL_PERCENT: f64 = 100.0;

/// How precisely the host reports progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateMode {
    /// The percentage is taken at face value.
    #[default]
    Point,
    /// The percentage is a truncation of a value in `[p, p + 1)`.
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub adjusted_total: u64,
    pub remaining_min: u64,
    pub remaining_max: u64,
    pub spent_min: u64,
    pub spent_max: u64,
    pub projected_days: f64,
}

impl Estimate {
    pub fn is_range(&self) -> bool {
        self.remaining_min != self.remaining_max
    }

    pub fn projected_days_ceil(&self) -> u64 {
        self.projected_days.max(0.0).ceil() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Estimation {
    Applicable(Estimate),
    NotApplicable,
}

impl Estimation {
    pub fn applicable(&self) -> Option<&Estimate> {
        match self {
            Self::Applicable(estimate) => Some(estimate),
            Self::NotApplicable => None,
        }
    }
}

/// Total cost to reach 100% once the bonus is applied. The bonus divides the
/// nominal cost so that 100% always equals `adjusted_total` spent.
pub fn adjusted_total(base_cost: u32, modifiers: &Modifiers) -> u64 {
    if !modifiers.bonus_active {
        return u64::from(base_cost);
    }
    let adjusted = (f64::from(base_cost) / modifiers.effective_multiplier()).round();
    adjusted.max(0.0) as u64
}

pub fn estimate(
    requirement: TierRequirement,
    modifiers: &Modifiers,
    percent: f64,
    mode: EstimateMode,
    spent_offset: u64,
) -> Estimation {
    let Some(base_cost) = requirement.energy() else {
        return Estimation::NotApplicable;
    };
    let total = adjusted_total(base_cost, modifiers);
    if total == 0 {
        return Estimation::NotApplicable;
    }

    let percent = clamp_percent(percent);
    let (raw_min, raw_max) = if percent >= FULL_PERCENT {
        (0, 0)
    } else {
        match mode {
            EstimateMode::Point => {
                let remaining = remaining_at(total, percent);
                (remaining, remaining)
            }
            EstimateMode::Range => (
                remaining_at(total, percent + 1.0),
                remaining_at(total, percent),
            ),
        }
    };

    let offset = i64::try_from(spent_offset).unwrap_or(i64::MAX);
    let remaining_min = clamp_non_negative(raw_min.saturating_sub(offset));
    let remaining_max = clamp_non_negative(raw_max.saturating_sub(offset));

    Estimation::Applicable(Estimate {
        adjusted_total: total,
        remaining_min,
        remaining_max,
        spent_min: total.saturating_sub(remaining_max),
        spent_max: total.saturating_sub(remaining_min),
        projected_days: remaining_max as f64 / modifiers.effective_daily_energy(),
    })
}

/// Point-mode remaining energy with no spent offset.
pub fn remaining(total: u64, percent: f64) -> u64 {
    let percent = clamp_percent(percent);
    if percent >= FULL_PERCENT {
        return 0;
    }
    clamp_non_negative(remaining_at(total, percent))
}

fn remaining_at(total: u64, percent: f64) -> i64 {
    (total as f64 * (FULL_PERCENT - percent) / FULL_PERCENT).round() as i64
}

fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, FULL_PERCENT)
}

fn clamp_non_negative(value: i64) -> u64 {
    value.max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::modifiers::{ModifierOrigin, MUSIC_STORE_MULTIPLIER};
    use crate::calc::tiers::requirement;

    fn music_store() -> Modifiers {
        Modifiers {
            bonus_multiplier: MUSIC_STORE_MULTIPLIER,
            bonus_active: true,
            origin: ModifierOrigin::Api,
            ..Modifiers::default()
        }
    }

    fn applicable(estimation: Estimation) -> Estimate {
        *estimation.applicable().expect("estimate should be applicable")
    }

    #[test]
    fn bonus_divides_base_cost() {
        assert_eq!(adjusted_total(2000, &music_store()), 1538);
        assert_eq!(adjusted_total(8000, &music_store()), 6154);
    }

    #[test]
    fn inactive_bonus_keeps_base_cost() {
        let modifiers = Modifiers {
            bonus_multiplier: MUSIC_STORE_MULTIPLIER,
            ..Modifiers::default()
        };
        assert_eq!(adjusted_total(2000, &modifiers), 2000);
    }

    #[test]
    fn tier_twelve_at_forty_five_percent_without_bonus() {
        let result = applicable(estimate(
            requirement(12),
            &Modifiers::default(),
            45.0,
            EstimateMode::Point,
            0,
        ));
        assert_eq!(result.adjusted_total, 8000);
        assert_eq!(result.remaining_min, 4400);
        assert_eq!(result.remaining_max, 4400);
        assert_eq!(result.spent_min, 3600);
        assert_eq!(result.spent_max, 3600);
        assert!(!result.is_range());
    }

    #[test]
    fn tier_twelve_at_forty_five_percent_with_bonus() {
        let result = applicable(estimate(
            requirement(12),
            &music_store(),
            45.0,
            EstimateMode::Point,
            0,
        ));
        assert_eq!(result.adjusted_total, 6154);
        assert_eq!(result.remaining_max, 3385);
    }

    #[test]
    fn range_mode_subtracts_spent_offset() {
        // Tier 9 costs 4000.
        let result = applicable(estimate(
            requirement(9),
            &Modifiers::default(),
            10.0,
            EstimateMode::Range,
            50,
        ));
        assert_eq!(result.adjusted_total, 4000);
        assert_eq!(result.remaining_max, 3550);
        assert_eq!(result.remaining_min, 3510);
        assert_eq!(result.spent_min, 450);
        assert_eq!(result.spent_max, 490);
        assert!(result.is_range());
    }

    #[test]
    fn tutorial_tier_is_not_applicable() {
        let result = estimate(
            requirement(1),
            &Modifiers::default(),
            45.0,
            EstimateMode::Point,
            0,
        );
        assert_eq!(result, Estimation::NotApplicable);
        assert!(result.applicable().is_none());
    }

    #[test]
    fn zero_total_is_not_applicable() {
        let result = estimate(
            TierRequirement::Energy(0),
            &Modifiers::default(),
            0.0,
            EstimateMode::Range,
            0,
        );
        assert_eq!(result, Estimation::NotApplicable);
    }

    #[test]
    fn endpoints_of_progress() {
        assert_eq!(remaining(8000, 0.0), 8000);
        assert_eq!(remaining(8000, 100.0), 0);

        for mode in [EstimateMode::Point, EstimateMode::Range] {
            let full = applicable(estimate(
                requirement(12),
                &Modifiers::default(),
                100.0,
                mode,
                0,
            ));
            assert_eq!(full.remaining_min, 0);
            assert_eq!(full.remaining_max, 0);
            assert_eq!(full.spent_max, 8000);
        }
    }

    #[test]
    fn remaining_is_non_increasing_in_percent() {
        for total in [200u64, 6154, 106305] {
            let mut previous = remaining(total, 0.0);
            let mut step = 0.0;
            while step <= 100.0 {
                let current = remaining(total, step);
                assert!(current <= previous, "total {total} at {step}%");
                previous = current;
                step += 0.5;
            }
        }
    }

    #[test]
    fn stale_offset_clamps_to_zero() {
        let result = applicable(estimate(
            requirement(2),
            &Modifiers::default(),
            90.0,
            EstimateMode::Range,
            5_000,
        ));
        assert_eq!(result.remaining_min, 0);
        assert_eq!(result.remaining_max, 0);
        assert_eq!(result.spent_min, 200);
        assert_eq!(result.spent_max, 200);
        assert_eq!(result.projected_days, 0.0);
    }

    #[test]
    fn range_upper_bound_at_ninety_nine_percent_clamps_min() {
        let result = applicable(estimate(
            TierRequirement::Energy(4000),
            &Modifiers::default(),
            99.0,
            EstimateMode::Range,
            0,
        ));
        assert_eq!(result.remaining_max, 40);
        assert_eq!(result.remaining_min, 0);
    }

    #[test]
    fn out_of_range_percent_is_clamped() {
        let below = applicable(estimate(
            requirement(12),
            &Modifiers::default(),
            -20.0,
            EstimateMode::Point,
            0,
        ));
        assert_eq!(below.remaining_max, 8000);

        let nan = applicable(estimate(
            requirement(12),
            &Modifiers::default(),
            f64::NAN,
            EstimateMode::Point,
            0,
        ));
        assert_eq!(nan.remaining_max, 8000);
    }

    #[test]
    fn projected_days_uses_daily_energy() {
        let modifiers = Modifiers {
            daily_energy: 1000.0,
            ..Modifiers::default()
        };
        let result = applicable(estimate(
            requirement(12),
            &modifiers,
            45.0,
            EstimateMode::Point,
            0,
        ));
        assert!((result.projected_days - 4.4).abs() < 1e-9);
        assert_eq!(result.projected_days_ceil(), 5);
    }
}
