/// Energy needed to leave each gym, starting with the second gym.
pub const GYM_ENERGIES: [u32; 23] = [
    200, 500, 1000, 2000, 2750, 3000, 3500, 4000, 6000, 7000, 8000, 11000, 12420, 18000, 18100,
    24140, 31260, 36610, 46640, 56520, 67775, 84535, 106305,
];

/// The first tier with a tabulated requirement. Tier 1 is free.
pub const FIRST_TABULATED_TIER: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierRequirement {
    Energy(u32),
    NotApplicable,
}

impl TierRequirement {
    pub fn energy(self) -> Option<u32> {
        match self {
            Self::Energy(value) => Some(value),
            Self::NotApplicable => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TierTable {
    entries: &'static [u32],
}

impl Default for TierTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TierTable {
    pub const fn builtin() -> Self {
        Self {
            entries: &GYM_ENERGIES,
        }
    }

    pub const fn from_static(entries: &'static [u32]) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last tier index that still has a tabulated requirement.
    pub fn last_tabulated_tier(&self) -> Option<u32> {
        if self.entries.is_empty() {
            return None;
        }
        Some(FIRST_TABULATED_TIER + self.entries.len() as u32 - 1)
    }

    pub fn requirement(&self, tier_index: u32) -> TierRequirement {
        if tier_index < FIRST_TABULATED_TIER {
            return TierRequirement::NotApplicable;
        }
        match self.entries.get((tier_index - FIRST_TABULATED_TIER) as usize) {
            Some(&energy) => TierRequirement::Energy(energy),
            None => TierRequirement::NotApplicable,
        }
    }
}

pub fn requirement(tier_index: u32) -> TierRequirement {
    TierTable::builtin().requirement(tier_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tutorial_tiers_are_not_applicable() {
        assert_eq!(requirement(0), TierRequirement::NotApplicable);
        assert_eq!(requirement(1), TierRequirement::NotApplicable);
    }

    #[test]
    fn tiers_past_table_are_not_applicable() {
        let table = TierTable::builtin();
        let past_end = FIRST_TABULATED_TIER + table.len() as u32;
        assert_eq!(table.requirement(past_end), TierRequirement::NotApplicable);
        assert_eq!(table.requirement(u32::MAX), TierRequirement::NotApplicable);
    }

    #[test]
    fn every_tabulated_tier_matches_table_entry() {
        let table = TierTable::builtin();
        for (offset, expected) in GYM_ENERGIES.iter().enumerate() {
            let tier = FIRST_TABULATED_TIER + offset as u32;
            assert_eq!(table.requirement(tier), TierRequirement::Energy(*expected));
        }
    }

    #[test]
    fn tier_twelve_needs_eight_thousand() {
        assert_eq!(requirement(12), TierRequirement::Energy(8000));
        assert_eq!(requirement(12).energy(), Some(8000));
    }

    #[test]
    fn last_tabulated_tier_is_twenty_four() {
        assert_eq!(TierTable::builtin().last_tabulated_tier(), Some(24));
        assert_eq!(requirement(24), TierRequirement::Energy(106305));
    }

    #[test]
    fn empty_table_rejects_everything() {
        static EMPTY: [u32; 0] = [];
        let table = TierTable::from_static(&EMPTY);
        assert!(table.is_empty());
        assert_eq!(table.last_tabulated_tier(), None);
        assert_eq!(table.requirement(2), TierRequirement::NotApplicable);
    }
}
