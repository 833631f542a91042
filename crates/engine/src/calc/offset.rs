/// Largest single counter drop still attributed to training. Bigger drops are
/// resets or desyncs.
pub const MAX_TRAINING_DELTA: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetState {
    Idle,
    Accumulating,
}

/// Energy spent since the panel was mounted, inferred from counter drops.
#[derive(Debug, Clone, Default)]
pub struct OffsetAccumulator {
    spent_offset: u64,
    last_counter: Option<i64>,
}

impl OffsetAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> OffsetState {
        if self.spent_offset > 0 {
            OffsetState::Accumulating
        } else {
            OffsetState::Idle
        }
    }

    pub fn spent_offset(&self) -> u64 {
        self.spent_offset
    }

    pub fn last_counter(&self) -> Option<i64> {
        self.last_counter
    }

    /// Feeds one counter reading. Returns the qualifying drop, if any. An
    /// unreadable counter forgets the last reading, so the next one only
    /// seeds.
    pub fn observe(&mut self, counter: Option<i64>) -> Option<u64> {
        let previous = std::mem::replace(&mut self.last_counter, counter);
        let delta = previous?.checked_sub(counter?)?;
        self.apply_delta(delta)
    }

    /// Adds a drop directly. Increases and out-of-range drops are ignored.
    pub fn apply_delta(&mut self, delta: i64) -> Option<u64> {
        if delta <= 0 || delta > MAX_TRAINING_DELTA {
            return None;
        }
        let delta = delta as u64;
        self.spent_offset = self.spent_offset.saturating_add(delta);
        Some(delta)
    }

    pub fn reset(&mut self) {
        self.spent_offset = 0;
        self.last_counter = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::engine::{estimate, EstimateMode};
    use crate::calc::modifiers::Modifiers;
    use crate::calc::tiers::TierRequirement;

    #[test]
    fn starts_idle() {
        let accumulator = OffsetAccumulator::new();
        assert_eq!(accumulator.state(), OffsetState::Idle);
        assert_eq!(accumulator.spent_offset(), 0);
        assert_eq!(accumulator.last_counter(), None);
    }

    #[test]
    fn first_reading_only_seeds() {
        let mut accumulator = OffsetAccumulator::new();
        assert_eq!(accumulator.observe(Some(150)), None);
        assert_eq!(accumulator.last_counter(), Some(150));
        assert_eq!(accumulator.state(), OffsetState::Idle);
    }

    #[test]
    fn drops_accumulate() {
        let mut accumulator = OffsetAccumulator::new();
        accumulator.observe(Some(150));
        assert_eq!(accumulator.observe(Some(140)), Some(10));
        assert_eq!(accumulator.state(), OffsetState::Accumulating);
        assert_eq!(accumulator.observe(Some(115)), Some(25));
        assert_eq!(accumulator.spent_offset(), 35);
    }

    #[test]
    fn increases_never_reduce_offset() {
        let mut accumulator = OffsetAccumulator::new();
        accumulator.observe(Some(150));
        accumulator.observe(Some(100));
        assert_eq!(accumulator.observe(Some(250)), None);
        assert_eq!(accumulator.spent_offset(), 50);
        assert_eq!(accumulator.last_counter(), Some(250));
        assert_eq!(accumulator.observe(Some(240)), Some(10));
        assert_eq!(accumulator.spent_offset(), 60);
    }

    #[test]
    fn oversized_drop_is_ignored_but_rebases() {
        let mut accumulator = OffsetAccumulator::new();
        accumulator.observe(Some(2000));
        assert_eq!(accumulator.observe(Some(500)), None);
        assert_eq!(accumulator.spent_offset(), 0);
        assert_eq!(accumulator.last_counter(), Some(500));
    }

    #[test]
    fn boundary_deltas() {
        let mut accumulator = OffsetAccumulator::new();
        assert_eq!(accumulator.apply_delta(1000), Some(1000));
        assert_eq!(accumulator.apply_delta(1001), None);
        assert_eq!(accumulator.apply_delta(1500), None);
        assert_eq!(accumulator.apply_delta(0), None);
        assert_eq!(accumulator.apply_delta(-5), None);
        assert_eq!(accumulator.spent_offset(), 1000);
    }

    #[test]
    fn unreadable_counter_forgets_last_value() {
        let mut accumulator = OffsetAccumulator::new();
        accumulator.observe(Some(150));
        assert_eq!(accumulator.observe(None), None);
        assert_eq!(accumulator.last_counter(), None);
        assert_eq!(accumulator.observe(Some(100)), None);
        assert_eq!(accumulator.spent_offset(), 0);
        assert_eq!(accumulator.last_counter(), Some(100));
        assert_eq!(accumulator.observe(Some(95)), Some(5));
    }

    #[test]
    fn reset_returns_to_idle() {
        let mut accumulator = OffsetAccumulator::new();
        accumulator.observe(Some(150));
        accumulator.observe(Some(100));
        accumulator.reset();
        assert_eq!(accumulator.state(), OffsetState::Idle);
        assert_eq!(accumulator.spent_offset(), 0);
        assert_eq!(accumulator.last_counter(), None);
    }

    #[test]
    fn qualifying_drop_lowers_both_bounds_by_delta() {
        let requirement = TierRequirement::Energy(4000);
        let modifiers = Modifiers::default();
        let mut accumulator = OffsetAccumulator::new();
        accumulator.observe(Some(150));

        let before = estimate(requirement, &modifiers, 10.0, EstimateMode::Range, 0);
        accumulator.observe(Some(125));
        let after = estimate(
            requirement,
            &modifiers,
            10.0,
            EstimateMode::Range,
            accumulator.spent_offset(),
        );

        let before = before.applicable().expect("before");
        let after = after.applicable().expect("after");
        assert_eq!(before.remaining_min - after.remaining_min, 25);
        assert_eq!(before.remaining_max - after.remaining_max, 25);
    }
}
