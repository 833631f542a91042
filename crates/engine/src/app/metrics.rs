use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WidgetMetricsSnapshot {
    pub ticks_per_sec: f32,
    pub counter_events: u32,
    pub fetch_events: u32,
    pub renders: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub ticks: u64,
    pub counter_events: u64,
    pub fetch_events: u64,
    pub renders: u64,
}

/// Counts loop activity and emits one snapshot per interval.
#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    ticks: u32,
    counter_events: u32,
    fetch_events: u32,
    renders: u32,
    totals: RunTotals,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval_start: now,
            interval,
            ticks: 0,
            counter_events: 0,
            fetch_events: 0,
            renders: 0,
            totals: RunTotals::default(),
        }
    }

    pub(crate) fn record_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
        self.totals.ticks = self.totals.ticks.saturating_add(1);
    }

    pub(crate) fn record_counter_event(&mut self) {
        self.counter_events = self.counter_events.saturating_add(1);
        self.totals.counter_events = self.totals.counter_events.saturating_add(1);
    }

    pub(crate) fn record_fetch_event(&mut self) {
        self.fetch_events = self.fetch_events.saturating_add(1);
        self.totals.fetch_events = self.totals.fetch_events.saturating_add(1);
    }

    pub(crate) fn record_render(&mut self) {
        self.renders = self.renders.saturating_add(1);
        self.totals.renders = self.totals.renders.saturating_add(1);
    }

    pub(crate) fn totals(&self) -> RunTotals {
        self.totals
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<WidgetMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let snapshot = WidgetMetricsSnapshot {
            ticks_per_sec: self.ticks as f32 / elapsed_seconds,
            counter_events: self.counter_events,
            fetch_events: self.fetch_events,
            renders: self.renders,
        };

        self.interval_start = now;
        self.ticks = 0;
        self.counter_events = 0;
        self.fetch_events = 0;
        self.renders = 0;

        Some(snapshot)
    }
}
