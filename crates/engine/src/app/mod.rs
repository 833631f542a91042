mod host;
mod metrics;
mod panel;
mod runner;
mod widget;

pub use host::{
    parse_counter_text, parse_percentage_text, tier_name_from_label, HostError, HostPage,
    PageSnapshot, ProgressSample, SnapshotHostPage, DEFAULT_TIER_NAME,
};
pub use metrics::{RunTotals, WidgetMetricsSnapshot};
pub use panel::{format_days_left, format_thousands, PanelBody, PanelView, KEY_PROMPT_TEXT};
pub use runner::{
    resolve_poll_interval, run_widget, spawn_counter_observer, spawn_settings_observer,
    ObserverHandle, PanelSink, RunConfig, DEFAULT_POLL_INTERVAL, POLL_INTERVAL_ENV_VAR,
};
pub use widget::{BonusSource, Widget, WidgetConfig, WidgetEvent};
