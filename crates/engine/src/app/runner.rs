use std::env;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use super::host::HostPage;
use super::metrics::{MetricsAccumulator, RunTotals};
use super::panel::PanelView;
use super::widget::{Widget, WidgetEvent};
use crate::store::{Settings, SettingsFile, SettingsReadState};

pub const POLL_INTERVAL_ENV_VAR: &str = "GYM_WIDGET_POLL_MS";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_METRICS_LOG_INTERVAL: Duration = Duration::from_secs(60);
const COUNTER_OBSERVER_THREAD_NAME: &str = "counter-observer";
const SETTINGS_OBSERVER_THREAD_NAME: &str = "settings-observer";

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub poll_interval: Duration,
    pub metrics_log_interval: Duration,
    /// Stop after this many ticks. `None` runs until shutdown.
    pub max_ticks: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            metrics_log_interval: DEFAULT_METRICS_LOG_INTERVAL,
            max_ticks: None,
        }
    }
}

/// Receives every view the widget decides to present.
pub trait PanelSink {
    fn present(&mut self, view: &PanelView);
}

impl<F> PanelSink for F
where
    F: FnMut(&PanelView),
{
    fn present(&mut self, view: &PanelView) {
        self(view)
    }
}

/// Single-threaded loop: timer ticks plus whatever arrives on `events`.
pub fn run_widget(
    widget: &mut Widget,
    host: &mut dyn HostPage,
    events: &Receiver<WidgetEvent>,
    sink: &mut dyn PanelSink,
    config: &RunConfig,
) -> RunTotals {
    let poll_interval = normalize_non_zero_duration(config.poll_interval, DEFAULT_POLL_INTERVAL);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, DEFAULT_METRICS_LOG_INTERVAL);
    info!(
        poll_interval_ms = poll_interval.as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        max_ticks = ?config.max_ticks,
        mode = ?widget.config().mode,
        bonus_source = ?widget.config().bonus_source,
        "widget_loop_config"
    );

    let mut metrics = MetricsAccumulator::new(metrics_log_interval, Instant::now());
    let mut senders_gone = false;

    dispatch(widget, host, WidgetEvent::Tick, sink, &mut metrics);
    let mut next_tick = Instant::now() + poll_interval;

    loop {
        if tick_budget_spent(metrics.totals().ticks, config.max_ticks) {
            info!(ticks = metrics.totals().ticks, "widget_loop_tick_budget_reached");
            break;
        }

        let wait = next_tick.saturating_duration_since(Instant::now());
        let event = if senders_gone {
            thread::sleep(wait);
            None
        } else {
            match events.recv_timeout(wait) {
                Ok(event) => Some(event),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => {
                    senders_gone = true;
                    continue;
                }
            }
        };

        match event {
            Some(WidgetEvent::Shutdown) => {
                info!(reason = "shutdown_event", "widget_loop_stopping");
                break;
            }
            Some(event) => dispatch(widget, host, event, sink, &mut metrics),
            None => {
                dispatch(widget, host, WidgetEvent::Tick, sink, &mut metrics);
                next_tick = next_deadline(next_tick, poll_interval, Instant::now());
            }
        }

        if let Some(snapshot) = metrics.maybe_snapshot(Instant::now()) {
            info!(
                ticks_per_sec = snapshot.ticks_per_sec,
                counter_events = snapshot.counter_events,
                fetch_events = snapshot.fetch_events,
                renders = snapshot.renders,
                mounted = widget.is_mounted(),
                spent_offset = widget.spent_offset(),
                "widget_metrics"
            );
        }
    }

    widget.unmount();
    let totals = metrics.totals();
    info!(
        ticks = totals.ticks,
        counter_events = totals.counter_events,
        fetch_events = totals.fetch_events,
        renders = totals.renders,
        "widget_loop_stopped"
    );
    totals
}

fn dispatch(
    widget: &mut Widget,
    host: &mut dyn HostPage,
    event: WidgetEvent,
    sink: &mut dyn PanelSink,
    metrics: &mut MetricsAccumulator,
) {
    match &event {
        WidgetEvent::Tick => metrics.record_tick(),
        WidgetEvent::CounterChanged(_) => metrics.record_counter_event(),
        WidgetEvent::ModifiersFetched(_) => metrics.record_fetch_event(),
        WidgetEvent::SettingsChanged(_) | WidgetEvent::Shutdown => {}
    }
    if let Some(view) = widget.handle(event, host) {
        metrics.record_render();
        sink.present(&view);
    }
}

fn tick_budget_spent(ticks: u64, max_ticks: Option<u64>) -> bool {
    max_ticks.is_some_and(|limit| ticks >= limit)
}

/// Next tick deadline. Missed ticks are skipped rather than replayed.
fn next_deadline(previous: Instant, interval: Duration, now: Instant) -> Instant {
    let candidate = previous + interval;
    if candidate <= now {
        now + interval
    } else {
        candidate
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

pub fn resolve_poll_interval(configured: Duration) -> Duration {
    poll_interval_from(env::var(POLL_INTERVAL_ENV_VAR), configured)
}

fn poll_interval_from(raw: Result<String, env::VarError>, configured: Duration) -> Duration {
    match raw {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(ms) if ms > 0 => Duration::from_millis(ms),
            _ => {
                warn!(
                    env_var = POLL_INTERVAL_ENV_VAR,
                    value = value.as_str(),
                    "invalid poll interval env var value; falling back to config"
                );
                configured
            }
        },
        Err(env::VarError::NotPresent) => configured,
        Err(err) => {
            warn!(
                env_var = POLL_INTERVAL_ENV_VAR,
                error = %err,
                "unable to read poll interval env var; falling back to config"
            );
            configured
        }
    }
}

/// Owns a background observer thread. Stopping or dropping the handle
/// signals the thread and waits for it.
#[derive(Debug)]
pub struct ObserverHandle {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ObserverHandle {
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, JoinHandle::is_finished)
    }

    pub fn stop(mut self) {
        self.signal_and_join();
    }

    fn signal_and_join(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("observer_thread_panicked");
            }
        }
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.signal_and_join();
    }
}

/// Takes a first reading on the caller's thread, then polls `read` every
/// `interval` and sends `to_event(value)` only when the value changes. Ends
/// on stop or once the receiving side is gone.
fn spawn_change_observer<T, R, E>(
    thread_name: &str,
    mut read: R,
    interval: Duration,
    events: Sender<WidgetEvent>,
    to_event: E,
) -> io::Result<ObserverHandle>
where
    T: Clone + PartialEq + Send + 'static,
    R: FnMut() -> T + Send + 'static,
    E: Fn(T) -> WidgetEvent + Send + 'static,
{
    let interval = normalize_non_zero_duration(interval, DEFAULT_POLL_INTERVAL);
    let stop = Arc::new(AtomicBool::new(false));
    let thread_stop = Arc::clone(&stop);
    let mut last_seen = read();
    let thread = thread::Builder::new()
        .name(thread_name.to_string())
        .spawn(move || {
            loop {
                thread::sleep(interval);
                if thread_stop.load(Ordering::Relaxed) {
                    break;
                }
                let current = read();
                if current == last_seen {
                    continue;
                }
                last_seen = current.clone();
                if events.send(to_event(current)).is_err() {
                    break;
                }
            }
        })?;
    Ok(ObserverHandle {
        stop,
        thread: Some(thread),
    })
}

/// Reports energy counter changes, including a change to unreadable.
pub fn spawn_counter_observer<R>(
    read_counter: R,
    interval: Duration,
    events: Sender<WidgetEvent>,
) -> io::Result<ObserverHandle>
where
    R: FnMut() -> Option<i64> + Send + 'static,
{
    spawn_change_observer(
        COUNTER_OBSERVER_THREAD_NAME,
        read_counter,
        interval,
        events,
        WidgetEvent::CounterChanged,
    )
}

/// Reports edits to the settings file made while the widget runs. A missing
/// file reads as defaults; an unreadable one keeps the last settings.
pub fn spawn_settings_observer(
    file: SettingsFile,
    interval: Duration,
    events: Sender<WidgetEvent>,
) -> io::Result<ObserverHandle> {
    let mut current = file.load();
    spawn_change_observer(
        SETTINGS_OBSERVER_THREAD_NAME,
        move || {
            match file.read() {
                Ok(SettingsReadState::Present(settings)) => current = settings,
                Ok(SettingsReadState::Missing) => current = Settings::default(),
                Ok(SettingsReadState::Unreadable) | Err(_) => {}
            }
            current.clone()
        },
        interval,
        events,
        WidgetEvent::SettingsChanged,
    )
}
