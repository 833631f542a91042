use std::io::Write;
use std::sync::mpsc;
use std::time::Duration;

use gym_engine::{
    resolve_poll_interval, run_widget, spawn_counter_observer, spawn_modifier_fetch,
    spawn_settings_observer, EstimateMode, HostPage, PanelSink, PanelView, RunConfig, RunTotals,
    SettingsFile, SnapshotHostPage, TornApiClient, Widget, WidgetConfig, WidgetEvent,
    DEFAULT_POLL_INTERVAL,
};
use tracing::{debug, info, warn};

use super::bootstrap::load_run_settings;
use super::cli::WatchArgs;
use super::WidgetAppError;

/// Prints each presented panel as a block separated by a blank line.
struct TextPanelSink<'a> {
    out: &'a mut dyn Write,
}

impl PanelSink for TextPanelSink<'_> {
    fn present(&mut self, view: &PanelView) {
        if let Err(error) = writeln!(self.out, "{}\n", view.render()) {
            warn!(error = %error, "panel_write_failed");
        }
    }
}

pub(crate) fn run_watch(
    args: &WatchArgs,
    settings_file: &SettingsFile,
    out: &mut dyn Write,
    notice: &mut dyn Write,
) -> Result<RunTotals, WidgetAppError> {
    let settings = load_run_settings(settings_file, args.bonus_source, notice);
    let mut widget = Widget::new(
        WidgetConfig {
            mode: args.mode,
            bonus_source: args.bonus_source,
            ..WidgetConfig::default()
        },
        settings,
    );
    let run_config = RunConfig {
        poll_interval: poll_interval_for(args),
        max_ticks: args.max_ticks,
        ..RunConfig::default()
    };
    info!(
        page = %args.page.display(),
        fetch = args.fetch,
        "watch_starting"
    );

    let (sender, receiver) = mpsc::channel();
    if args.fetch {
        start_modifier_fetch(&widget, sender.clone())?;
    }
    let mut host = SnapshotHostPage::new(&args.page);
    let mut observers = vec![spawn_settings_observer(
        settings_file.clone(),
        run_config.poll_interval,
        sender.clone(),
    )
    .map_err(WidgetAppError::Observer)?];
    if args.mode == EstimateMode::Range {
        let mut observer_host = host.clone();
        observers.push(
            spawn_counter_observer(
                move || observer_host.read_counter(),
                run_config.poll_interval,
                sender.clone(),
            )
            .map_err(WidgetAppError::Observer)?,
        );
    }
    drop(sender);

    let mut sink = TextPanelSink { out };
    let totals = run_widget(
        &mut widget,
        &mut host,
        &receiver,
        &mut sink,
        &run_config,
    );
    for observer in observers {
        observer.stop();
    }
    Ok(totals)
}

fn poll_interval_for(args: &WatchArgs) -> Duration {
    match args.poll_ms {
        Some(poll_ms) => Duration::from_millis(poll_ms),
        None => resolve_poll_interval(DEFAULT_POLL_INTERVAL),
    }
}

fn start_modifier_fetch(
    widget: &Widget,
    events: mpsc::Sender<WidgetEvent>,
) -> Result<(), WidgetAppError> {
    let Some(api_key) = widget.fetch_key() else {
        debug!("modifier_fetch_skipped");
        return Ok(());
    };
    let client = TornApiClient::from_env()?;
    spawn_modifier_fetch(client, api_key.to_string(), move |result| {
        if events.send(WidgetEvent::ModifiersFetched(result)).is_err() {
            debug!("modifier_result_dropped");
        }
    })?;
    Ok(())
}
