use tracing::{debug, info, warn};

use crate::calc::{
    estimate, EstimateMode, Modifiers, OffsetAccumulator, TierRequirement, TierTable,
};
use crate::remote::FetchError;
use crate::store::Settings;

use super::host::{HostPage, ProgressSample, DEFAULT_TIER_NAME};
use super::panel::{build_panel, PanelInput, PanelView};

/// Where the bonus multiplier comes from. The two are never combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BonusSource {
    #[default]
    Api,
    Manual,
}

#[derive(Debug, Clone, Default)]
pub struct WidgetConfig {
    pub mode: EstimateMode,
    pub bonus_source: BonusSource,
    pub table: TierTable,
}

#[derive(Debug)]
pub enum WidgetEvent {
    Tick,
    CounterChanged(Option<i64>),
    ModifiersFetched(Result<Modifiers, FetchError>),
    SettingsChanged(Settings),
    Shutdown,
}

#[derive(Debug)]
struct MountedPanel {
    sample: ProgressSample,
    requirement: TierRequirement,
    accumulator: OffsetAccumulator,
    last_view: Option<PanelView>,
}

/// All widget state. Mutated only through [`Widget::handle`].
#[derive(Debug)]
pub struct Widget {
    config: WidgetConfig,
    settings: Settings,
    modifiers: Modifiers,
    mounted: Option<MountedPanel>,
    mount_count: u64,
}

impl Widget {
    pub fn new(config: WidgetConfig, settings: Settings) -> Self {
        let modifiers = initial_modifiers(config.bonus_source, &settings);
        Self {
            config,
            settings,
            modifiers,
            mounted: None,
            mount_count: 0,
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn mount_count(&self) -> u64 {
        self.mount_count
    }

    pub fn spent_offset(&self) -> u64 {
        self.mounted
            .as_ref()
            .map_or(0, |panel| panel.accumulator.spent_offset())
    }

    /// The key to fetch modifiers with, if this widget wants a fetch at all.
    pub fn fetch_key(&self) -> Option<&str> {
        match self.config.bonus_source {
            BonusSource::Api => self.settings.credential(),
            BonusSource::Manual => None,
        }
    }

    pub fn needs_key_prompt(&self) -> bool {
        self.config.bonus_source == BonusSource::Api && self.settings.credential().is_none()
    }

    /// Applies one event. Returns a view only when it differs from the last
    /// one presented.
    pub fn handle(&mut self, event: WidgetEvent, host: &mut dyn HostPage) -> Option<PanelView> {
        match event {
            WidgetEvent::Tick => self.on_tick(host),
            WidgetEvent::CounterChanged(counter) => self.on_counter(counter),
            WidgetEvent::ModifiersFetched(result) => self.on_modifiers(result),
            WidgetEvent::SettingsChanged(settings) => self.on_settings(settings),
            WidgetEvent::Shutdown => None,
        }
    }

    /// Mounts the panel unless one is already mounted. Returns whether a new
    /// panel was mounted.
    pub fn mount(&mut self, sample: ProgressSample, host: &mut dyn HostPage) -> bool {
        if self.mounted.is_some() {
            return false;
        }

        let mut accumulator = OffsetAccumulator::new();
        if self.config.mode == EstimateMode::Range {
            accumulator.observe(host.read_counter());
        }
        let requirement = self.config.table.requirement(sample.tier_index);
        self.mount_count = self.mount_count.saturating_add(1);
        info!(
            tier = sample.tier_index,
            percent = sample.percent_complete,
            applicable = requirement != TierRequirement::NotApplicable,
            mount_count = self.mount_count,
            "widget_mounted"
        );
        self.mounted = Some(MountedPanel {
            sample,
            requirement,
            accumulator,
            last_view: None,
        });
        true
    }

    pub fn unmount(&mut self) {
        if let Some(panel) = self.mounted.take() {
            info!(
                tier = panel.sample.tier_index,
                spent_offset = panel.accumulator.spent_offset(),
                "widget_unmounted"
            );
        }
    }

    pub fn current_view(&self) -> Option<PanelView> {
        let panel = self.mounted.as_ref()?;
        Some(self.build_view(panel))
    }

    fn on_tick(&mut self, host: &mut dyn HostPage) -> Option<PanelView> {
        let Some(sample) = host.read_progress() else {
            self.unmount();
            return None;
        };

        // A new tier or a refreshed percentage means the host re-rendered.
        let rerendered = self
            .mounted
            .as_ref()
            .is_some_and(|panel| panel.sample != sample);
        if rerendered {
            self.unmount();
        }
        self.mount(sample, host);
        self.present()
    }

    fn on_counter(&mut self, counter: Option<i64>) -> Option<PanelView> {
        if self.config.mode != EstimateMode::Range {
            return None;
        }
        let panel = self.mounted.as_mut()?;
        let delta = panel.accumulator.observe(counter)?;
        debug!(
            delta,
            spent_offset = panel.accumulator.spent_offset(),
            "training_detected"
        );
        self.present()
    }

    fn on_modifiers(&mut self, result: Result<Modifiers, FetchError>) -> Option<PanelView> {
        if self.config.bonus_source != BonusSource::Api {
            debug!("modifiers_ignored_manual_source");
            return None;
        }
        match result {
            Ok(modifiers) => {
                self.modifiers = modifiers;
                self.present()
            }
            Err(error) => {
                warn!(error = %error, "modifiers_fetch_failed");
                None
            }
        }
    }

    fn on_settings(&mut self, settings: Settings) -> Option<PanelView> {
        if self.config.bonus_source == BonusSource::Manual {
            self.modifiers = Modifiers::manual(settings.bonus_enabled);
        }
        self.settings = settings;
        self.present()
    }

    fn present(&mut self) -> Option<PanelView> {
        let view = self.current_view()?;
        let panel = self.mounted.as_mut()?;
        if panel.last_view.as_ref() == Some(&view) {
            return None;
        }
        panel.last_view = Some(view.clone());
        Some(view)
    }

    fn build_view(&self, panel: &MountedPanel) -> PanelView {
        let title = panel.sample.tier_name.as_deref().unwrap_or(DEFAULT_TIER_NAME);
        if self.needs_key_prompt() {
            return build_panel(&PanelInput {
                title,
                estimation: None,
                api_badge: false,
                bonus_badge: false,
                updated: false,
            });
        }
        let spent_offset = panel.accumulator.spent_offset();
        let estimation = estimate(
            panel.requirement,
            &self.modifiers,
            panel.sample.percent_complete,
            self.config.mode,
            spent_offset,
        );
        build_panel(&PanelInput {
            title,
            estimation: Some(estimation),
            api_badge: self.fetch_key().is_some(),
            bonus_badge: self.modifiers.bonus_active,
            updated: spent_offset > 0,
        })
    }
}

fn initial_modifiers(source: BonusSource, settings: &Settings) -> Modifiers {
    match source {
        BonusSource::Api => Modifiers::default(),
        BonusSource::Manual => Modifiers::manual(settings.bonus_enabled),
    }
}
