use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_TIER_NAME: &str = "Current Gym";

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSample {
    pub tier_index: u32,
    pub percent_complete: f64,
    pub tier_name: Option<String>,
}

/// What the widget needs from the page it is embedded in.
pub trait HostPage {
    /// `None` until the progress anchor exists.
    fn read_progress(&mut self) -> Option<ProgressSample>;
    /// Current energy counter, if the page shows one.
    fn read_counter(&mut self) -> Option<i64>;
}

/// Parses a literal percentage such as `"45%"` or `"12.5 %"`.
pub fn parse_percentage_text(text: &str) -> Option<f64> {
    if !text.contains('%') {
        return None;
    }
    leading_number(&text.replace('%', ""))
}

/// Parses the current value out of a `"current/maximum"` counter.
pub fn parse_counter_text(text: &str) -> Option<i64> {
    let (current, _) = text.split_once('/')?;
    current.trim().parse::<i64>().ok()
}

/// Gym names are carried as the first sentence of the button label.
pub fn tier_name_from_label(label: &str) -> Option<String> {
    let name = label.split('.').next().unwrap_or_default().trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn leading_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let end = trimmed
        .char_indices()
        .find(|(_, ch)| !(ch.is_ascii_digit() || *ch == '.'))
        .map_or(trimmed.len(), |(index, _)| index);
    trimmed[..end].parse::<f64>().ok()
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to read page snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode page snapshot {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Extracted page state, as written by whatever is watching the real page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageSnapshot {
    pub tier: Option<u32>,
    pub tier_label: Option<String>,
    pub percentage: Option<String>,
    pub energy: Option<String>,
}

impl PageSnapshot {
    pub fn progress(&self) -> Option<ProgressSample> {
        let percent_complete = parse_percentage_text(self.percentage.as_deref()?)?;
        Some(ProgressSample {
            // A page without a gym icon still mounts, with no requirement.
            tier_index: self.tier.unwrap_or(0),
            percent_complete,
            tier_name: self.tier_label.as_deref().and_then(tier_name_from_label),
        })
    }

    pub fn counter(&self) -> Option<i64> {
        parse_counter_text(self.energy.as_deref()?)
    }
}

/// A host backed by a JSON snapshot file that is re-read on every call.
#[derive(Debug, Clone)]
pub struct SnapshotHostPage {
    path: PathBuf,
}

impl SnapshotHostPage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_snapshot(&self) -> Result<PageSnapshot, HostError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| HostError::Read {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| HostError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn snapshot_or_unavailable(&self) -> Option<PageSnapshot> {
        match self.read_snapshot() {
            Ok(snapshot) => Some(snapshot),
            Err(error) => {
                debug!(error = %error, "page_snapshot_unavailable");
                None
            }
        }
    }
}

impl HostPage for SnapshotHostPage {
    fn read_progress(&mut self) -> Option<ProgressSample> {
        self.snapshot_or_unavailable()?.progress()
    }

    fn read_counter(&mut self) -> Option<i64> {
        self.snapshot_or_unavailable()?.counter()
    }
}
