use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::atomic_io::write_text_atomic;

pub const SETTINGS_FILE_NAME: &str = "settings.json";
const API_KEY_LEN: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: String,
    pub prompt_shown: bool,
    pub bonus_enabled: bool,
}

impl Settings {
    /// The stored key if it looks usable. Malformed keys count as absent.
    pub fn credential(&self) -> Option<&str> {
        let key = self.api_key.trim();
        is_valid_api_key(key).then_some(key)
    }
}

pub fn is_valid_api_key(key: &str) -> bool {
    key.len() == API_KEY_LEN && key.bytes().all(|byte| byte.is_ascii_alphanumeric())
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode settings: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsReadState {
    Missing,
    Unreadable,
    Present(Settings),
}

#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(SETTINGS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<SettingsReadState, SettingsError> {
        if !self.path.exists() {
            return Ok(SettingsReadState::Missing);
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| SettingsError::Read {
            path: self.path.clone(),
            source,
        })?;
        match serde_json::from_str::<Settings>(&raw) {
            Ok(settings) => Ok(SettingsReadState::Present(settings)),
            Err(error) => {
                debug!(path = %self.path.display(), error = %error, "settings_decode_failed");
                Ok(SettingsReadState::Unreadable)
            }
        }
    }

    /// Reads settings, falling back to defaults on any failure.
    pub fn load(&self) -> Settings {
        match self.read() {
            Ok(SettingsReadState::Present(settings)) => settings,
            Ok(SettingsReadState::Missing) => Settings::default(),
            Ok(SettingsReadState::Unreadable) => {
                warn!(path = %self.path.display(), "settings_unreadable_using_defaults");
                Settings::default()
            }
            Err(error) => {
                warn!(error = %error, "settings_read_failed_using_defaults");
                Settings::default()
            }
        }
    }

    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let text = serde_json::to_string_pretty(settings).map_err(SettingsError::Encode)?;
        write_text_atomic(&self.path, &text).map_err(|source| SettingsError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = SettingsFile::in_dir(dir.path());

        assert_eq!(file.read().expect("read"), SettingsReadState::Missing);
        assert_eq!(file.load(), Settings::default());
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = SettingsFile::in_dir(dir.path());
        let settings = Settings {
            api_key: "abcdEFGH12345678".to_string(),
            prompt_shown: true,
            bonus_enabled: true,
        };

        file.save(&settings).expect("save");

        assert_eq!(file.load(), settings);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = SettingsFile::in_dir(dir.path());
        fs::write(file.path(), "{ not json").expect("write");

        assert_eq!(file.read().expect("read"), SettingsReadState::Unreadable);
        assert_eq!(file.load(), Settings::default());
    }

    #[test]
    fn partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = SettingsFile::in_dir(dir.path());
        fs::write(file.path(), r#"{"bonus_enabled": true}"#).expect("write");

        let settings = file.load();
        assert!(settings.bonus_enabled);
        assert!(settings.api_key.is_empty());
        assert!(!settings.prompt_shown);
    }

    #[test]
    fn credential_requires_sixteen_alphanumerics() {
        let mut settings = Settings::default();
        assert_eq!(settings.credential(), None);

        settings.api_key = "  abcdEFGH12345678 \n".to_string();
        assert_eq!(settings.credential(), Some("abcdEFGH12345678"));

        settings.api_key = "short".to_string();
        assert_eq!(settings.credential(), None);

        settings.api_key = "abcd-EFGH-123456".to_string();
        assert_eq!(settings.credential(), None);
    }
}
