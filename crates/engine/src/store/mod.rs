mod atomic_io;
mod settings;

pub use settings::{
    is_valid_api_key, Settings, SettingsError, SettingsFile, SettingsReadState,
    SETTINGS_FILE_NAME,
};
