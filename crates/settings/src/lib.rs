pub mod preferences;

pub use preferences::{
    BackupPreferences, EditorPreferences, LogFormat, LoggingPreferences, Preferences,
    PreferencesError, PreferencesStore,
};
