use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use outlinewriter_core::{
    EditorOptions, DEFAULT_HISTORY_CAPACITY, DEFAULT_MAX_BACKUPS, DEFAULT_NEW_TITLE,
};

const PREFERENCES_VERSION: u32 = 1;
const MAX_HISTORY_CAPACITY: usize = 500;
const MAX_BACKUP_INTERVAL_MINUTES: u32 = 240;
const MAX_BACKUPS_LIMIT: usize = 100;
const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

#[derive(Debug, Error)]
pub enum PreferencesError {
    #[error("failed to read preferences {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse preferences {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize preferences {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write preferences {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to prepare directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub editor: EditorPreferences,
    #[serde(default)]
    pub backup: BackupPreferences,
    #[serde(default)]
    pub logging: LoggingPreferences,
}

fn default_version() -> u32 {
    PREFERENCES_VERSION
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            editor: EditorPreferences::default(),
            backup: BackupPreferences::default(),
            logging: LoggingPreferences::default(),
        }
    }
}

impl Preferences {
    pub fn sanitize(&mut self) {
        if self.version == 0 {
            self.version = PREFERENCES_VERSION;
        }
        self.editor.sanitize();
        self.backup.sanitize();
        self.logging.sanitize();
    }

    /// Editor session options derived from these preferences.
    /// 轉換為編輯工作階段設定。
    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            history_capacity: self.editor.history_capacity,
            new_item_title: self.editor.new_item_title.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorPreferences {
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_new_item_title")]
    pub new_item_title: String,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

fn default_new_item_title() -> String {
    DEFAULT_NEW_TITLE.to_string()
}

impl Default for EditorPreferences {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            new_item_title: default_new_item_title(),
        }
    }
}

impl EditorPreferences {
    fn sanitize(&mut self) {
        if self.history_capacity == 0 {
            self.history_capacity = default_history_capacity();
        }
        self.history_capacity = self.history_capacity.clamp(1, MAX_HISTORY_CAPACITY);
        if self.new_item_title.trim().is_empty() {
            self.new_item_title = default_new_item_title();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupPreferences {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_backup_interval")]
    pub interval_minutes: u32,
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,
}

fn default_true() -> bool {
    true
}

fn default_backup_interval() -> u32 {
    5
}

fn default_max_backups() -> usize {
    DEFAULT_MAX_BACKUPS
}

impl Default for BackupPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_minutes: default_backup_interval(),
            max_backups: default_max_backups(),
        }
    }
}

impl BackupPreferences {
    fn sanitize(&mut self) {
        if self.interval_minutes == 0 {
            self.interval_minutes = default_backup_interval();
        }
        self.interval_minutes = self.interval_minutes.clamp(1, MAX_BACKUP_INTERVAL_MINUTES);
        if self.max_backups == 0 {
            self.max_backups = default_max_backups();
        }
        self.max_backups = self.max_backups.clamp(1, MAX_BACKUPS_LIMIT);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingPreferences {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingPreferences {
    fn sanitize(&mut self) {
        let level = self.level.trim().to_ascii_lowercase();
        self.level = if LOG_LEVELS.contains(&level.as_str()) {
            level
        } else {
            default_log_level()
        };
    }
}

#[derive(Debug)]
pub struct PreferencesStore {
    path: PathBuf,
    data: Preferences,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>, preferences: Preferences) -> Self {
        Self {
            path: path.into(),
            data: preferences,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreferencesError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            debug!(path = %path.display(), "no preferences file; using defaults");
            let mut data = Preferences::default();
            data.sanitize();
            return Ok(Self { path, data });
        }

        let data = read_preferences(&path)?;
        info!(path = %path.display(), "preferences loaded");
        Ok(Self { path, data })
    }

    pub fn preferences(&self) -> &Preferences {
        &self.data
    }

    pub fn update<F>(&mut self, mut op: F) -> Result<(), PreferencesError>
    where
        F: FnMut(&mut Preferences),
    {
        op(&mut self.data);
        self.data.sanitize();
        self.save()
    }

    pub fn overwrite(&mut self, preferences: Preferences) -> Result<(), PreferencesError> {
        self.data = preferences;
        self.data.sanitize();
        self.save()
    }

    pub fn save(&self) -> Result<(), PreferencesError> {
        ensure_parent(&self.path)?;
        let payload = serde_json::to_string_pretty(&self.data).map_err(|source| {
            PreferencesError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, payload.as_bytes()).map_err(|source| PreferencesError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| PreferencesError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!(path = %self.path.display(), "preferences saved");
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn export_to(&self, path: impl AsRef<Path>) -> Result<(), PreferencesError> {
        let path = path.as_ref().to_path_buf();
        ensure_parent(&path)?;
        let payload = serde_json::to_string_pretty(&self.data).map_err(|source| {
            PreferencesError::Serialize {
                path: path.clone(),
                source,
            }
        })?;
        fs::write(&path, payload.as_bytes())
            .map_err(|source| PreferencesError::Write { path, source })
    }

    /// Replaces the preferences with an external file, backing up the current file to `.bak` first.
    /// 匯入偏好設定檔；既有檔案會先備份為 `.bak`。
    pub fn import_from(&mut self, source: impl AsRef<Path>) -> Result<(), PreferencesError> {
        let data = read_preferences(source.as_ref())?;
        self.backup_existing()?;
        self.data = data;
        self.save()
    }

    fn backup_existing(&self) -> Result<(), PreferencesError> {
        if self.path.exists() {
            let backup = self.path.with_extension("bak");
            fs::copy(&self.path, &backup).map_err(|source| PreferencesError::Write {
                path: backup,
                source,
            })?;
        }
        Ok(())
    }
}

fn read_preferences(path: &Path) -> Result<Preferences, PreferencesError> {
    let contents = fs::read_to_string(path).map_err(|source| PreferencesError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut data: Preferences =
        serde_json::from_str(&contents).map_err(|source| PreferencesError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    data.sanitize();
    Ok(data)
}

fn ensure_parent(path: &Path) -> Result<(), PreferencesError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| PreferencesError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
