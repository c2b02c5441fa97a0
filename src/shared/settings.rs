use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use ts_rs::TS;

use crate::shared::errors::{CommandError, CommandResult};

/// Default clipboard poll cadence
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const MIN_POLL_INTERVAL_MS: u64 = 500;
const MAX_POLL_INTERVAL_MS: u64 = 1000;

pub const APP_QUALIFIER: &str = "com";
pub const APP_ORGANIZATION: &str = "antigravity";
pub const APP_NAME: &str = "clipboard-history";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "settings.ts")]
pub struct AppSettings {
    pub hotkeys: HotkeySettings,
    pub monitor: MonitorSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "settings.ts")]
pub struct HotkeySettings {
    pub toggle_window: String,
}

impl Default for HotkeySettings {
    fn default() -> Self {
        Self {
            toggle_window: "CommandOrControl+Shift+V".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "settings.ts")]
pub struct MonitorSettings {
    #[ts(type = "number")]
    pub poll_interval_ms: u64,
    /// Record image snapshots as well as text
    pub capture_images: bool,
    /// Drop text that looks like a credential. Off by default: every distinct copy is recorded.
    pub ignore_sensitive: bool,
    /// Skip polls while the bound window is hidden or minimized
    pub pause_when_hidden: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            capture_images: true,
            ignore_sensitive: false,
            pause_when_hidden: true,
        }
    }
}

impl MonitorSettings {
    /// Poll interval, clamped to the supported 500ms..=1000ms window
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(default)]
#[ts(export, export_to = "settings.ts")]
pub struct StorageSettings {
    /// Overrides the platform data directory for the history database
    #[ts(type = "string | null")]
    pub data_dir: Option<PathBuf>,
}

impl StorageSettings {
    /// Directory holding the history database
    pub fn resolve_data_dir(&self) -> CommandResult<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| CommandError::SystemIO("Failed to determine data directory".to_string()))
    }
}

impl AppSettings {
    pub fn get_settings_path() -> CommandResult<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or_else(|| CommandError::SystemIO("Failed to determine config directory".to_string()))
    }

    /// Load settings from the platform config directory, writing defaults on first run
    pub async fn load() -> CommandResult<Self> {
        let path = Self::get_settings_path()?;
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &Path) -> CommandResult<Self> {
        if !path.exists() {
            let settings = Self::default();
            settings.save_to(path).await?;
            return Ok(settings);
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| CommandError::SystemIO(format!("Failed to read settings file: {}", e)))?;

        Ok(serde_json::from_str(&content)?)
    }

    pub async fn save(&self) -> CommandResult<()> {
        let path = Self::get_settings_path()?;
        self.save_to(&path).await
    }

    pub async fn save_to(&self, path: &Path) -> CommandResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CommandError::SystemIO(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)?;

        fs::write(path, content)
            .await
            .map_err(|e| CommandError::SystemIO(format!("Failed to write settings file: {}", e)))
    }
}
