//! Settings command module
//!
//! Handles application settings persistence. Changes take effect on the next launch.

use crate::shared::errors::CommandResult;
use crate::shared::settings::AppSettings;

/// Get current application settings
#[tauri::command]
pub async fn get_settings() -> CommandResult<AppSettings> {
    AppSettings::load().await
}

/// Save application settings
#[tauri::command]
pub async fn save_settings(settings: AppSettings) -> CommandResult<()> {
    settings.save().await
}
