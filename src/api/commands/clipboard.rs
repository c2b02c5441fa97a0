//! Clipboard command module
//!
//! Thin IPC wrappers over [`ClipboardManager`]. Every command takes the
//! managed `Arc<ClipboardManager>` state.

use std::sync::Arc;
use tauri::{AppHandle, State};

use crate::core::clipboard::{ClipboardManager, WatcherState};
use crate::shared::emit::emit_event;
use crate::shared::errors::CommandResult;
use crate::shared::events::AppEvent;
use crate::shared::types::{ClipboardHistoryItem, EntryId};
use crate::system::window::watch_main_window;

type ManagerState<'a> = State<'a, Arc<ClipboardManager>>;

/// Get clipboard history, most recent first
#[tauri::command]
pub fn get_clipboard_history(manager: ManagerState<'_>) -> CommandResult<Vec<ClipboardHistoryItem>> {
    manager.get_history()
}

#[tauri::command]
pub fn clear_clipboard_history(manager: ManagerState<'_>) -> CommandResult<()> {
    manager.clear_history()
}

/// Returns false when no entry has this id
#[tauri::command]
pub fn toggle_clipboard_favorite(manager: ManagerState<'_>, id: EntryId) -> CommandResult<bool> {
    manager.toggle_favorite(id)
}

#[tauri::command]
pub fn set_clipboard_content(manager: ManagerState<'_>, content: String) -> CommandResult<()> {
    manager.set_clipboard_content(&content)
}

/// Re-apply the entry at `index` and hide the window
#[tauri::command]
pub fn paste_clipboard_item(manager: ManagerState<'_>, index: usize) -> CommandResult<bool> {
    manager.reapply(index)
}

#[tauri::command]
pub async fn start_clipboard_watch(app: AppHandle, manager: ManagerState<'_>) -> CommandResult<bool> {
    watch_main_window(&app, manager.inner()).await
}

#[tauri::command]
pub fn stop_clipboard_watch(app: AppHandle, manager: ManagerState<'_>) -> bool {
    let stopped = manager.stop_watching();
    if stopped {
        emit_event(&app, AppEvent::WatchStatusChanged(false));
    }
    stopped
}

#[tauri::command]
pub fn get_clipboard_watch_status(manager: ManagerState<'_>) -> WatcherState {
    manager.watch_state()
}
