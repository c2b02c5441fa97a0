use log::warn;
use tauri::{AppHandle, Emitter};
use super::events::AppEvent;

/// Emit an application event to all windows
///
/// A failed emit (window torn down mid-send) is logged and dropped.
pub fn emit_event(app: &AppHandle, event: AppEvent) {
    let name = event.name();
    let result = match &event {
        AppEvent::HistoryChanged(item) => app.emit(name, item),
        AppEvent::WatchStatusChanged(active) => app.emit(name, active),
    };

    if let Err(e) = result {
        warn!("[Emit] Failed to emit {}: {}", name, e);
    }
}
