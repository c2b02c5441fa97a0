//! Main window management
//!
//! Binds the main webview window to the clipboard watcher. The window is the
//! watcher's surface and its destruction stops the watcher. A global shortcut
//! toggles it.

use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tauri::{AppHandle, Manager, WebviewWindow, WindowEvent};
use tauri_plugin_global_shortcut::{GlobalShortcutExt, Shortcut, ShortcutState};

use crate::core::clipboard::{ClipboardManager, Surface};
use crate::shared::emit::emit_event;
use crate::shared::errors::{CommandError, CommandResult};
use crate::shared::events::AppEvent;

pub const MAIN_WINDOW: &str = "main";

/// A Tauri window seen as a watcher surface.
///
/// Created once per window; every watch cycle reuses it.
pub struct WindowSurface {
    window: WebviewWindow,
    destroyed: AtomicBool,
}

impl Surface for WindowSurface {
    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn is_visible(&self) -> bool {
        if self.is_destroyed() {
            return false;
        }
        let visible = self.window.is_visible().unwrap_or(false);
        let minimized = self.window.is_minimized().unwrap_or(false);
        visible && !minimized
    }

    fn dismiss(&self) -> CommandResult<()> {
        self.window.hide()?;
        Ok(())
    }
}

fn main_window(app: &AppHandle) -> CommandResult<WebviewWindow> {
    app.get_webview_window(MAIN_WINDOW)
        .ok_or_else(|| CommandError::WindowError("Main window not found".to_string()))
}

/// Wrap the main window as a surface and install its only window-event
/// handler: on destroy, mark the surface gone and stop the watcher.
///
/// Call once at setup; the surface is kept in managed state.
pub fn bind_main_window(app: &AppHandle, manager: &Arc<ClipboardManager>) -> CommandResult<Arc<WindowSurface>> {
    let window = main_window(app)?;
    let surface = Arc::new(WindowSurface {
        window: window.clone(),
        destroyed: AtomicBool::new(false),
    });

    let on_destroy = Arc::clone(&surface);
    let manager = Arc::clone(manager);
    let handle = app.clone();
    window.on_window_event(move |event| {
        if let WindowEvent::Destroyed = event {
            on_destroy.destroyed.store(true, Ordering::SeqCst);
            if manager.stop_watching() {
                emit_event(&handle, AppEvent::WatchStatusChanged(false));
            }
        }
    });

    app.manage(Arc::clone(&surface));
    Ok(surface)
}

/// Start watching on behalf of the main window
pub async fn watch_main_window(app: &AppHandle, manager: &Arc<ClipboardManager>) -> CommandResult<bool> {
    let surface = app
        .try_state::<Arc<WindowSurface>>()
        .map(|state| Arc::clone(state.inner()))
        .ok_or_else(|| CommandError::WindowError("Main window is not bound".to_string()))?;

    let started = manager.start_watching(surface)?;
    if started {
        info!("[Window] Clipboard watcher bound to main window");
        emit_event(app, AppEvent::WatchStatusChanged(true));
    }
    Ok(started)
}

/// Forward every history change to the frontend
pub fn forward_history_events(app: &AppHandle, manager: &ClipboardManager) {
    let handle = app.clone();
    manager.subscribe(move |item| {
        emit_event(&handle, AppEvent::HistoryChanged(item.cloned()));
        Ok(())
    });
}

/// Show the main window if hidden, hide it if shown
pub fn toggle_main_window(app: &AppHandle) {
    let window = match main_window(app) {
        Ok(window) => window,
        Err(e) => {
            warn!("[Window] {}", e);
            return;
        }
    };

    let result = if window.is_visible().unwrap_or(false) {
        window.hide()
    } else {
        window.show().and_then(|_| window.set_focus())
    };
    if let Err(e) = result {
        error!("[Window] Failed to toggle main window: {}", e);
    }
}

/// Register the global shortcut that toggles the main window
pub fn register_toggle_shortcut(app: &AppHandle, accelerator: &str) -> CommandResult<()> {
    let shortcut: Shortcut = accelerator
        .parse()
        .map_err(|e| CommandError::InvalidInput(format!("Invalid shortcut '{}': {}", accelerator, e)))?;

    app.global_shortcut()
        .on_shortcut(shortcut, |app, _shortcut, event| {
            if event.state() == ShortcutState::Pressed {
                toggle_main_window(app);
            }
        })
        .map_err(|e| CommandError::WindowError(format!("Failed to register shortcut '{}': {}", accelerator, e)))?;

    info!("[Window] Registered global shortcut: {}", accelerator);
    Ok(())
}
