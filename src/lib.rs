pub mod core;
pub mod shared;

#[cfg(feature = "desktop")]
mod api;
#[cfg(feature = "desktop")]
mod system;

use log::{error, info, warn};
use std::sync::Arc;

use crate::core::clipboard::ClipboardHistory;
use crate::shared::settings::{AppSettings, StorageSettings};

/// Initialize logging (reads RUST_LOG, defaults to info)
fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    if let Err(e) = env_logger::Builder::from_env(env).try_init() {
        eprintln!("Logger already initialized: {}", e);
    }
}

async fn load_settings() -> AppSettings {
    AppSettings::load().await.unwrap_or_else(|e| {
        warn!("[Settings] Failed to load settings, using defaults: {}", e);
        AppSettings::default()
    })
}

fn open_history(storage: &StorageSettings) -> Arc<ClipboardHistory> {
    match storage.resolve_data_dir() {
        Ok(dir) => Arc::new(ClipboardHistory::open(&dir)),
        Err(e) => {
            warn!("[ClipboardHistory] {}, history will not survive restart", e);
            Arc::new(ClipboardHistory::in_memory())
        }
    }
}

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::Manager;

    use crate::core::clipboard::ClipboardManager;
    use crate::system::clipboard::TauriClipboard;
    use crate::system::window::{bind_main_window, forward_history_events, register_toggle_shortcut, watch_main_window};

    init_logging();
    info!("Clipboard history starting up...");

    let settings = tauri::async_runtime::block_on(load_settings());

    tauri::Builder::default()
        .plugin(tauri_plugin_clipboard_manager::init())
        .plugin(tauri_plugin_global_shortcut::Builder::new().build())
        .setup(move |app| {
            let handle = app.handle().clone();

            let history = open_history(&settings.storage);
            let source = Arc::new(TauriClipboard::new(handle.clone()));
            let manager = Arc::new(ClipboardManager::new(history, source, settings.monitor.clone()));
            app.manage(Arc::clone(&manager));

            forward_history_events(&handle, &manager);
            bind_main_window(&handle, &manager)?;

            if let Err(e) = register_toggle_shortcut(&handle, &settings.hotkeys.toggle_window) {
                warn!("[Setup] App will continue without global shortcut: {}", e);
            }

            tauri::async_runtime::spawn(async move {
                if let Err(e) = watch_main_window(&handle, &manager).await {
                    error!("[Setup] Failed to start clipboard watcher: {}", e);
                }
            });

            info!("Clipboard history initialized");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            api::commands::clipboard::get_clipboard_history,
            api::commands::clipboard::clear_clipboard_history,
            api::commands::clipboard::toggle_clipboard_favorite,
            api::commands::clipboard::set_clipboard_content,
            api::commands::clipboard::paste_clipboard_item,
            api::commands::clipboard::start_clipboard_watch,
            api::commands::clipboard::stop_clipboard_watch,
            api::commands::clipboard::get_clipboard_watch_status,
            api::commands::settings::get_settings,
            api::commands::settings::save_settings,
        ])
        .run(tauri::generate_context!())
        .unwrap_or_else(|e| {
            error!("FATAL: Failed to start Tauri application: {}", e);
            std::process::exit(1);
        });
}

/// Headless daemon: watch the system clipboard until Ctrl-C
#[cfg(not(feature = "desktop"))]
pub fn run() {
    init_logging();
    info!("Clipboard history daemon starting up...");

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("FATAL: Failed to start async runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_headless()) {
        error!("FATAL: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "desktop"))]
async fn run_headless() -> shared::CommandResult<()> {
    use crate::core::clipboard::{ArboardClipboard, ClipboardManager, HeadlessSurface};

    let settings = load_settings().await;

    let history = open_history(&settings.storage);
    let mut monitor_settings = settings.monitor.clone();
    // There is no window to hide, keep polling
    monitor_settings.pause_when_hidden = false;
    let manager = ClipboardManager::new(history, Arc::new(ArboardClipboard::new()), monitor_settings);

    manager.subscribe(|item| {
        match item {
            Some(item) => info!(
                "[Daemon] Captured {:?} entry {} ({} bytes)",
                item.item_type,
                item.id,
                item.content.len()
            ),
            None => info!("[Daemon] History cleared"),
        }
        Ok(())
    });

    manager.start_watching(Arc::new(HeadlessSurface::new()))?;
    info!(
        "[Daemon] Watching clipboard every {:?}, {} entries loaded",
        settings.monitor.poll_interval(),
        manager.history().count()?
    );

    tokio::signal::ctrl_c().await?;

    info!("[Daemon] Shutting down");
    manager.stop_watching();
    Ok(())
}
