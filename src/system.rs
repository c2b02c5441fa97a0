//! Desktop integrations (Tauri window, clipboard plugin, global shortcut)

pub mod clipboard;
pub mod window;
