//! Tauri IPC surface

pub mod commands;
