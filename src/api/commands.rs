//! Command modules for the Tauri application
//!
//! - `clipboard`: history queries, write-back and watcher lifecycle
//! - `settings`: settings persistence

pub mod clipboard;
pub mod settings;
