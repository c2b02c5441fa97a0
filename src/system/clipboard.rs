//! Clipboard source backed by the Tauri clipboard plugin

use log::debug;
use tauri::AppHandle;
use tauri_plugin_clipboard_manager::ClipboardExt;

use crate::core::clipboard::source::is_content_not_available;
use crate::core::clipboard::{ClipboardSource, ImageSnapshot};
use crate::shared::errors::{CommandError, CommandResult};

pub struct TauriClipboard {
    app: AppHandle,
}

impl TauriClipboard {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }
}

// The plugin reports an empty clipboard as an error. Only that case reads as
// empty; anything else fails the tick so the baseline is left alone.
fn read_failed(what: &str, err: tauri_plugin_clipboard_manager::Error) -> CommandResult<()> {
    let message = err.to_string();
    if is_content_not_available(&message) {
        debug!("[TauriClipboard] No {} available", what);
        Ok(())
    } else {
        Err(CommandError::ClipboardError(format!("Failed to read {}: {}", what, message)))
    }
}

impl ClipboardSource for TauriClipboard {
    fn read_text(&self) -> CommandResult<String> {
        match self.app.clipboard().read_text() {
            Ok(text) => Ok(text),
            Err(e) => read_failed("text", e).map(|_| String::new()),
        }
    }

    fn read_image(&self) -> CommandResult<ImageSnapshot> {
        match self.app.clipboard().read_image() {
            Ok(image) => Ok(ImageSnapshot::from_rgba(
                image.width() as usize,
                image.height() as usize,
                image.rgba().to_vec(),
            )),
            Err(e) => read_failed("image", e).map(|_| ImageSnapshot::empty()),
        }
    }

    fn write_text(&self, content: &str) -> CommandResult<()> {
        self.app
            .clipboard()
            .write_text(content.to_string())
            .map_err(|e| CommandError::ClipboardError(format!("Failed to write to clipboard: {}", e)))
    }
}
