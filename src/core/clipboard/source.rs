//! Clipboard source port
//!
//! The monitor only ever talks to the system clipboard through
//! [`ClipboardSource`], so it can run against arboard, the Tauri clipboard
//! plugin, or an in-process clipboard in tests.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::io::Cursor;
use std::sync::{Mutex, PoisonError};

use crate::shared::errors::{CommandError, CommandResult};

/// Raw RGBA image currently on the clipboard
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ImageSnapshot {
    width: usize,
    height: usize,
    rgba: Vec<u8>,
}

impl std::fmt::Debug for ImageSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSnapshot")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

impl ImageSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_rgba(width: usize, height: usize, rgba: Vec<u8>) -> Self {
        Self { width, height, rgba }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.rgba.is_empty()
    }

    /// Cheap identity for change detection, without encoding the image
    pub fn fingerprint(&self) -> String {
        format!("{}x{}:{:x}", self.width, self.height, md5::compute(&self.rgba))
    }

    /// Encode as a self-contained `data:image/png;base64,...` URI
    pub fn to_data_uri(&self) -> CommandResult<String> {
        let width = u32::try_from(self.width)
            .map_err(|_| CommandError::ClipboardError(format!("Image width {} is too large", self.width)))?;
        let height = u32::try_from(self.height)
            .map_err(|_| CommandError::ClipboardError(format!("Image height {} is too large", self.height)))?;
        let buffer = image::RgbaImage::from_raw(width, height, self.rgba.clone())
            .ok_or_else(|| CommandError::ClipboardError("Image bytes do not match its dimensions".to_string()))?;

        let mut png = Cursor::new(Vec::new());
        buffer
            .write_to(&mut png, image::ImageFormat::Png)
            .map_err(|e| CommandError::ClipboardError(format!("Failed to encode image: {}", e)))?;

        Ok(format!("data:image/png;base64,{}", STANDARD.encode(png.into_inner())))
    }
}

/// Read/write access to the system clipboard
pub trait ClipboardSource: Send + Sync {
    /// Current text, empty when the clipboard holds no text
    fn read_text(&self) -> CommandResult<String>;

    /// Current image, empty when the clipboard holds no image
    fn read_image(&self) -> CommandResult<ImageSnapshot>;

    fn write_text(&self, content: &str) -> CommandResult<()>;
}

/// Cross-platform clipboard adapter using arboard
#[derive(Debug, Default)]
pub struct ArboardClipboard;

impl ArboardClipboard {
    pub fn new() -> Self {
        Self
    }

    fn open() -> CommandResult<arboard::Clipboard> {
        arboard::Clipboard::new()
            .map_err(|e| CommandError::ClipboardError(format!("Clipboard unavailable: {}", e)))
    }
}

/// True when a clipboard error only means "nothing in that format".
///
/// Adapters that see arboard errors as text (the Tauri clipboard plugin
/// stringifies them) use this to tell an empty clipboard from a locked one.
pub fn is_content_not_available(message: &str) -> bool {
    message.contains(&arboard::Error::ContentNotAvailable.to_string())
}

impl ClipboardSource for ArboardClipboard {
    fn read_text(&self) -> CommandResult<String> {
        match Self::open()?.get_text() {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(CommandError::ClipboardError(format!("Failed to read text: {}", e))),
        }
    }

    fn read_image(&self) -> CommandResult<ImageSnapshot> {
        match Self::open()?.get_image() {
            Ok(image) => Ok(ImageSnapshot::from_rgba(image.width, image.height, image.bytes.into_owned())),
            Err(arboard::Error::ContentNotAvailable) => Ok(ImageSnapshot::empty()),
            Err(e) => Err(CommandError::ClipboardError(format!("Failed to read image: {}", e))),
        }
    }

    fn write_text(&self, content: &str) -> CommandResult<()> {
        Self::open()?
            .set_text(content)
            .map_err(|e| CommandError::ClipboardError(format!("Failed to write text: {}", e)))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    text: String,
    image: ImageSnapshot,
    unavailable: bool,
    writes: Vec<String>,
}

/// In-process clipboard, for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    state: Mutex<MemoryState>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulate a copy of text from another application (clears any image)
    pub fn copy_text(&self, text: &str) {
        let mut state = self.state();
        state.text = text.to_string();
        state.image = ImageSnapshot::empty();
    }

    /// Simulate a copy of an image from another application (clears any text)
    pub fn copy_image(&self, image: ImageSnapshot) {
        let mut state = self.state();
        state.text.clear();
        state.image = image;
    }

    /// While set, every read fails as if the clipboard were locked by another process
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Everything written through [`ClipboardSource::write_text`], oldest first
    pub fn writes(&self) -> Vec<String> {
        self.state().writes.clone()
    }
}

impl ClipboardSource for MemoryClipboard {
    fn read_text(&self) -> CommandResult<String> {
        let state = self.state();
        if state.unavailable {
            return Err(CommandError::ClipboardError("Clipboard unavailable".to_string()));
        }
        Ok(state.text.clone())
    }

    fn read_image(&self) -> CommandResult<ImageSnapshot> {
        let state = self.state();
        if state.unavailable {
            return Err(CommandError::ClipboardError("Clipboard unavailable".to_string()));
        }
        Ok(state.image.clone())
    }

    fn write_text(&self, content: &str) -> CommandResult<()> {
        let mut state = self.state();
        state.text = content.to_string();
        state.image = ImageSnapshot::empty();
        state.writes.push(content.to_string());
        Ok(())
    }
}
