//! Clipboard module
//!
//! Provides clipboard history tracking and monitoring functionality:
//! - `history`: ordered, capped, persisted history with consecutive-duplicate suppression
//! - `monitor`: polling watcher that feeds detected changes into the history
//! - `manager`: the operations exposed to the UI

pub mod filter;
pub mod history;
pub mod manager;
pub mod monitor;
pub mod notifier;
pub mod source;
pub mod surface;

pub use history::{ClipboardHistory, MAX_HISTORY};
pub use manager::ClipboardManager;
pub use monitor::{ClipboardMonitor, TickOutcome, WatcherState};
pub use source::{ArboardClipboard, ClipboardSource, ImageSnapshot, MemoryClipboard};
pub use surface::{HeadlessSurface, Surface};
