use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use ts_rs::TS;

/// Stable key of a history entry: milliseconds since the epoch, strictly increasing.
pub type EntryId = u64;

static LAST_ISSUED_ID: AtomicU64 = AtomicU64::new(0);

/// Issue a fresh entry id.
///
/// Uses the wall clock in milliseconds, bumped past the last issued id so two
/// captures in the same millisecond (or a clock stepping backwards) never
/// collide.
pub fn next_entry_id() -> EntryId {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let mut prev = LAST_ISSUED_ID.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST_ISSUED_ID.compare_exchange_weak(prev, next, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

/// Record an id loaded from disk so later ids are issued above it.
pub fn observe_entry_id(id: EntryId) {
    LAST_ISSUED_ID.fetch_max(id, Ordering::SeqCst);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "clipboard.ts")]
pub enum ClipboardItemType {
    Text,
    Image,
}

/// One captured clipboard snapshot.
///
/// `id`, `timestamp`, `type` and `content` never change after construction;
/// only `favorite` is flipped by the user.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "clipboard.ts")]
pub struct ClipboardHistoryItem {
    #[ts(type = "number")]
    pub id: EntryId,
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub item_type: ClipboardItemType,
    /// Raw text, or a `data:image/png;base64,...` URI for images
    pub content: String,
    #[serde(default)]
    pub favorite: bool,
}

// SECURITY: Custom Debug implementation to prevent clipboard content from leaking into logs
impl std::fmt::Debug for ClipboardHistoryItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipboardHistoryItem")
            .field("id", &self.id)
            .field("timestamp", &self.timestamp)
            .field("item_type", &self.item_type)
            .field("content", &format!("[REDACTED {} chars]", self.content.len()))
            .field("favorite", &self.favorite)
            .finish()
    }
}

impl ClipboardHistoryItem {
    /// Create a new text clipboard item
    pub fn new_text(content: String) -> Self {
        Self::new(ClipboardItemType::Text, content)
    }

    /// Create a new image clipboard item from an embeddable data URI
    pub fn new_image(data_uri: String) -> Self {
        Self::new(ClipboardItemType::Image, data_uri)
    }

    fn new(item_type: ClipboardItemType, content: String) -> Self {
        Self {
            id: next_entry_id(),
            timestamp: Utc::now(),
            item_type,
            content,
            favorite: false,
        }
    }

    /// Two items carry the same payload when type and content match, regardless of id.
    pub fn same_payload(&self, other: &Self) -> bool {
        self.item_type == other.item_type && self.content == other.content
    }

    pub fn is_text(&self) -> bool {
        self.item_type == ClipboardItemType::Text
    }
}

/// Persisted layout of the history: a single record holding the ordered entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(default)]
    pub history: Vec<ClipboardHistoryItem>,
}
