use serde::{Deserialize, Serialize};
use ts_rs::TS;
use super::types::ClipboardHistoryItem;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "payload")] // Tagged enum for easier frontend parsing
#[ts(export, export_to = "events.ts")]
pub enum AppEvent {
    /// `Some(item)` for a newly prepended entry, `None` when the history was cleared
    #[serde(rename = "clipboard://history-changed")]
    HistoryChanged(Option<ClipboardHistoryItem>),

    #[serde(rename = "clipboard://watch-status")]
    WatchStatusChanged(bool),
}

impl AppEvent {
    /// Channel name the frontend listens on
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::HistoryChanged(_) => "clipboard://history-changed",
            AppEvent::WatchStatusChanged(_) => "clipboard://watch-status",
        }
    }
}
