//! Operations the UI calls against the clipboard history
//!
//! `ClipboardManager` bundles the history, the watcher and the clipboard
//! source behind the calls a frontend needs. It knows nothing about Tauri;
//! `api::commands::clipboard` wraps it for IPC.

use log::{info, warn};
use std::sync::{Arc, Mutex, PoisonError};

use super::history::ClipboardHistory;
use super::monitor::{ClipboardMonitor, WatcherState};
use super::notifier::SubscriptionId;
use super::source::ClipboardSource;
use super::surface::Surface;
use crate::shared::errors::CommandResult;
use crate::shared::settings::MonitorSettings;
use crate::shared::types::{ClipboardHistoryItem, EntryId};

pub struct ClipboardManager {
    history: Arc<ClipboardHistory>,
    source: Arc<dyn ClipboardSource>,
    monitor: ClipboardMonitor,
    surface: Mutex<Option<Arc<dyn Surface>>>,
}

impl ClipboardManager {
    pub fn new(
        history: Arc<ClipboardHistory>,
        source: Arc<dyn ClipboardSource>,
        settings: MonitorSettings,
    ) -> Self {
        let monitor = ClipboardMonitor::new(Arc::clone(&history), Arc::clone(&source), settings);
        Self {
            history,
            source,
            monitor,
            surface: Mutex::new(None),
        }
    }

    pub fn history(&self) -> &Arc<ClipboardHistory> {
        &self.history
    }

    /// Begin watching the clipboard on behalf of `surface`. No-op if already watching.
    pub fn start_watching(&self, surface: Arc<dyn Surface>) -> CommandResult<bool> {
        let started = self.monitor.start(Arc::clone(&surface))?;
        if started {
            *self.surface.lock().unwrap_or_else(PoisonError::into_inner) = Some(surface);
        }
        Ok(started)
    }

    pub fn stop_watching(&self) -> bool {
        *self.surface.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.monitor.stop()
    }

    pub fn watch_state(&self) -> WatcherState {
        self.monitor.state()
    }

    pub fn get_history(&self) -> CommandResult<Vec<ClipboardHistoryItem>> {
        self.history.get_all()
    }

    pub fn clear_history(&self) -> CommandResult<()> {
        self.history.clear()
    }

    /// Returns false for an unknown id
    pub fn toggle_favorite(&self, id: EntryId) -> CommandResult<bool> {
        self.history.toggle_favorite(id)
    }

    /// Put `content` on the system clipboard as text
    pub fn set_clipboard_content(&self, content: &str) -> CommandResult<()> {
        self.source.write_text(content)
    }

    /// Copy the entry at `index` (0 = most recent) back to the clipboard and dismiss the UI.
    ///
    /// Out-of-range indexes and image entries write nothing and return `Ok(false)`.
    pub fn reapply(&self, index: usize) -> CommandResult<bool> {
        let item = self.history.get_item(index)?;
        self.write_back(item)
    }

    /// Same as [`reapply`](Self::reapply), selecting the entry by id
    pub fn paste_item(&self, id: EntryId) -> CommandResult<bool> {
        let item = self.history.get_item_by_id(id)?;
        self.write_back(item)
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(Option<&ClipboardHistoryItem>) -> CommandResult<()> + Send + Sync + 'static,
    {
        self.history.notifier().subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.history.notifier().unsubscribe(id)
    }

    fn write_back(&self, item: Option<ClipboardHistoryItem>) -> CommandResult<bool> {
        let Some(item) = item else {
            return Ok(false);
        };
        if !item.is_text() {
            info!("[ClipboardManager] Item {} is an image, not writing back", item.id);
            return Ok(false);
        }

        self.source.write_text(&item.content)?;
        info!("[ClipboardManager] Wrote item {} back to clipboard", item.id);

        let surface = self.surface.lock().unwrap_or_else(PoisonError::into_inner).clone();
        if let Some(surface) = surface {
            if let Err(e) = surface.dismiss() {
                warn!("[ClipboardManager] Failed to dismiss surface: {}", e);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clipboard::source::MemoryClipboard;
    use crate::core::clipboard::surface::HeadlessSurface;
    use std::time::Duration;

    fn manager() -> (ClipboardManager, Arc<MemoryClipboard>) {
        let clipboard = Arc::new(MemoryClipboard::new());
        let manager = ClipboardManager::new(
            Arc::new(ClipboardHistory::in_memory()),
            clipboard.clone(),
            MonitorSettings::default(),
        );
        (manager, clipboard)
    }

    #[test]
    fn reapply_on_empty_history_writes_nothing() {
        let (manager, clipboard) = manager();
        assert!(!manager.reapply(0).unwrap());
        assert!(clipboard.writes().is_empty());
    }

    #[test]
    fn reapply_out_of_range_writes_nothing() {
        let (manager, clipboard) = manager();
        manager.history().append(ClipboardHistoryItem::new_text("only".to_string())).unwrap();
        assert!(!manager.reapply(1).unwrap());
        assert!(clipboard.writes().is_empty());
    }

    #[test]
    fn reapply_skips_images() {
        let (manager, clipboard) = manager();
        manager
            .history()
            .append(ClipboardHistoryItem::new_image("data:image/png;base64,AAAA".to_string()))
            .unwrap();
        assert!(!manager.reapply(0).unwrap());
        assert!(clipboard.writes().is_empty());
    }

    #[test]
    fn paste_unknown_id_writes_nothing() {
        let (manager, clipboard) = manager();
        assert!(!manager.paste_item(42).unwrap());
        assert!(clipboard.writes().is_empty());
    }

    #[test]
    fn set_clipboard_content_writes_text() {
        let (manager, clipboard) = manager();
        manager.set_clipboard_content("typed").unwrap();
        assert_eq!(clipboard.writes(), vec!["typed"]);
    }

    #[test]
    fn clear_then_get_returns_empty_with_one_clear_event() {
        let (manager, _) = manager();
        let clears = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&clears);
        manager.subscribe(move |item| {
            if item.is_none() {
                *sink.lock().unwrap() += 1;
            }
            Ok(())
        });
        manager.history().append(ClipboardHistoryItem::new_text("x".to_string())).unwrap();

        manager.clear_history().unwrap();

        assert!(manager.get_history().unwrap().is_empty());
        assert_eq!(*clears.lock().unwrap(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let (manager, _) = manager();
        let hits = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&hits);
        let id = manager.subscribe(move |_| {
            *sink.lock().unwrap() += 1;
            Ok(())
        });
        assert!(manager.unsubscribe(id));
        manager.clear_history().unwrap();
        assert_eq!(*hits.lock().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reapplied_entry_is_written_dismissed_and_recaptured_at_head() {
        let (manager, clipboard) = manager();
        let surface = Arc::new(HeadlessSurface::new());
        assert!(manager.start_watching(surface.clone()).unwrap());
        assert!(!manager.start_watching(surface.clone()).unwrap());

        for text in ["first", "second"] {
            clipboard.copy_text(text);
            tokio::time::sleep(Duration::from_millis(510)).await;
        }

        assert!(manager.reapply(1).unwrap());
        assert_eq!(clipboard.writes(), vec!["first"]);
        assert_eq!(surface.dismissals(), 1);

        tokio::time::sleep(Duration::from_millis(510)).await;
        let contents: Vec<String> = manager.get_history().unwrap().into_iter().map(|i| i.content).collect();
        assert_eq!(contents, vec!["first", "second", "first"]);

        assert!(manager.stop_watching());
        assert_eq!(manager.watch_state(), WatcherState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn one_surface_serves_every_watch_cycle() {
        let (manager, clipboard) = manager();
        let surface = Arc::new(HeadlessSurface::new());

        for round in 0..3 {
            assert!(manager.start_watching(surface.clone()).unwrap());
            clipboard.copy_text(&format!("round {}", round));
            tokio::time::sleep(Duration::from_millis(510)).await;
            assert!(manager.stop_watching());
        }

        // Stopping releases every reference the watcher took
        assert_eq!(Arc::strong_count(&surface), 1);
        let contents: Vec<String> = manager.get_history().unwrap().into_iter().map(|i| i.content).collect();
        assert_eq!(contents, vec!["round 2", "round 1", "round 0"]);
    }

    #[tokio::test(start_paused = true)]
    async fn favorite_toggle_through_manager() {
        let (manager, clipboard) = manager();
        assert!(manager.start_watching(Arc::new(HeadlessSurface::new())).unwrap());
        clipboard.copy_text("star me");
        tokio::time::sleep(Duration::from_millis(510)).await;

        let id = manager.get_history().unwrap()[0].id;
        assert!(manager.toggle_favorite(id).unwrap());
        assert!(manager.get_history().unwrap()[0].favorite);
        assert!(!manager.toggle_favorite(id + 1).unwrap());
    }
}
