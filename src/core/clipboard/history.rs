use log::{debug, error, info, warn};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use super::notifier::HistoryNotifier;
use crate::shared::errors::{CommandError, CommandResult};
use crate::shared::types::{observe_entry_id, ClipboardHistoryItem, EntryId, HistoryRecord};

/// Maximum number of clipboard items to store
pub const MAX_HISTORY: usize = 100;

/// Redb table holding the history record
/// Key: record name, Value: CBOR-encoded HistoryRecord
const CLIPBOARD_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("clipboard_history");
const HISTORY_KEY: &str = "history";

const DB_FILE_NAME: &str = "clipboard_history.redb";

/// Storage trait for clipboard history persistence
///
/// `save` replaces the whole record atomically: after a failed or interrupted
/// save, `load` still returns the previously saved record.
pub trait HistoryStorage: Send + Sync {
    fn load(&self) -> CommandResult<HistoryRecord>;
    fn save(&self, record: &HistoryRecord) -> CommandResult<()>;
}

/// Redb-based storage implementation
pub struct RedbStorage {
    db: Database,
}

impl RedbStorage {
    /// Open (or create) the history database inside `data_dir`
    pub fn new(data_dir: &Path) -> CommandResult<Self> {
        std::fs::create_dir_all(data_dir)
            .map_err(|e| CommandError::SystemIO(format!("Failed to create data directory: {}", e)))?;
        Self::open(&data_dir.join(DB_FILE_NAME))
    }

    pub fn open(db_path: &Path) -> CommandResult<Self> {
        let db = Database::create(db_path)?;

        // Initialize table so readers never see it missing
        {
            let write_txn = db.begin_write()?;
            {
                let _table = write_txn.open_table(CLIPBOARD_TABLE)?;
            }
            write_txn.commit()?;
        }

        Ok(Self { db })
    }
}

impl HistoryStorage for RedbStorage {
    fn load(&self) -> CommandResult<HistoryRecord> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CLIPBOARD_TABLE)?;

        match table.get(HISTORY_KEY)? {
            Some(value) => ciborium::from_reader(value.value())
                .map_err(|e| CommandError::Storage(format!("Deserialization error: {}", e))),
            None => Ok(HistoryRecord::default()),
        }
    }

    fn save(&self, record: &HistoryRecord) -> CommandResult<()> {
        let mut serialized = Vec::new();
        ciborium::into_writer(record, &mut serialized)
            .map_err(|e| CommandError::Storage(format!("Serialization error: {}", e)))?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CLIPBOARD_TABLE)?;
            table.insert(HISTORY_KEY, serialized.as_slice())?;
        }
        write_txn.commit()?;

        Ok(())
    }
}

/// In-memory fallback storage (used if database initialization fails)
#[derive(Default)]
pub struct InMemoryStorage {
    record: Mutex<HistoryRecord>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStorage for InMemoryStorage {
    fn load(&self) -> CommandResult<HistoryRecord> {
        Ok(self.record.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, record: &HistoryRecord) -> CommandResult<()> {
        *self.record.lock().unwrap_or_else(PoisonError::into_inner) = record.clone();
        Ok(())
    }
}

/// Ordered, capacity-bounded clipboard history with persistence
///
/// Index 0 is the most recent capture. Writers are serialised by `write_lock`
/// and observers are notified before it is released, so notification order
/// matches append order. Subscribers must not call back into mutating methods
/// from inside their callback.
pub struct ClipboardHistory {
    storage: Arc<dyn HistoryStorage>,
    /// `None` until the persisted record is first loaded
    entries: RwLock<Option<Vec<ClipboardHistoryItem>>>,
    write_lock: Mutex<()>,
    notifier: HistoryNotifier,
}

impl ClipboardHistory {
    /// Open the on-disk history in `data_dir`, falling back to memory if the database fails
    pub fn open(data_dir: &Path) -> Self {
        let storage: Arc<dyn HistoryStorage> = match RedbStorage::new(data_dir) {
            Ok(s) => Arc::new(s),
            Err(e) => {
                error!("[ClipboardHistory] Failed to initialize database: {}, using in-memory fallback", e);
                Arc::new(InMemoryStorage::new())
            }
        };
        Self::with_storage(storage)
    }

    pub fn in_memory() -> Self {
        Self::with_storage(Arc::new(InMemoryStorage::new()))
    }

    pub fn with_storage(storage: Arc<dyn HistoryStorage>) -> Self {
        Self {
            storage,
            entries: RwLock::new(None),
            write_lock: Mutex::new(()),
            notifier: HistoryNotifier::new(),
        }
    }

    pub fn notifier(&self) -> &HistoryNotifier {
        &self.notifier
    }

    /// Prepend an item, evicting the oldest beyond `MAX_HISTORY`.
    ///
    /// Returns `Ok(false)` when the item repeats the current head (same type
    /// and content) and was dropped. If persisting fails the in-memory history
    /// still holds the item and observers are still notified, but the error
    /// is returned.
    pub fn append(&self, item: ClipboardHistoryItem) -> CommandResult<bool> {
        let _writer = self.lock_writer();
        let mut next = self.current_locked()?;

        if next.first().is_some_and(|head| head.same_payload(&item)) {
            debug!("[ClipboardHistory] Skipping duplicate item");
            return Ok(false);
        }

        next.insert(0, item.clone());
        next.truncate(MAX_HISTORY);

        let persisted = self.commit_locked(next);
        self.notifier.publish(Some(&item));

        match persisted {
            Ok(()) => {
                debug!("[ClipboardHistory] Added item {}", item.id);
                Ok(true)
            }
            Err(e) => {
                warn!("[ClipboardHistory] Item {} kept in memory but not persisted: {}", item.id, e);
                Err(e)
            }
        }
    }

    /// Snapshot of the current history, most recent first
    pub fn get_all(&self) -> CommandResult<Vec<ClipboardHistoryItem>> {
        if let Some(entries) = self.read_entries().as_ref() {
            return Ok(entries.clone());
        }
        let _writer = self.lock_writer();
        self.current_locked()
    }

    /// Get a specific item by index (0 = most recent)
    pub fn get_item(&self, index: usize) -> CommandResult<Option<ClipboardHistoryItem>> {
        Ok(self.get_all()?.into_iter().nth(index))
    }

    pub fn get_item_by_id(&self, id: EntryId) -> CommandResult<Option<ClipboardHistoryItem>> {
        Ok(self.get_all()?.into_iter().find(|item| item.id == id))
    }

    pub fn count(&self) -> CommandResult<usize> {
        Ok(self.get_all()?.len())
    }

    /// Remove every item and notify observers with a clear event
    pub fn clear(&self) -> CommandResult<()> {
        let _writer = self.lock_writer();
        let persisted = self.commit_locked(Vec::new());
        self.notifier.publish(None);

        match persisted {
            Ok(()) => {
                info!("[ClipboardHistory] Cleared all items");
                Ok(())
            }
            Err(e) => {
                warn!("[ClipboardHistory] Cleared in memory but not persisted: {}", e);
                Err(e)
            }
        }
    }

    /// Flip `favorite` on the item with `id`.
    ///
    /// Unknown ids are a silent no-op returning `Ok(false)`. Ordering never changes.
    pub fn toggle_favorite(&self, id: EntryId) -> CommandResult<bool> {
        let _writer = self.lock_writer();
        let mut next = self.current_locked()?;

        let Some(item) = next.iter_mut().find(|item| item.id == id) else {
            debug!("[ClipboardHistory] toggle_favorite: no item {}", id);
            return Ok(false);
        };
        item.favorite = !item.favorite;

        self.commit_locked(next)?;
        Ok(true)
    }

    fn lock_writer(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_entries(&self) -> std::sync::RwLockReadGuard<'_, Option<Vec<ClipboardHistoryItem>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current entries, loading them from storage on first use. Caller holds `write_lock`.
    fn current_locked(&self) -> CommandResult<Vec<ClipboardHistoryItem>> {
        if let Some(entries) = self.read_entries().as_ref() {
            return Ok(entries.clone());
        }

        let mut loaded = self.storage.load()?.history;
        loaded.truncate(MAX_HISTORY);
        if let Some(max_id) = loaded.iter().map(|item| item.id).max() {
            observe_entry_id(max_id);
        }
        info!("[ClipboardHistory] Loaded {} items", loaded.len());

        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = Some(loaded.clone());
        Ok(loaded)
    }

    /// Persist `next`, then publish it to readers. The in-memory swap happens
    /// even if persisting fails. Caller holds `write_lock`.
    fn commit_locked(&self, next: Vec<ClipboardHistoryItem>) -> CommandResult<()> {
        let record = HistoryRecord { history: next };
        let persisted = self.storage.save(&record);
        *self.entries.write().unwrap_or_else(PoisonError::into_inner) = Some(record.history);
        persisted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn text(content: &str) -> ClipboardHistoryItem {
        ClipboardHistoryItem::new_text(content.to_string())
    }

    fn contents(history: &ClipboardHistory) -> Vec<String> {
        history.get_all().unwrap().into_iter().map(|i| i.content).collect()
    }

    /// Storage whose saves can be switched to fail
    #[derive(Default)]
    struct FlakyStorage {
        inner: InMemoryStorage,
        fail_saves: AtomicBool,
        fail_loads: AtomicBool,
        saves: AtomicUsize,
    }

    impl HistoryStorage for FlakyStorage {
        fn load(&self) -> CommandResult<HistoryRecord> {
            if self.fail_loads.load(Ordering::SeqCst) {
                return Err(CommandError::Storage("read failed".to_string()));
            }
            self.inner.load()
        }

        fn save(&self, record: &HistoryRecord) -> CommandResult<()> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(CommandError::Storage("disk full".to_string()));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(record)
        }
    }

    #[test]
    fn test_add_and_get_items() {
        let history = ClipboardHistory::in_memory();

        history.append(text("First item")).unwrap();
        history.append(text("Second item")).unwrap();

        assert_eq!(contents(&history), vec!["Second item", "First item"]);
    }

    #[test]
    fn test_max_history_size() {
        let history = ClipboardHistory::in_memory();

        for i in 0..(MAX_HISTORY + 25) {
            history.append(text(&format!("Item {}", i))).unwrap();
            assert!(history.count().unwrap() <= MAX_HISTORY);
        }

        let items = history.get_all().unwrap();
        assert_eq!(items.len(), MAX_HISTORY);
        assert_eq!(items[0].content, format!("Item {}", MAX_HISTORY + 24));
        assert_eq!(items[MAX_HISTORY - 1].content, "Item 25");
    }

    #[test]
    fn test_skip_consecutive_duplicate() {
        let history = ClipboardHistory::in_memory();

        assert!(history.append(text("Same content")).unwrap());
        assert!(!history.append(text("Same content")).unwrap());

        assert_eq!(history.count().unwrap(), 1);
    }

    #[test]
    fn non_consecutive_repeat_is_kept_and_oldest_evicted_first() {
        let history = ClipboardHistory::in_memory();

        history.append(text("A")).unwrap();
        history.append(text("A")).unwrap();
        assert_eq!(contents(&history), vec!["A"]);

        history.append(text("B")).unwrap();
        assert_eq!(contents(&history), vec!["B", "A"]);

        history.append(text("A")).unwrap();
        assert_eq!(contents(&history), vec!["A", "B", "A"]);

        for i in 0..100 {
            history.append(text(&format!("distinct {}", i))).unwrap();
        }
        let all = contents(&history);
        assert_eq!(all.len(), MAX_HISTORY);
        assert_eq!(all[0], "distinct 99");
        // The first "A", "B" and the repeated "A" have all been pushed out
        assert!(!all.iter().any(|c| c == "A" || c == "B"));
    }

    #[test]
    fn text_and_image_with_same_content_are_distinct() {
        let history = ClipboardHistory::in_memory();
        history.append(text("data:image/png;base64,AAAA")).unwrap();
        assert!(history
            .append(ClipboardHistoryItem::new_image("data:image/png;base64,AAAA".to_string()))
            .unwrap());
        assert_eq!(history.count().unwrap(), 2);
    }

    #[test]
    fn snapshots_are_not_affected_by_later_mutation() {
        let history = ClipboardHistory::in_memory();
        history.append(text("one")).unwrap();
        let snapshot = history.get_all().unwrap();

        history.append(text("two")).unwrap();
        history.toggle_favorite(snapshot[0].id).unwrap();
        history.clear().unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].content, "one");
        assert!(!snapshot[0].favorite);
    }

    #[test]
    fn toggle_favorite_flips_only_the_matching_item() {
        let history = ClipboardHistory::in_memory();
        history.append(text("a")).unwrap();
        history.append(text("b")).unwrap();
        history.append(text("c")).unwrap();
        let before = history.get_all().unwrap();

        assert!(history.toggle_favorite(before[1].id).unwrap());
        let after = history.get_all().unwrap();

        assert_eq!(after.len(), before.len());
        for (old, new) in before.iter().zip(after.iter()) {
            assert_eq!(old.id, new.id);
            assert_eq!(old.content, new.content);
            assert_eq!(old.timestamp, new.timestamp);
            assert_eq!(new.favorite, old.id == before[1].id);
        }

        assert!(history.toggle_favorite(before[1].id).unwrap());
        assert!(!history.get_all().unwrap()[1].favorite);
    }

    #[test]
    fn toggle_unknown_id_is_a_no_op() {
        let storage = Arc::new(FlakyStorage::default());
        let history = ClipboardHistory::with_storage(storage.clone());
        history.append(text("a")).unwrap();
        let before = history.get_all().unwrap();
        let saves = storage.saves.load(Ordering::SeqCst);

        assert!(!history.toggle_favorite(before[0].id + 1_000_000).unwrap());

        assert_eq!(history.get_all().unwrap(), before);
        assert_eq!(storage.saves.load(Ordering::SeqCst), saves);
    }

    #[test]
    fn favorites_are_evicted_like_any_other_item() {
        let history = ClipboardHistory::in_memory();
        history.append(text("keep me")).unwrap();
        let id = history.get_all().unwrap()[0].id;
        history.toggle_favorite(id).unwrap();

        for i in 0..MAX_HISTORY {
            history.append(text(&format!("n{}", i))).unwrap();
        }

        assert!(history.get_item_by_id(id).unwrap().is_none());
    }

    #[test]
    fn test_clear_notifies_once_with_none() {
        let history = ClipboardHistory::in_memory();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        history.notifier().subscribe(move |item| {
            sink.lock().unwrap().push(item.is_some());
            Ok(())
        });

        history.append(text("Item 1")).unwrap();
        history.append(text("Item 2")).unwrap();
        history.clear().unwrap();

        assert_eq!(history.count().unwrap(), 0);
        assert_eq!(*events.lock().unwrap(), vec![true, true, false]);
    }

    #[test]
    fn duplicate_append_does_not_notify() {
        let history = ClipboardHistory::in_memory();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        history.notifier().subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        history.append(text("x")).unwrap();
        history.append(text("x")).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscriber_can_read_history_during_notification() {
        let history = Arc::new(ClipboardHistory::in_memory());
        let seen_len = Arc::new(AtomicUsize::new(0));
        let reader = Arc::clone(&history);
        let sink = Arc::clone(&seen_len);
        history.notifier().subscribe(move |_| {
            sink.store(reader.get_all()?.len(), Ordering::SeqCst);
            Ok(())
        });

        history.append(text("visible")).unwrap();

        assert_eq!(seen_len.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_save_keeps_memory_and_reports_error() {
        let storage = Arc::new(FlakyStorage::default());
        let history = ClipboardHistory::with_storage(storage.clone());
        history.append(text("persisted")).unwrap();

        storage.fail_saves.store(true, Ordering::SeqCst);
        let err = history.append(text("memory only")).unwrap_err();
        assert!(matches!(err, CommandError::Storage(_)));
        assert_eq!(contents(&history), vec!["memory only", "persisted"]);

        // Disk still holds the last good record
        let on_disk: Vec<String> = storage.inner.load().unwrap().history.into_iter().map(|i| i.content).collect();
        assert_eq!(on_disk, vec!["persisted"]);

        storage.fail_saves.store(false, Ordering::SeqCst);
        history.append(text("recovered")).unwrap();
        assert_eq!(storage.inner.load().unwrap().history.len(), 3);
    }

    #[test]
    fn failed_load_is_surfaced_and_retried() {
        let storage = Arc::new(FlakyStorage::default());
        storage.fail_loads.store(true, Ordering::SeqCst);
        let history = ClipboardHistory::with_storage(storage.clone());

        assert!(history.get_all().is_err());

        storage.fail_loads.store(false, Ordering::SeqCst);
        assert!(history.get_all().unwrap().is_empty());
    }

    #[test]
    fn history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let (first_id, favorite_id) = {
            let history = ClipboardHistory::open(dir.path());
            history.append(text("old")).unwrap();
            history.append(text("new")).unwrap();
            let items = history.get_all().unwrap();
            history.toggle_favorite(items[1].id).unwrap();
            (items[0].id, items[1].id)
        };

        let reopened = ClipboardHistory::open(dir.path());
        let items = reopened.get_all().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, first_id);
        assert_eq!(items[0].content, "new");
        assert!(items[1].favorite);
        assert_eq!(items[1].id, favorite_id);

        // Fresh ids continue above the persisted ones
        let fresh = text("newest");
        assert!(fresh.id > first_id);
    }

    #[test]
    fn cleared_history_stays_empty_after_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let history = ClipboardHistory::open(dir.path());
            history.append(text("gone soon")).unwrap();
            history.clear().unwrap();
        }
        assert!(ClipboardHistory::open(dir.path()).get_all().unwrap().is_empty());
    }

    #[test]
    fn uncommitted_write_leaves_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let storage = RedbStorage::new(dir.path()).unwrap();
        let record = HistoryRecord { history: vec![text("committed")] };
        storage.save(&record).unwrap();

        {
            let write_txn = storage.db.begin_write().unwrap();
            {
                let mut table = write_txn.open_table(CLIPBOARD_TABLE).unwrap();
                table.insert(HISTORY_KEY, &b"half-written"[..]).unwrap();
            }
            // Dropped without commit, as if the process died here
        }

        assert_eq!(storage.load().unwrap(), record);
    }

    #[test]
    fn missing_record_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = RedbStorage::new(dir.path()).unwrap();
        assert!(storage.load().unwrap().history.is_empty());
    }
}
