use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use ts_rs::TS;

use super::filter;
use super::history::ClipboardHistory;
use super::source::ClipboardSource;
use super::surface::Surface;
use crate::shared::errors::{CommandError, CommandResult};
use crate::shared::settings::MonitorSettings;
use crate::shared::types::{ClipboardHistoryItem, EntryId};

const ERROR_LOG_EVERY: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "clipboard.ts")]
pub enum WatcherState {
    /// Not polling
    Idle,
    /// Polling on every interval
    Active,
    /// Started, but the surface is hidden so ticks are skipped
    Suspended,
}

/// What a single poll did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Watcher idle or surface hidden
    Skipped,
    /// Surface destroyed; the watcher went idle
    Stopped,
    Unchanged,
    /// New text looked like a credential
    Filtered,
    /// History already had this payload at its head
    Duplicate,
    /// Change detected but the entry could not be built
    Dropped,
    Captured(EntryId),
}

/// Last snapshot compared against. Lives only in memory.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct LastObserved {
    text: String,
    image: Option<String>,
}

struct WatcherCore {
    history: Arc<ClipboardHistory>,
    source: Arc<dyn ClipboardSource>,
    settings: MonitorSettings,
    state: Mutex<WatcherState>,
    last_observed: Mutex<LastObserved>,
    surface: Mutex<Option<Arc<dyn Surface>>>,
    /// Held while a tick reads the clipboard and appends; `stop` takes it so no
    /// append lands after `stop` returns
    tick_lock: Mutex<()>,
    /// Bumped by every `start` and `stop`
    generation: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl WatcherCore {
    fn set_state(&self, next: WatcherState) {
        let mut state = lock(&self.state);
        if *state != next {
            debug!("[ClipboardMonitor] {:?} -> {:?}", *state, next);
            *state = next;
        }
    }

    fn tick(&self) -> CommandResult<TickOutcome> {
        let generation = self.generation.load(Ordering::SeqCst);
        if *lock(&self.state) == WatcherState::Idle {
            return Ok(TickOutcome::Skipped);
        }

        // Window queries can wait on the UI thread, and the UI thread may be
        // inside `stop`, so the surface is asked before `tick_lock` is taken.
        let surface = lock(&self.surface).clone();
        let destroyed = surface.as_ref().map_or(true, |s| s.is_destroyed());
        let hidden = !destroyed
            && self.settings.pause_when_hidden
            && surface.as_ref().is_some_and(|s| !s.is_visible());
        drop(surface);

        let _running = lock(&self.tick_lock);

        // Stopped or restarted while the surface was being asked
        if self.generation.load(Ordering::SeqCst) != generation || *lock(&self.state) == WatcherState::Idle {
            return Ok(TickOutcome::Skipped);
        }

        if destroyed {
            info!("[ClipboardMonitor] Surface gone, stopping");
            *lock(&self.surface) = None;
            self.set_state(WatcherState::Idle);
            return Ok(TickOutcome::Stopped);
        }

        if hidden {
            self.set_state(WatcherState::Suspended);
            return Ok(TickOutcome::Skipped);
        }
        self.set_state(WatcherState::Active);

        let text = self.source.read_text()?;
        let image = if self.settings.capture_images {
            self.source.read_image()?
        } else {
            Default::default()
        };
        let image_fingerprint = (!image.is_empty()).then(|| image.fingerprint());

        let (text_changed, image_changed) = {
            let mut last = lock(&self.last_observed);
            let text_changed = text != last.text;
            let image_changed = image_fingerprint.is_some() && image_fingerprint != last.image;
            if !text_changed && !image_changed {
                return Ok(TickOutcome::Unchanged);
            }
            last.text = text.clone();
            last.image = image_fingerprint;
            (text_changed, image_changed)
        };

        // Text wins when both changed in the same tick
        let item = if text_changed && !text.is_empty() {
            if self.settings.ignore_sensitive && filter::is_sensitive(&text) {
                warn!("[ClipboardMonitor] Sensitive content detected, not recording");
                return Ok(TickOutcome::Filtered);
            }
            ClipboardHistoryItem::new_text(text)
        } else if image_changed {
            match image.to_data_uri() {
                Ok(uri) => ClipboardHistoryItem::new_image(uri),
                Err(e) => {
                    warn!("[ClipboardMonitor] Dropping image capture: {}", e);
                    return Ok(TickOutcome::Dropped);
                }
            }
        } else {
            return Ok(TickOutcome::Unchanged);
        };

        let id = item.id;
        let chars = item.content.len();
        match self.history.append(item) {
            Ok(true) => {
                info!("[ClipboardMonitor] Captured item {} ({} chars)", id, chars);
                Ok(TickOutcome::Captured(id))
            }
            Ok(false) => Ok(TickOutcome::Duplicate),
            Err(e) => {
                // The item is in the in-memory history; only the disk write failed
                warn!("[ClipboardMonitor] Captured item {} but failed to persist: {}", id, e);
                Ok(TickOutcome::Captured(id))
            }
        }
    }
}

async fn watch_loop(core: Arc<WatcherCore>, cancel: CancellationToken) {
    let mut ticker = interval(core.settings.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut consecutive_errors = 0u32;

    info!("[ClipboardMonitor] Started monitoring every {:?}", core.settings.poll_interval());

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                match core.tick() {
                    Ok(TickOutcome::Stopped) => break,
                    Ok(_) => consecutive_errors = 0,
                    Err(e) => {
                        consecutive_errors += 1;
                        // Only log errors occasionally to avoid spam
                        if consecutive_errors == 1 || consecutive_errors % ERROR_LOG_EVERY == 0 {
                            error!("[ClipboardMonitor] Failed to read clipboard (error #{}): {}", consecutive_errors, e);
                        }
                    }
                }
            }
        }
    }

    info!("[ClipboardMonitor] Stopped monitoring");
}

struct WatchTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Clipboard watcher with an explicit lifecycle: `new`, `start`, `stop`, `dispose`.
///
/// While started it polls the source on a fixed interval, appends every
/// detected change to the history and pauses while the bound surface is
/// hidden. Dropping the watcher stops it.
pub struct ClipboardMonitor {
    core: Arc<WatcherCore>,
    task: Mutex<Option<WatchTask>>,
}

impl ClipboardMonitor {
    pub fn new(
        history: Arc<ClipboardHistory>,
        source: Arc<dyn ClipboardSource>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            core: Arc::new(WatcherCore {
                history,
                source,
                settings,
                state: Mutex::new(WatcherState::Idle),
                last_observed: Mutex::new(LastObserved::default()),
                surface: Mutex::new(None),
                tick_lock: Mutex::new(()),
                generation: AtomicU64::new(0),
            }),
            task: Mutex::new(None),
        }
    }

    /// Start polling on the current tokio runtime, bound to `surface`.
    ///
    /// Returns `Ok(false)` if already started. Each start begins from an empty
    /// baseline, so whatever is on the clipboard is offered to the history on
    /// the first tick (the history drops it if it repeats the head).
    pub fn start(&self, surface: Arc<dyn Surface>) -> CommandResult<bool> {
        let mut task = lock(&self.task);
        if self.state() != WatcherState::Idle {
            debug!("[ClipboardMonitor] Already started");
            return Ok(false);
        }
        if surface.is_destroyed() {
            return Err(CommandError::WindowError("Cannot watch a destroyed surface".to_string()));
        }
        let runtime = Handle::try_current()
            .map_err(|e| CommandError::Unknown(format!("No async runtime to poll on: {}", e)))?;

        // A loop that ended on its own (surface destroyed) leaves its handle behind
        if let Some(old) = task.take() {
            old.cancel.cancel();
            old.handle.abort();
        }

        {
            let _idle = lock(&self.core.tick_lock);
            self.core.generation.fetch_add(1, Ordering::SeqCst);
            *lock(&self.core.last_observed) = LastObserved::default();
            *lock(&self.core.surface) = Some(surface);
            self.core.set_state(WatcherState::Active);
        }

        let cancel = CancellationToken::new();
        let handle = runtime.spawn(watch_loop(Arc::clone(&self.core), cancel.clone()));
        *task = Some(WatchTask { cancel, handle });
        Ok(true)
    }

    /// Stop polling. Idempotent; returns false if the watcher was already idle.
    ///
    /// No append happens after this returns. It never waits on the surface, so
    /// it is safe to call from the UI thread. Must not be called from a history
    /// subscriber, which runs inside a tick.
    pub fn stop(&self) -> bool {
        let was_running = self.state() != WatcherState::Idle;

        if let Some(task) = lock(&self.task).take() {
            task.cancel.cancel();
            task.handle.abort();
        }

        let _idle = lock(&self.core.tick_lock);
        self.core.generation.fetch_add(1, Ordering::SeqCst);
        *lock(&self.core.surface) = None;
        self.core.set_state(WatcherState::Idle);

        if was_running {
            info!("[ClipboardMonitor] Stopped");
        }
        was_running
    }

    /// Stop and release the watcher
    pub fn dispose(self) {
        self.stop();
    }

    pub fn state(&self) -> WatcherState {
        *lock(&self.core.state)
    }

    pub fn is_active(&self) -> bool {
        self.state() != WatcherState::Idle
    }

    /// Run one tick now, outside the timer
    pub fn poll_once(&self) -> CommandResult<TickOutcome> {
        self.core.tick()
    }

    pub fn history(&self) -> &Arc<ClipboardHistory> {
        &self.core.history
    }
}

impl Drop for ClipboardMonitor {
    fn drop(&mut self) {
        if let Some(task) = lock(&self.task).take() {
            task.cancel.cancel();
            task.handle.abort();
        }
    }
}
