//! Save orchestration: debounced autosave, manual save, one save in flight.
//!
//! ```text
//!   edit ──► schedule() ──► [quiet window] ──► save(Auto)
//!   edit ──► schedule()  (aborts the pending timer, re-arms)
//!   user ──► save(Manual) ──► update_profile ──► record_saved + toast
//! ```
//!
//! A request that arrives while a save is in flight is dropped. When the
//! in-flight save finishes, a dropped request re-arms the autosave timer so
//! the latest document still reaches the profile service.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::editor::blocks::Document;
use crate::editor::payload::flatten_document;
use crate::editor::store::BlockStore;
use crate::notifications::{Notification, NotificationSink};
use crate::profile_client::ProfileStore;

pub type SharedStore = Arc<Mutex<BlockStore>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveTrigger {
    Auto,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Nothing changed since the last clean snapshot.
    Clean,
    /// Another save was running; this request was dropped.
    InFlight,
}

/// What happened to a save request. Collaborator failures are reported
/// here, never as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveOutcome {
    Saved,
    Skipped { reason: SkipReason },
    Failed { message: String },
}

struct PendingAutosave {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Inner {
    store: SharedStore,
    profiles: Arc<dyn ProfileStore>,
    notifier: Arc<dyn NotificationSink>,
    quiet_window: Duration,
    flight: StdMutex<Flight>,
    /// Woken whenever a save leaves flight.
    landed: Notify,
    closed: AtomicBool,
    generation: AtomicU64,
    pending: StdMutex<Option<PendingAutosave>>,
}

/// In-flight state. Both flags change under one lock so a request dropped
/// at the very end of a save is never missed.
#[derive(Default)]
struct Flight {
    saving: bool,
    dropped: bool,
}

/// Ends the flight however the save ends, including unwinding.
struct FlightGuard<'a> {
    inner: &'a Inner,
    landed: bool,
}

impl FlightGuard<'_> {
    /// Clears `saving` and reports whether a request was dropped meanwhile.
    fn land(mut self) -> bool {
        self.landed = true;
        let dropped = {
            let mut flight = self.inner.flight();
            flight.saving = false;
            std::mem::take(&mut flight.dropped)
        };
        self.inner.landed.notify_waiters();
        dropped
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.landed {
            self.inner.flight().saving = false;
            self.inner.landed.notify_waiters();
        }
    }
}

impl Inner {
    fn flight(&self) -> MutexGuard<'_, Flight> {
        self.flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Clone)]
pub struct SaveOrchestrator {
    inner: Arc<Inner>,
}

impl SaveOrchestrator {
    pub fn new(
        store: SharedStore,
        profiles: Arc<dyn ProfileStore>,
        notifier: Arc<dyn NotificationSink>,
        quiet_window: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                profiles,
                notifier,
                quiet_window,
                flight: StdMutex::new(Flight::default()),
                landed: Notify::new(),
                closed: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                pending: StdMutex::new(None),
            }),
        }
    }

    pub fn is_saving(&self) -> bool {
        self.inner.flight().saving
    }

    pub fn has_pending_autosave(&self) -> bool {
        self.pending().is_some()
    }

    /// (Re)starts the quiet-window timer. Any timer that has not fired yet
    /// is aborted; a save already running is left alone.
    pub fn schedule(&self) {
        if self.inner.closed.load(Ordering::Acquire) {
            debug!("Orchestrator closed, not arming autosave");
            return;
        }
        let generation = self.inner.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let quiet_window = self.inner.quiet_window;

        // Hold the slot while spawning so the timer cannot claim itself
        // before it is registered.
        let mut pending = self.pending();
        let this = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(quiet_window).await;
            if this.claim_pending(generation) {
                this.save(SaveTrigger::Auto).await;
            }
        });
        if let Some(previous) = pending.replace(PendingAutosave { generation, handle }) {
            previous.handle.abort();
        }
        debug!("Autosave armed ({}ms)", quiet_window.as_millis());
    }

    /// Aborts the pending autosave timer, if any.
    pub fn cancel(&self) {
        if let Some(previous) = self.pending().take() {
            previous.handle.abort();
            debug!("Autosave timer cancelled");
        }
    }

    /// Saves the current document.
    ///
    /// Skipped when the document is clean or another save is in flight.
    /// A manual save also cancels the pending autosave timer, since it
    /// covers the same edits.
    pub async fn save(&self, trigger: SaveTrigger) -> SaveOutcome {
        if trigger == SaveTrigger::Manual {
            self.cancel();
        }

        let document = {
            let store = self.inner.store.lock().await;
            if !store.is_dirty() {
                debug!("Skipping {trigger:?} save: document is clean");
                return SaveOutcome::Skipped {
                    reason: SkipReason::Clean,
                };
            }
            store.document().clone()
        };

        {
            let mut flight = self.inner.flight();
            if flight.saving {
                flight.dropped = true;
                warn!("Save already in flight, dropping {trigger:?} save");
                return SaveOutcome::Skipped {
                    reason: SkipReason::InFlight,
                };
            }
            flight.saving = true;
        }

        let guard = FlightGuard {
            inner: &self.inner,
            landed: false,
        };
        let outcome = self.persist(trigger, document).await;
        let dropped = guard.land();

        if dropped {
            info!("Re-arming autosave for a request dropped during the last save");
            self.schedule();
        }

        outcome
    }

    /// Stops autosaving for good and flushes what is left.
    ///
    /// Waits for a save already in flight, then saves any changes that are
    /// still unsaved. Returns `None` when there was nothing to flush.
    pub async fn close(&self) -> Option<SaveOutcome> {
        self.inner.closed.store(true, Ordering::Release);
        self.cancel();

        let waited = self.wait_until_landed().await;
        match self.save(SaveTrigger::Auto).await {
            SaveOutcome::Skipped {
                reason: SkipReason::Clean,
            } => {
                // The save we waited for already stored everything.
                waited.then_some(SaveOutcome::Saved)
            }
            outcome => Some(outcome),
        }
    }

    /// Waits until no save is in flight. Returns whether it had to wait.
    async fn wait_until_landed(&self) -> bool {
        let mut waited = false;
        loop {
            let landed = self.inner.landed.notified();
            tokio::pin!(landed);
            landed.as_mut().enable();
            if !self.is_saving() {
                return waited;
            }
            waited = true;
            debug!("Waiting for the in-flight save to land");
            landed.await;
        }
    }

    async fn persist(&self, trigger: SaveTrigger, document: Document) -> SaveOutcome {
        let payload = flatten_document(&document);

        match self.inner.profiles.update_profile(&payload).await {
            Ok(_) => {
                self.inner.store.lock().await.record_saved(&document);
                info!("{trigger:?} save stored {} blocks", document.len());
                if trigger == SaveTrigger::Manual {
                    self.inner.notifier.notify(Notification::success("Saved!"));
                }
                SaveOutcome::Saved
            }
            Err(e) => {
                error!("{trigger:?} save failed: {e}");
                self.inner.notifier.notify(Notification::error("Save failed"));
                SaveOutcome::Failed {
                    message: e.to_string(),
                }
            }
        }
    }

    fn claim_pending(&self, generation: u64) -> bool {
        let mut pending = self.pending();
        if pending.as_ref().map(|p| p.generation) == Some(generation) {
            pending.take();
            true
        } else {
            false
        }
    }

    fn pending(&self) -> MutexGuard<'_, Option<PendingAutosave>> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
