use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::managers::collection_store::CollectionStore;
use crate::types::collection::{Collection, RawCollection};
use crate::types::errors::StorageError;

#[derive(Default)]
struct Pending {
    generation: u64,
    snapshot: Option<(Vec<RawCollection>, bool)>,
    last_error: Option<StorageError>,
}

/// Coalesces rapid-fire saves (drag events, typing) into one store write.
///
/// Each [`schedule`](Self::schedule) replaces the pending snapshot and
/// restarts the window; only the last snapshot of a burst is written.
pub struct SaveDebouncer {
    store: Arc<CollectionStore>,
    window: Duration,
    pending: Arc<Mutex<Pending>>,
}

impl SaveDebouncer {
    pub fn new(store: Arc<CollectionStore>, window: Duration) -> Self {
        Self {
            store,
            window,
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    /// Queues a snapshot for saving after the window. Must be called inside a tokio runtime.
    pub fn schedule(&self, collections: Vec<RawCollection>, sort: bool) {
        let generation = {
            let mut pending = lock(&self.pending);
            pending.generation += 1;
            pending.snapshot = Some((collections, sort));
            pending.generation
        };

        let pending = Arc::clone(&self.pending);
        let store = Arc::clone(&self.store);
        let window = self.window;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // Held through the write: a flush of a newer snapshot must not land in between.
            let mut slot = lock(&pending);
            if slot.generation != generation {
                return;
            }
            if let Some((collections, sort)) = slot.snapshot.take() {
                if let Err(e) = store.save(&collections, sort) {
                    log::error!("debounced save failed: {}", e);
                    slot.last_error = Some(e);
                }
            }
        });
    }

    /// Writes the pending snapshot now, if any, and cancels its timer.
    pub fn flush(&self) -> Result<Option<Vec<Collection>>, StorageError> {
        let mut pending = lock(&self.pending);
        pending.generation += 1;
        match pending.snapshot.take() {
            Some((collections, sort)) => self.store.save(&collections, sort).map(Some),
            None => Ok(None),
        }
    }

    pub fn has_pending(&self) -> bool {
        lock(&self.pending).snapshot.is_some()
    }

    /// The error of the last failed background save, cleared on read.
    pub fn take_last_error(&self) -> Option<StorageError> {
        lock(&self.pending).last_error.take()
    }
}

fn lock(pending: &Mutex<Pending>) -> MutexGuard<'_, Pending> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
