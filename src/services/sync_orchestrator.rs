//! Sync orchestration.
//!
//! One attempt walks `Fetching → (Merging | Pushing) → Idle`. At most one
//! attempt runs at a time: [`SyncGate::try_begin`] hands out a single permit
//! and a concurrent caller gets [`SyncOutcome::Skipped`] instead of waiting.
//! The permit resets the phase to `Idle` when dropped, on every exit path.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::managers::collection_store::CollectionStore;
use crate::services::canonicalizer::{canonical_json, canonicalize, recanonicalize, sort_newest_first};
use crate::services::gist_client::GistApi;
use crate::services::merge_engine::merge_collections;
use crate::services::remote_store::RemoteStore;
use crate::types::collection::{Collection, RawCollection};
use crate::types::errors::SyncError;
use crate::types::sync::{SyncOutcome, SyncPhase, SyncState};

/// Shared sync phase. Cloning shares the same state.
#[derive(Debug, Clone, Default)]
pub struct SyncGate {
    phase: Arc<Mutex<SyncPhase>>,
}

impl SyncGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SyncPhase {
        *self.lock()
    }

    /// Claims the gate if idle, moving it to `Fetching`.
    pub fn try_begin(&self) -> Option<SyncPermit> {
        let mut phase = self.lock();
        if !phase.is_idle() {
            return None;
        }
        *phase = SyncPhase::Fetching;
        Some(SyncPermit { gate: self.clone() })
    }

    fn set(&self, phase: SyncPhase) {
        *self.lock() = phase;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SyncPhase> {
        self.phase.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Exclusive right to run a sync attempt.
#[derive(Debug)]
pub struct SyncPermit {
    gate: SyncGate,
}

impl SyncPermit {
    pub fn advance(&self, phase: SyncPhase) {
        log::debug!("sync phase -> {:?}", phase);
        self.gate.set(phase);
    }
}

impl Drop for SyncPermit {
    fn drop(&mut self) {
        self.gate.set(SyncPhase::Idle);
    }
}

pub struct SyncOrchestrator<A: GistApi> {
    store: Arc<CollectionStore>,
    remote: RemoteStore<A>,
    gate: SyncGate,
}

impl<A: GistApi> SyncOrchestrator<A> {
    pub fn new(store: Arc<CollectionStore>, remote: RemoteStore<A>, gate: SyncGate) -> Self {
        Self { store, remote, gate }
    }

    pub fn phase(&self) -> SyncPhase {
        self.gate.phase()
    }

    pub fn status(&self) -> Result<SyncState, SyncError> {
        Ok(self.store.sync_state()?)
    }

    /// Stores the credential and adopts an existing gist if the account has one.
    ///
    /// The credential is only persisted after the lookup succeeded, so a
    /// scheduled sync cannot race ahead and create a duplicate gist.
    pub async fn connect(&self, credential: &str) -> Result<Option<String>, SyncError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(SyncError::AuthError("credential is empty".to_string()));
        }

        let existing = self.store.sync_state()?.remote_handle;
        let handle = match existing {
            Some(handle) => Some(handle),
            None => self.remote.find_existing(credential).await?,
        };

        if let Some(handle) = &handle {
            self.store.set_remote_handle(Some(handle))?;
            log::info!("sync connected to gist {}", handle);
        } else {
            log::info!("sync connected, no existing gist found");
        }
        self.store.set_credential(Some(credential))?;
        Ok(handle)
    }

    /// Forgets the credential and the remote handle. Local collections are kept.
    pub fn disconnect(&self) -> Result<(), SyncError> {
        self.store.set_credential(None)?;
        self.store.set_remote_handle(None)?;
        log::info!("sync disconnected");
        Ok(())
    }

    /// Runs one sync attempt, or returns `Skipped` if one is already running.
    pub async fn sync(&self) -> Result<SyncOutcome, SyncError> {
        let Some(permit) = self.gate.try_begin() else {
            log::debug!("sync already in flight, skipping");
            return Ok(SyncOutcome::Skipped);
        };

        let result = self.run(&permit).await;
        match &result {
            Ok(outcome) => {
                log::info!("sync finished: {}", outcome.label());
                self.record(outcome.label(), describe(outcome).as_deref());
            }
            Err(e) => {
                log::warn!("sync failed: {}", e);
                self.record("failed", Some(&e.to_string()));
            }
        }
        drop(permit);
        result
    }

    async fn run(&self, permit: &SyncPermit) -> Result<SyncOutcome, SyncError> {
        let state = self.store.sync_state()?;
        let Some(credential) = state.credential.clone() else {
            return Ok(SyncOutcome::NotConfigured);
        };

        let local = self.store.try_load()?;
        let local_json = canonical_json(&local)?;

        let Some(handle) = state.remote_handle.clone() else {
            permit.advance(SyncPhase::Pushing);
            let handle = self.remote.create_remote(&credential, &local_json).await?;
            return Ok(SyncOutcome::Created { handle });
        };

        let snapshot = match self.remote.fetch_remote(&handle, &credential).await {
            Ok(snapshot) => snapshot,
            Err(SyncError::NotFound(_)) => return Ok(SyncOutcome::HandleInvalidated),
            Err(e) => return Err(e),
        };

        let Some(remote_json) = snapshot.content else {
            permit.advance(SyncPhase::Pushing);
            return self.push(&handle, &credential, &local_json).await;
        };

        let local_stamp = state.last_modified.unwrap_or(0);
        if snapshot.server_updated_at.timestamp_millis() > local_stamp {
            permit.advance(SyncPhase::Merging);
            return self.merge_remote(&local, &local_json, &remote_json, snapshot.server_updated_at);
        }

        permit.advance(SyncPhase::Pushing);
        if remote_json == local_json {
            return Ok(SyncOutcome::Unchanged);
        }
        self.push(&handle, &credential, &local_json).await
    }

    async fn push(&self, handle: &str, credential: &str, content: &str) -> Result<SyncOutcome, SyncError> {
        let effective = self.remote.update_remote(handle, credential, content).await?;
        if effective == handle {
            Ok(SyncOutcome::Pushed)
        } else {
            Ok(SyncOutcome::Created { handle: effective })
        }
    }

    /// Merges the remote blob into local storage.
    ///
    /// Nothing is written when local, remote and merged content are all the
    /// same bytes, which is the common case right after our own push bumped
    /// the gist's timestamp. Otherwise the result is persisted with
    /// `lastModified` raised to the remote stamp, so the next pass goes to
    /// `Pushing` and sends whatever the gist is still missing.
    fn merge_remote(
        &self,
        local: &[Collection],
        local_json: &str,
        remote_json: &str,
        pulled_at: DateTime<Utc>,
    ) -> Result<SyncOutcome, SyncError> {
        let raw: Vec<RawCollection> = serde_json::from_str(remote_json)
            .map_err(|e| SyncError::MalformedRemote(e.to_string()))?;
        let now = Utc::now();
        let remote = canonicalize(&raw, now);

        let result = merge_collections(local, &remote);
        log::debug!("merge stats: {:?}", result.stats);

        let mut merged = recanonicalize(&result.collections, now);
        sort_newest_first(&mut merged);
        let merged_json = canonical_json(&merged)?;
        if merged_json == local_json && merged_json == remote_json {
            return Ok(SyncOutcome::Merged { changed: false });
        }

        self.store.save_merged(&merged, pulled_at)?;
        Ok(SyncOutcome::Merged {
            changed: merged_json != local_json,
        })
    }

    fn record(&self, outcome: &str, detail: Option<&str>) {
        if let Err(e) = self.store.record_sync(outcome, detail) {
            log::warn!("failed to record sync history: {}", e);
        }
    }
}

fn describe(outcome: &SyncOutcome) -> Option<String> {
    match outcome {
        SyncOutcome::Created { handle } => Some(format!("gist {}", handle)),
        SyncOutcome::Merged { changed } => Some(format!("changed: {}", changed)),
        _ => None,
    }
}
