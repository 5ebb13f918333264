//! Local store for tabshelf.
//!
//! Owns the canonical on-disk representation of the collection list and the
//! sync bookkeeping, all kept as entries of the `kv_store` table.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::database::connection::Database;
use crate::services::canonicalizer::{canonical_json, canonicalize, sort_newest_first};
use crate::services::sync_scheduler::SyncTrigger;
use crate::types::collection::{Collection, RawCollection};
use crate::types::errors::StorageError;
use crate::types::sync::{SyncRecord, SyncState};

pub const KEY_COLLECTIONS: &str = "collections";
pub const KEY_LAST_MODIFIED: &str = "lastModified";
pub const KEY_CREDENTIAL: &str = "credential";
pub const KEY_REMOTE_HANDLE: &str = "remoteHandle";

/// Local Store Adapter backed by SQLite.
pub struct CollectionStore {
    db: Arc<Database>,
    trigger: Option<SyncTrigger>,
}

impl CollectionStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db, trigger: None }
    }

    /// Makes every successful save request a sync, unless one is already running.
    pub fn with_sync_trigger(mut self, trigger: SyncTrigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Reads the collections, newest `createdAt` first.
    ///
    /// Never fails: an unreadable store is logged and reads as empty so the UI stays usable.
    pub fn load(&self) -> Vec<Collection> {
        match self.try_load() {
            Ok(collections) => collections,
            Err(e) => {
                log::warn!("failed to read collections, falling back to empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Like [`load`](Self::load) but surfaces read failures.
    ///
    /// The sync path uses this: pushing an empty list because a read failed
    /// would overwrite the remote copy.
    pub fn try_load(&self) -> Result<Vec<Collection>, StorageError> {
        let stored = {
            let conn = self.db.connection();
            get_value(&conn, KEY_COLLECTIONS)?
        };
        let Some(json) = stored else {
            return Ok(Vec::new());
        };

        let raw: Vec<RawCollection> = serde_json::from_str(&json)?;
        let mut collections = canonicalize(&raw, Utc::now());
        sort_newest_first(&mut collections);
        Ok(collections)
    }

    /// Canonicalizes, optionally sorts, and persists the collections together
    /// with a fresh `lastModified` stamp in one transaction.
    ///
    /// Returns the persisted form. Write failures are returned, never swallowed.
    pub fn save(&self, collections: &[RawCollection], sort: bool) -> Result<Vec<Collection>, StorageError> {
        self.write(collections, sort, None)
    }

    /// Convenience over [`save`](Self::save) for already-typed collections.
    pub fn save_collections(&self, collections: &[Collection], sort: bool) -> Result<Vec<Collection>, StorageError> {
        let raw: Vec<RawCollection> = collections.iter().map(RawCollection::from).collect();
        self.save(&raw, sort)
    }

    /// Persists a merge result. `lastModified` is raised to at least
    /// `pulled_at`, the server stamp of the remote content just merged, so the
    /// next pass does not take that same remote version for newer again.
    pub fn save_merged(&self, collections: &[Collection], pulled_at: DateTime<Utc>) -> Result<Vec<Collection>, StorageError> {
        let raw: Vec<RawCollection> = collections.iter().map(RawCollection::from).collect();
        self.write(&raw, true, Some(pulled_at.timestamp_millis()))
    }

    fn write(&self, collections: &[RawCollection], sort: bool, floor: Option<i64>) -> Result<Vec<Collection>, StorageError> {
        let now = Utc::now();
        let mut canonical = canonicalize(collections, now);
        if sort {
            sort_newest_first(&mut canonical);
        }
        let json = canonical_json(&canonical)?;
        let stamp = now.timestamp_millis().max(floor.unwrap_or(i64::MIN));

        {
            let mut conn = self.db.connection();
            let tx = conn.transaction()?;
            put_value(&tx, KEY_COLLECTIONS, &json, stamp)?;
            put_value(&tx, KEY_LAST_MODIFIED, &stamp.to_string(), stamp)?;
            tx.commit()?;
        }
        log::debug!("saved {} collections at {}", canonical.len(), stamp);

        if let Some(trigger) = &self.trigger {
            trigger.fire();
        }
        Ok(canonical)
    }

    /// Epoch millis of the last successful save, if any.
    pub fn last_modified(&self) -> Result<Option<i64>, StorageError> {
        let conn = self.db.connection();
        Ok(get_value(&conn, KEY_LAST_MODIFIED)?.and_then(|v| v.parse().ok()))
    }

    pub fn sync_state(&self) -> Result<SyncState, StorageError> {
        let conn = self.db.connection();
        Ok(SyncState {
            credential: get_value(&conn, KEY_CREDENTIAL)?.map(Zeroizing::new),
            remote_handle: get_value(&conn, KEY_REMOTE_HANDLE)?,
            last_modified: get_value(&conn, KEY_LAST_MODIFIED)?.and_then(|v| v.parse().ok()),
        })
    }

    pub fn set_credential(&self, credential: Option<&str>) -> Result<(), StorageError> {
        self.set_or_clear(KEY_CREDENTIAL, credential)
    }

    pub fn set_remote_handle(&self, handle: Option<&str>) -> Result<(), StorageError> {
        self.set_or_clear(KEY_REMOTE_HANDLE, handle)
    }

    /// Appends one finished sync attempt to the history.
    pub fn record_sync(&self, outcome: &str, detail: Option<&str>) -> Result<(), StorageError> {
        let conn = self.db.connection();
        conn.execute(
            "INSERT INTO sync_history (id, outcome, detail, finished_at) VALUES (?1, ?2, ?3, ?4)",
            params![Uuid::new_v4().to_string(), outcome, detail, Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    /// Most recent sync attempts first.
    pub fn sync_history(&self, limit: usize) -> Result<Vec<SyncRecord>, StorageError> {
        let conn = self.db.connection();
        let mut stmt = conn.prepare(
            "SELECT id, outcome, detail, finished_at FROM sync_history \
             ORDER BY finished_at DESC, rowid DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(SyncRecord {
                id: row.get(0)?,
                outcome: row.get(1)?,
                detail: row.get(2)?,
                finished_at: row.get(3)?,
            })
        })?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn set_or_clear(&self, key: &str, value: Option<&str>) -> Result<(), StorageError> {
        let conn = self.db.connection();
        match value {
            Some(v) => put_value(&conn, key, v, Utc::now().timestamp_millis()),
            None => {
                conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
                Ok(())
            }
        }
    }
}

fn get_value(conn: &Connection, key: &str) -> Result<Option<String>, StorageError> {
    let value = conn
        .query_row("SELECT value FROM kv_store WHERE key = ?1", params![key], |row| row.get(0))
        .optional()?;
    Ok(value)
}

fn put_value(conn: &Connection, key: &str, value: &str, stamp: i64) -> Result<(), StorageError> {
    conn.execute(
        "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3) \
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, stamp],
    )?;
    Ok(())
}
