use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Process-wide sync bookkeeping, persisted next to the collections.
#[derive(Clone, Default)]
pub struct SyncState {
    pub credential: Option<Zeroizing<String>>,
    pub remote_handle: Option<String>,
    /// Epoch millis of the last successful local write.
    pub last_modified: Option<i64>,
}

impl SyncState {
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.as_str())
    }

    pub fn is_connected(&self) -> bool {
        self.credential.is_some()
    }
}

impl fmt::Debug for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncState")
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("remote_handle", &self.remote_handle)
            .field("last_modified", &self.last_modified)
            .finish()
    }
}

/// Where a sync attempt currently is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    #[default]
    Idle,
    Fetching,
    Merging,
    Pushing,
}

impl SyncPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, SyncPhase::Idle)
    }
}

/// How a sync attempt ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another attempt was in flight; this trigger was dropped.
    Skipped,
    /// No credential stored, sync is opt-in.
    NotConfigured,
    /// The cached gist handle 404'd and was dropped.
    HandleInvalidated,
    /// A new gist was created and its handle persisted.
    Created { handle: String },
    /// Local content was written to the remote gist.
    Pushed,
    /// Remote content already matched local content.
    Unchanged,
    /// Remote was newer and got merged; `changed` tells whether local storage was rewritten.
    Merged { changed: bool },
}

impl SyncOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            SyncOutcome::Skipped => "skipped",
            SyncOutcome::NotConfigured => "not_configured",
            SyncOutcome::HandleInvalidated => "handle_invalidated",
            SyncOutcome::Created { .. } => "created",
            SyncOutcome::Pushed => "pushed",
            SyncOutcome::Unchanged => "unchanged",
            SyncOutcome::Merged { .. } => "merged",
        }
    }
}

/// One finished attempt, as kept in `sync_history`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncRecord {
    pub id: String,
    pub outcome: String,
    pub detail: Option<String>,
    pub finished_at: i64,
}
