//! Reconciles a local and a remote collection list.
//!
//! Identity is the `id`. Ids present on one side only are kept as they are:
//! there are no tombstones, so a collection deleted here but still present
//! in the gist comes back after the next merge.
//!
//! When both sides hold the same collection, the one with the strictly later
//! `updatedAt` wins as a whole record, tabs included. On an exact tie the
//! local metadata is kept and the tab lists are merged by the same rule one
//! level down (id union, newer tab wins, local wins ties).

use std::collections::{HashMap, HashSet};

use crate::types::collection::{Collection, Tab};

/// Counters describing how a merge resolved, for logging and status reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub local_only: usize,
    pub remote_only: usize,
    pub local_won: usize,
    pub remote_won: usize,
    pub reconciled: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeResult {
    pub collections: Vec<Collection>,
    pub stats: MergeStats,
}

/// Merges two snapshots. Output order: local order first, then remote-only
/// collections in remote order. The result should be re-canonicalized before use.
pub fn merge_collections(local: &[Collection], remote: &[Collection]) -> MergeResult {
    let mut remote_by_id: HashMap<&str, &Collection> = HashMap::new();
    for c in remote {
        remote_by_id.entry(c.id.as_str()).or_insert(c);
    }

    let mut stats = MergeStats::default();
    let mut emitted: HashSet<&str> = HashSet::new();
    let mut collections = Vec::with_capacity(local.len() + remote.len());

    for l in local {
        if !emitted.insert(l.id.as_str()) {
            continue;
        }
        match remote_by_id.get(l.id.as_str()) {
            None => {
                stats.local_only += 1;
                collections.push(l.clone());
            }
            Some(r) if r.last_modified() > l.last_modified() => {
                stats.remote_won += 1;
                collections.push((*r).clone());
            }
            Some(r) if l.last_modified() > r.last_modified() => {
                stats.local_won += 1;
                collections.push(l.clone());
            }
            Some(r) => {
                stats.reconciled += 1;
                let mut merged = l.clone();
                merged.tabs = merge_tabs(&l.tabs, &r.tabs);
                collections.push(merged);
            }
        }
    }

    for r in remote {
        if emitted.insert(r.id.as_str()) {
            stats.remote_only += 1;
            collections.push(r.clone());
        }
    }

    MergeResult { collections, stats }
}

/// Id union of two tab lists; the later `updatedAt` wins, ties go to local.
pub fn merge_tabs(local: &[Tab], remote: &[Tab]) -> Vec<Tab> {
    let mut remote_by_id: HashMap<&str, &Tab> = HashMap::new();
    for t in remote {
        remote_by_id.entry(t.id.as_str()).or_insert(t);
    }

    let mut emitted: HashSet<&str> = HashSet::new();
    let mut tabs = Vec::with_capacity(local.len() + remote.len());

    for l in local {
        if !emitted.insert(l.id.as_str()) {
            continue;
        }
        let winner = match remote_by_id.get(l.id.as_str()) {
            Some(r) if r.last_modified() > l.last_modified() => (*r).clone(),
            _ => l.clone(),
        };
        tabs.push(winner);
    }

    for r in remote {
        if emitted.insert(r.id.as_str()) {
            tabs.push(r.clone());
        }
    }
    tabs
}
