//! Canonical form of a collection list.
//!
//! The canonical form is what gets persisted locally and pushed to the gist,
//! and it is what change detection compares byte-for-byte. Two independent
//! canonicalizations of the same logical content must therefore serialize
//! identically: key order comes from struct declaration order, never from
//! the order fields happened to arrive in.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::types::collection::{
    elide_description, Collection, CollectionColor, RawCollection, RawTab, Tab,
    DEFAULT_COLLECTION_NAME, DEFAULT_TAB_TITLE,
};
use crate::types::errors::StorageError;

/// Canonicalizes every collection, preserving list and tab order.
///
/// `now` fills a missing `createdAt`; missing ids are synthesized. An absent
/// `updatedAt` stays absent so the merge engine can still tell it apart.
pub fn canonicalize(collections: &[RawCollection], now: DateTime<Utc>) -> Vec<Collection> {
    collections
        .iter()
        .map(|raw| canonicalize_collection(raw, now))
        .collect()
}

pub fn canonicalize_collection(raw: &RawCollection, now: DateTime<Utc>) -> Collection {
    let name = raw
        .name
        .as_deref()
        .or(raw.title.as_deref())
        .unwrap_or(DEFAULT_COLLECTION_NAME)
        .to_string();
    let color = raw
        .color
        .as_deref()
        .and_then(CollectionColor::from_name)
        .unwrap_or_default();

    Collection {
        id: id_or_fresh(raw.id.as_deref()),
        name,
        color,
        created_at: raw.created_at.unwrap_or(now),
        updated_at: raw.updated_at,
        tabs: raw.tabs.iter().map(canonicalize_tab).collect(),
    }
}

pub fn canonicalize_tab(raw: &RawTab) -> Tab {
    let title = raw
        .title
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TAB_TITLE)
        .to_string();
    let description = elide_description(raw.description.as_deref(), &title);

    Tab {
        id: id_or_fresh(raw.id.as_deref()),
        title,
        url: raw.url.clone().unwrap_or_default(),
        description,
        updated_at: raw.updated_at,
    }
}

/// Re-runs canonicalization over already-typed collections.
pub fn recanonicalize(collections: &[Collection], now: DateTime<Utc>) -> Vec<Collection> {
    let raw: Vec<RawCollection> = collections.iter().map(RawCollection::from).collect();
    canonicalize(&raw, now)
}

/// Newest `createdAt` first. The sort is stable, so equal stamps keep their relative order.
pub fn sort_newest_first(collections: &mut [Collection]) {
    collections.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Serializes canonical collections to the text stored locally and in the gist.
pub fn canonical_json(collections: &[Collection]) -> Result<String, StorageError> {
    Ok(serde_json::to_string_pretty(collections)?)
}

fn id_or_fresh(id: Option<&str>) -> String {
    match id {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}
