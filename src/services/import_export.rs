//! Export and import of the collection list.
//!
//! Export writes the canonical JSON array. Import accepts that same shape or
//! the legacy `{version, lists: [{title, color?, cards: [...]}]}` board
//! format, which is translated once into collections here and never reaches
//! the sync path.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::managers::collection_store::CollectionStore;
use crate::services::canonicalizer::{canonical_json, canonicalize, sort_newest_first};
use crate::services::merge_engine::merge_collections;
use crate::types::collection::{Collection, RawCollection, RawTab};
use crate::types::errors::{ImportError, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Id-keyed merge into the existing collections.
    #[default]
    Merge,
    /// Discard existing collections.
    Replace,
}

impl ImportMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "merge" => Some(ImportMode::Merge),
            "replace" => Some(ImportMode::Replace),
            _ => None,
        }
    }
}

/// `version` is accepted and ignored; only one legacy revision exists.
#[derive(Debug, Deserialize)]
struct LegacyExport {
    lists: Vec<LegacyList>,
}

#[derive(Debug, Deserialize)]
struct LegacyList {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    cards: Vec<LegacyCard>,
}

#[derive(Debug, Deserialize)]
struct LegacyCard {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

pub fn export_collections(store: &CollectionStore) -> Result<String, StorageError> {
    canonical_json(&store.try_load()?)
}

/// Parses an import file in either accepted shape.
pub fn parse_import(content: &str) -> Result<Vec<RawCollection>, ImportError> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| ImportError::InvalidFormat(format!("not valid JSON: {}", e)))?;

    match value {
        Value::Array(_) => serde_json::from_value(value)
            .map_err(|e| ImportError::InvalidFormat(format!("bad collection list: {}", e))),
        Value::Object(ref map) if map.contains_key("lists") => {
            let legacy: LegacyExport = serde_json::from_value(value)
                .map_err(|e| ImportError::InvalidFormat(format!("bad legacy export: {}", e)))?;
            Ok(convert_legacy(legacy.lists))
        }
        _ => Err(ImportError::InvalidFormat(
            "expected a collection array or a legacy export with `lists`".to_string(),
        )),
    }
}

fn convert_legacy(lists: Vec<LegacyList>) -> Vec<RawCollection> {
    lists
        .into_iter()
        .map(|list| RawCollection {
            name: list.title,
            color: list.color,
            tabs: list
                .cards
                .into_iter()
                .map(|card| RawTab {
                    title: card.title,
                    url: card.url,
                    description: card.description,
                    ..RawTab::default()
                })
                .collect(),
            ..RawCollection::default()
        })
        .collect()
}

/// Imports `content` and persists the result, returning the stored collections.
pub fn import_collections(store: &CollectionStore, content: &str, mode: ImportMode) -> Result<Vec<Collection>, ImportError> {
    let raw = parse_import(content)?;
    let imported = canonicalize(&raw, Utc::now());
    log::info!("importing {} collections ({:?})", imported.len(), mode);

    let mut result = match mode {
        ImportMode::Replace => imported,
        ImportMode::Merge => {
            let local = store.try_load()?;
            merge_collections(&local, &imported).collections
        }
    };
    sort_newest_first(&mut result);
    Ok(store.save_collections(&result, true)?)
}
