use std::sync::Arc;

use chrono::Utc;
use url::Url;

use crate::managers::collection_store::CollectionStore;
use crate::types::collection::{elide_description, Collection, CollectionColor, Tab, DEFAULT_COLLECTION_NAME, DEFAULT_TAB_TITLE};
use crate::types::errors::CollectionError;

/// Trait defining the collection management interface.
pub trait CollectionManagerTrait {
    fn list_collections(&self) -> Vec<Collection>;
    fn get_collection(&self, collection_id: &str) -> Result<Collection, CollectionError>;
    fn create_collection(&self, name: &str, color: Option<CollectionColor>) -> Result<Collection, CollectionError>;
    fn rename_collection(&self, collection_id: &str, name: &str) -> Result<Collection, CollectionError>;
    fn set_collection_color(&self, collection_id: &str, color: CollectionColor) -> Result<Collection, CollectionError>;
    fn delete_collection(&self, collection_id: &str) -> Result<(), CollectionError>;
    fn add_tab(&self, collection_id: &str, url: &str, title: Option<&str>, description: Option<&str>) -> Result<Tab, CollectionError>;
    fn update_tab(&self, collection_id: &str, tab_id: &str, update: TabUpdate) -> Result<Tab, CollectionError>;
    fn remove_tab(&self, collection_id: &str, tab_id: &str) -> Result<(), CollectionError>;
    fn move_tab(&self, from_collection: &str, tab_id: &str, to_collection: &str, to_index: usize) -> Result<(), CollectionError>;
}

/// Fields of a tab to change; `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabUpdate {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

/// Applies user mutations to the stored collections.
///
/// Every mutation is load → mutate → save through the [`CollectionStore`]
/// and stamps `updatedAt` on each collection it touches.
pub struct CollectionManager {
    store: Arc<CollectionStore>,
}

impl CollectionManager {
    pub fn new(store: Arc<CollectionStore>) -> Self {
        Self { store }
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Vec<Collection>) -> Result<T, CollectionError>,
    ) -> Result<T, CollectionError> {
        let mut collections = self.store.try_load()?;
        let value = f(&mut collections)?;
        self.store.save_collections(&collections, true)?;
        Ok(value)
    }
}

fn find_mut<'a>(collections: &'a mut [Collection], collection_id: &str) -> Result<&'a mut Collection, CollectionError> {
    collections
        .iter_mut()
        .find(|c| c.id == collection_id)
        .ok_or_else(|| CollectionError::NotFound(collection_id.to_string()))
}

fn position(collections: &[Collection], collection_id: &str) -> Result<usize, CollectionError> {
    collections
        .iter()
        .position(|c| c.id == collection_id)
        .ok_or_else(|| CollectionError::NotFound(collection_id.to_string()))
}

/// Identity used for duplicate detection: origin plus path, without a
/// trailing slash. Query string and fragment are ignored.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(url) if url.has_host() => {
            let origin = url.origin().ascii_serialization();
            format!("{}{}", origin, url.path().trim_end_matches('/'))
        }
        _ => {
            let cut = trimmed.find(['#', '?']).map_or(trimmed, |i| &trimmed[..i]);
            cut.trim_end_matches('/').to_string()
        }
    }
}

pub fn urls_equivalent(a: &str, b: &str) -> bool {
    normalize_url(a) == normalize_url(b)
}

/// First tab in `collection` that is an effective duplicate of `url`.
pub fn find_duplicate<'a>(collection: &'a Collection, url: &str) -> Option<&'a Tab> {
    let key = normalize_url(url);
    collection.tabs.iter().find(|t| normalize_url(&t.url) == key)
}

impl CollectionManagerTrait for CollectionManager {
    fn list_collections(&self) -> Vec<Collection> {
        self.store.load()
    }

    fn get_collection(&self, collection_id: &str) -> Result<Collection, CollectionError> {
        self.store
            .try_load()?
            .into_iter()
            .find(|c| c.id == collection_id)
            .ok_or_else(|| CollectionError::NotFound(collection_id.to_string()))
    }

    fn create_collection(&self, name: &str, color: Option<CollectionColor>) -> Result<Collection, CollectionError> {
        let name = match name.trim() {
            "" => DEFAULT_COLLECTION_NAME,
            trimmed => trimmed,
        };
        let collection = Collection::new(name, color.unwrap_or_default(), Utc::now());
        let created = collection.clone();
        self.mutate(move |collections| {
            collections.insert(0, collection);
            Ok(())
        })?;
        log::debug!("created collection {}", created.id);
        Ok(created)
    }

    fn rename_collection(&self, collection_id: &str, name: &str) -> Result<Collection, CollectionError> {
        self.mutate(|collections| {
            let collection = find_mut(collections, collection_id)?;
            collection.name = match name.trim() {
                "" => DEFAULT_COLLECTION_NAME.to_string(),
                trimmed => trimmed.to_string(),
            };
            collection.touch(Utc::now());
            Ok(collection.clone())
        })
    }

    fn set_collection_color(&self, collection_id: &str, color: CollectionColor) -> Result<Collection, CollectionError> {
        self.mutate(|collections| {
            let collection = find_mut(collections, collection_id)?;
            collection.color = color;
            collection.touch(Utc::now());
            Ok(collection.clone())
        })
    }

    fn delete_collection(&self, collection_id: &str) -> Result<(), CollectionError> {
        self.mutate(|collections| {
            let idx = position(collections, collection_id)?;
            collections.remove(idx);
            Ok(())
        })
    }

    /// Appends a tab, rejecting a URL that already exists in the collection
    /// up to query string and fragment.
    fn add_tab(&self, collection_id: &str, url: &str, title: Option<&str>, description: Option<&str>) -> Result<Tab, CollectionError> {
        self.mutate(|collections| {
            let collection = find_mut(collections, collection_id)?;
            if let Some(existing) = find_duplicate(collection, url) {
                return Err(CollectionError::DuplicateUrl(existing.url.clone()));
            }
            let now = Utc::now();
            let tab = Tab::new(url.trim(), title, description, now);
            collection.tabs.push(tab.clone());
            collection.touch(now);
            Ok(tab)
        })
    }

    fn update_tab(&self, collection_id: &str, tab_id: &str, update: TabUpdate) -> Result<Tab, CollectionError> {
        self.mutate(|collections| {
            let collection = find_mut(collections, collection_id)?;
            let idx = collection
                .tab_index(tab_id)
                .ok_or_else(|| CollectionError::TabNotFound(tab_id.to_string()))?;

            if let Some(url) = &update.url {
                let clash = collection
                    .tabs
                    .iter()
                    .any(|t| t.id != tab_id && urls_equivalent(&t.url, url));
                if clash {
                    return Err(CollectionError::DuplicateUrl(url.clone()));
                }
            }

            let now = Utc::now();
            let tab = &mut collection.tabs[idx];
            if let Some(title) = update.title {
                tab.title = if title.is_empty() { DEFAULT_TAB_TITLE.to_string() } else { title };
            }
            if let Some(url) = update.url {
                tab.url = url.trim().to_string();
            }
            let description = update.description.or_else(|| tab.description.clone());
            tab.description = elide_description(description.as_deref(), &tab.title);
            tab.updated_at = Some(now);
            let updated = tab.clone();

            collection.touch(now);
            Ok(updated)
        })
    }

    fn remove_tab(&self, collection_id: &str, tab_id: &str) -> Result<(), CollectionError> {
        self.mutate(|collections| {
            let collection = find_mut(collections, collection_id)?;
            let idx = collection
                .tab_index(tab_id)
                .ok_or_else(|| CollectionError::TabNotFound(tab_id.to_string()))?;
            collection.tabs.remove(idx);
            collection.touch(Utc::now());
            Ok(())
        })
    }

    /// Moves a tab to `to_index` in `to_collection`, which may be its own
    /// collection (a reorder). Moving into another collection that already
    /// holds the same URL is rejected.
    fn move_tab(&self, from_collection: &str, tab_id: &str, to_collection: &str, to_index: usize) -> Result<(), CollectionError> {
        self.mutate(|collections| {
            let now = Utc::now();
            let from = position(collections, from_collection)?;
            let to = position(collections, to_collection)?;
            let tab_idx = collections[from]
                .tab_index(tab_id)
                .ok_or_else(|| CollectionError::TabNotFound(tab_id.to_string()))?;

            if from == to {
                let tabs = &mut collections[from].tabs;
                if to_index >= tabs.len() {
                    return Err(CollectionError::InvalidIndex(to_index));
                }
                let mut tab = tabs.remove(tab_idx);
                tab.updated_at = Some(now);
                tabs.insert(to_index, tab);
                collections[from].touch(now);
                return Ok(());
            }

            if to_index > collections[to].tabs.len() {
                return Err(CollectionError::InvalidIndex(to_index));
            }
            let url = collections[from].tabs[tab_idx].url.clone();
            if find_duplicate(&collections[to], &url).is_some() {
                return Err(CollectionError::DuplicateUrl(url));
            }

            let mut tab = collections[from].tabs.remove(tab_idx);
            tab.updated_at = Some(now);
            collections[from].touch(now);
            collections[to].tabs.insert(to_index, tab);
            collections[to].touch(now);
            Ok(())
        })
    }
}
