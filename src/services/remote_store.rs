//! Remote Store Adapter: the gist as seen by the sync core.
//!
//! Wraps a [`GistApi`] with the settings that name our file inside the gist,
//! and keeps the persisted remote handle consistent with what the API reports.

use std::collections::HashMap;
use std::sync::Arc;

use crate::managers::collection_store::CollectionStore;
use crate::services::gist_client::GistApi;
use crate::types::errors::SyncError;
use crate::types::gist::{CreateGistRequest, Gist, GistFileContent, RemoteSnapshot, UpdateGistRequest};
use crate::types::settings::SyncSettings;

pub const LIST_PAGE_SIZE: u32 = 100;
pub const MAX_LIST_PAGES: u32 = 10;

pub struct RemoteStore<A: GistApi> {
    api: A,
    store: Arc<CollectionStore>,
    filename: String,
    description: String,
}

impl<A: GistApi> RemoteStore<A> {
    pub fn new(api: A, store: Arc<CollectionStore>, settings: &SyncSettings) -> Self {
        Self {
            api,
            store,
            filename: settings.gist_filename.clone(),
            description: settings.gist_description.clone(),
        }
    }

    /// Fetches our file from the gist.
    ///
    /// A 404 means the handle is stale: it is removed from the store before
    /// `NotFound` is returned, so the next attempt creates a fresh gist.
    pub async fn fetch_remote(&self, handle: &str, credential: &str) -> Result<RemoteSnapshot, SyncError> {
        match self.api.get_gist(credential, handle).await {
            Ok(gist) => {
                let content = gist
                    .files
                    .get(&self.filename)
                    .and_then(|f| f.content.clone())
                    .filter(|c| !c.trim().is_empty());
                Ok(RemoteSnapshot {
                    content,
                    server_updated_at: gist.updated_at,
                })
            }
            Err(SyncError::NotFound(id)) => {
                log::warn!("gist {} no longer exists, dropping cached handle", id);
                self.store.set_remote_handle(None)?;
                Err(SyncError::NotFound(id))
            }
            Err(e) => Err(e),
        }
    }

    /// Creates a private gist holding `content` and persists its handle.
    pub async fn create_remote(&self, credential: &str, content: &str) -> Result<String, SyncError> {
        let request = CreateGistRequest {
            description: self.description.clone(),
            public: false,
            files: self.file_payload(content),
        };
        let gist = self.api.create_gist(credential, &request).await?;
        self.store.set_remote_handle(Some(&gist.id))?;
        log::info!("created gist {}", gist.id);
        Ok(gist.id)
    }

    /// Overwrites our file in the gist. If the gist vanished in the meantime a
    /// new one is created; the returned handle is whichever now holds the data.
    pub async fn update_remote(&self, handle: &str, credential: &str, content: &str) -> Result<String, SyncError> {
        let request = UpdateGistRequest {
            files: self.file_payload(content),
        };
        match self.api.update_gist(credential, handle, &request).await {
            Ok(_) => {
                log::debug!("pushed {} bytes to gist {}", content.len(), handle);
                Ok(handle.to_string())
            }
            Err(SyncError::NotFound(_)) => {
                log::warn!("gist {} vanished during push, recreating", handle);
                self.create_remote(credential, content).await
            }
            Err(e) => Err(e),
        }
    }

    /// Looks through the owner's gists for one we created earlier, e.g. on
    /// another device. Pages are walked until a short page or the page cap.
    pub async fn find_existing(&self, credential: &str) -> Result<Option<String>, SyncError> {
        for page in 1..=MAX_LIST_PAGES {
            let gists = self.api.list_gists(credential, page, LIST_PAGE_SIZE).await?;
            if let Some(gist) = gists.iter().find(|g| self.is_ours(g)) {
                return Ok(Some(gist.id.clone()));
            }
            if gists.len() < LIST_PAGE_SIZE as usize {
                break;
            }
        }
        Ok(None)
    }

    fn is_ours(&self, gist: &Gist) -> bool {
        gist.files.contains_key(&self.filename)
            || gist.description.as_deref() == Some(self.description.as_str())
    }

    fn file_payload(&self, content: &str) -> HashMap<String, GistFileContent> {
        let mut files = HashMap::new();
        files.insert(
            self.filename.clone(),
            GistFileContent {
                content: content.to_string(),
            },
        );
        files
    }
}
