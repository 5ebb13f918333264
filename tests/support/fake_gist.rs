//! In-process stand-in for the GitHub Gist API.
//!
//! Included by path from the tests that need it. Keeps gists in memory,
//! records every call, can fail the next call with a chosen error and can
//! hold `get_gist` open until released.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;

use tabshelf::services::gist_client::GistApi;
use tabshelf::types::errors::SyncError;
use tabshelf::types::gist::{CreateGistRequest, Gist, GistFile, UpdateGistRequest};

#[derive(Default)]
struct FakeState {
    gists: HashMap<String, Gist>,
    order: Vec<String>,
    next_id: u32,
    calls: Vec<&'static str>,
    fail_next: Option<SyncError>,
}

/// Pair of signals used to pause `get_gist` mid-flight.
#[derive(Clone)]
pub struct Hold {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

#[derive(Clone, Default)]
pub struct FakeGist {
    state: Arc<Mutex<FakeState>>,
    hold: Arc<Mutex<Option<Hold>>>,
}

impl FakeGist {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Adds a gist directly, bypassing the call log.
    pub fn insert(&self, id: &str, description: &str, filename: &str, content: Option<&str>, updated_at: DateTime<Utc>) {
        let mut files = HashMap::new();
        files.insert(
            filename.to_string(),
            GistFile {
                filename: Some(filename.to_string()),
                content: content.map(str::to_string),
                truncated: false,
                raw_url: None,
            },
        );
        let gist = Gist {
            id: id.to_string(),
            description: Some(description.to_string()),
            updated_at,
            files,
        };
        let mut state = self.state();
        if !state.gists.contains_key(id) {
            state.order.push(id.to_string());
        }
        state.gists.insert(id.to_string(), gist);
    }

    pub fn remove(&self, id: &str) {
        let mut state = self.state();
        state.gists.remove(id);
        state.order.retain(|g| g != id);
    }

    pub fn content(&self, id: &str, filename: &str) -> Option<String> {
        self.state()
            .gists
            .get(id)
            .and_then(|g| g.files.get(filename))
            .and_then(|f| f.content.clone())
    }

    pub fn gist_count(&self) -> usize {
        self.state().gists.len()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.state().calls.iter().filter(|c| **c == call).count()
    }

    pub fn fail_next(&self, error: SyncError) {
        self.state().fail_next = Some(error);
    }

    /// Makes the next `get_gist` calls wait for `release` after signalling `entered`.
    pub fn hold_gets(&self) -> Hold {
        let hold = Hold {
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        };
        *self.hold.lock().unwrap() = Some(hold.clone());
        hold
    }

    pub fn clear_hold(&self) {
        *self.hold.lock().unwrap() = None;
    }

    fn begin(&self, call: &'static str) -> Result<(), SyncError> {
        let mut state = self.state();
        state.calls.push(call);
        match state.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn write_files(gist: &mut Gist, files: &HashMap<String, tabshelf::types::gist::GistFileContent>) {
        for (name, body) in files {
            gist.files.insert(
                name.clone(),
                GistFile {
                    filename: Some(name.clone()),
                    content: Some(body.content.clone()),
                    truncated: false,
                    raw_url: None,
                },
            );
        }
        gist.updated_at = Utc::now();
    }
}

#[async_trait]
impl GistApi for FakeGist {
    async fn get_gist(&self, _token: &str, gist_id: &str) -> Result<Gist, SyncError> {
        let hold = self.hold.lock().unwrap().clone();
        if let Some(hold) = hold {
            hold.entered.notify_one();
            hold.release.notified().await;
        }
        self.begin("get")?;
        self.state()
            .gists
            .get(gist_id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(gist_id.to_string()))
    }

    async fn create_gist(&self, _token: &str, request: &CreateGistRequest) -> Result<Gist, SyncError> {
        self.begin("create")?;
        let mut state = self.state();
        state.next_id += 1;
        let id = format!("gist-{}", state.next_id);
        let mut gist = Gist {
            id: id.clone(),
            description: Some(request.description.clone()),
            updated_at: Utc::now(),
            files: HashMap::new(),
        };
        Self::write_files(&mut gist, &request.files);
        state.order.push(id.clone());
        state.gists.insert(id, gist.clone());
        Ok(gist)
    }

    async fn update_gist(&self, _token: &str, gist_id: &str, request: &UpdateGistRequest) -> Result<Gist, SyncError> {
        self.begin("update")?;
        let mut state = self.state();
        let gist = state
            .gists
            .get_mut(gist_id)
            .ok_or_else(|| SyncError::NotFound(gist_id.to_string()))?;
        Self::write_files(gist, &request.files);
        Ok(gist.clone())
    }

    async fn list_gists(&self, _token: &str, page: u32, per_page: u32) -> Result<Vec<Gist>, SyncError> {
        self.begin("list")?;
        let state = self.state();
        let start = ((page.max(1) - 1) * per_page) as usize;
        Ok(state
            .order
            .iter()
            .skip(start)
            .take(per_page as usize)
            .filter_map(|id| state.gists.get(id))
            .map(|g| {
                let mut listed = g.clone();
                for file in listed.files.values_mut() {
                    file.content = None;
                }
                listed
            })
            .collect())
    }
}
