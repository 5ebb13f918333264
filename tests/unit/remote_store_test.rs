//! Unit tests for the RemoteStore adapter: handle bookkeeping around the
//! gist API and adoption of an existing gist.

#[path = "../support/fake_gist.rs"]
mod fake_gist;

use std::sync::Arc;

use chrono::Utc;
use fake_gist::FakeGist;
use tabshelf::database::Database;
use tabshelf::managers::collection_store::CollectionStore;
use tabshelf::services::remote_store::{RemoteStore, LIST_PAGE_SIZE};
use tabshelf::types::errors::SyncError;
use tabshelf::types::settings::SyncSettings;

const TOKEN: &str = "tok";

fn setup() -> (Arc<CollectionStore>, FakeGist, RemoteStore<FakeGist>, SyncSettings) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let store = Arc::new(CollectionStore::new(db));
    let fake = FakeGist::new();
    let settings = SyncSettings::default();
    let remote = RemoteStore::new(fake.clone(), store.clone(), &settings);
    (store, fake, remote, settings)
}

#[tokio::test]
async fn test_fetch_returns_content_and_server_timestamp() {
    let (_store, fake, remote, settings) = setup();
    let stamp = Utc::now();
    fake.insert("g1", &settings.gist_description, &settings.gist_filename, Some("[]"), stamp);

    let snapshot = remote.fetch_remote("g1", TOKEN).await.unwrap();

    assert_eq!(snapshot.content.as_deref(), Some("[]"));
    assert_eq!(snapshot.server_updated_at, stamp);
}

#[tokio::test]
async fn test_fetch_treats_blank_file_as_absent() {
    let (_store, fake, remote, settings) = setup();
    fake.insert("g1", "x", &settings.gist_filename, Some("   \n"), Utc::now());

    let snapshot = remote.fetch_remote("g1", TOKEN).await.unwrap();
    assert_eq!(snapshot.content, None);
}

#[tokio::test]
async fn test_fetch_not_found_clears_stored_handle() {
    let (store, _fake, remote, _settings) = setup();
    store.set_remote_handle(Some("gone")).unwrap();

    let err = remote.fetch_remote("gone", TOKEN).await.unwrap_err();

    assert_eq!(err, SyncError::NotFound("gone".to_string()));
    assert_eq!(store.sync_state().unwrap().remote_handle, None);
}

#[tokio::test]
async fn test_fetch_other_errors_keep_stored_handle() {
    let (store, fake, remote, _settings) = setup();
    store.set_remote_handle(Some("g1")).unwrap();
    fake.fail_next(SyncError::NetworkError("reset".to_string()));

    assert!(remote.fetch_remote("g1", TOKEN).await.is_err());
    assert_eq!(store.sync_state().unwrap().remote_handle.as_deref(), Some("g1"));
}

#[tokio::test]
async fn test_create_persists_new_handle() {
    let (store, fake, remote, settings) = setup();

    let handle = remote.create_remote(TOKEN, "[]").await.unwrap();

    assert_eq!(store.sync_state().unwrap().remote_handle.as_deref(), Some(handle.as_str()));
    assert_eq!(fake.content(&handle, &settings.gist_filename).as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_update_on_vanished_gist_recreates() {
    let (store, fake, remote, settings) = setup();
    store.set_remote_handle(Some("gone")).unwrap();

    let handle = remote.update_remote("gone", TOKEN, "[1]").await.unwrap();

    assert_ne!(handle, "gone");
    assert_eq!(fake.calls(), vec!["update", "create"]);
    assert_eq!(store.sync_state().unwrap().remote_handle.as_deref(), Some(handle.as_str()));
    assert_eq!(fake.content(&handle, &settings.gist_filename).as_deref(), Some("[1]"));
}

#[tokio::test]
async fn test_find_existing_matches_by_filename_or_description() {
    let (_store, fake, remote, settings) = setup();
    fake.insert("unrelated", "notes", "notes.md", Some("x"), Utc::now());
    fake.insert("by-desc", &settings.gist_description, "renamed.json", Some("[]"), Utc::now());

    assert_eq!(remote.find_existing(TOKEN).await.unwrap().as_deref(), Some("by-desc"));
}

#[tokio::test]
async fn test_find_existing_walks_pages() {
    let (_store, fake, remote, settings) = setup();
    for i in 0..LIST_PAGE_SIZE {
        fake.insert(&format!("other-{}", i), "notes", "notes.md", None, Utc::now());
    }
    fake.insert("ours", "whatever", &settings.gist_filename, None, Utc::now());

    assert_eq!(remote.find_existing(TOKEN).await.unwrap().as_deref(), Some("ours"));
    assert_eq!(fake.count("list"), 2);
}

#[tokio::test]
async fn test_find_existing_none_stops_on_short_page() {
    let (_store, fake, remote, _settings) = setup();
    fake.insert("unrelated", "notes", "notes.md", None, Utc::now());

    assert_eq!(remote.find_existing(TOKEN).await.unwrap(), None);
    assert_eq!(fake.count("list"), 1);
}
