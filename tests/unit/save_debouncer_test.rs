//! Unit tests for the SaveDebouncer: coalescing, flush and error reporting.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tabshelf::database::Database;
use tabshelf::managers::collection_store::CollectionStore;
use tabshelf::managers::save_debouncer::SaveDebouncer;
use tabshelf::services::sync_orchestrator::SyncGate;
use tabshelf::services::sync_scheduler::{channel, SchedulerMessage, SyncTrigger};
use tabshelf::types::collection::RawCollection;
use tokio::sync::mpsc;

const WINDOW: Duration = Duration::from_millis(40);

fn setup() -> (Arc<Database>, Arc<CollectionStore>, SaveDebouncer, mpsc::Receiver<SchedulerMessage>) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let (sender, receiver) = channel();
    let store = Arc::new(CollectionStore::new(db.clone()).with_sync_trigger(SyncTrigger::new(SyncGate::new(), sender)));
    let debouncer = SaveDebouncer::new(store.clone(), WINDOW);
    (db, store, debouncer, receiver)
}

fn named(names: &[&str]) -> Vec<RawCollection> {
    let list: Vec<serde_json::Value> = names.iter().map(|n| json!({ "id": n, "name": n })).collect();
    serde_json::from_value(json!(list)).unwrap()
}

fn saves(receiver: &mut mpsc::Receiver<SchedulerMessage>) -> usize {
    let mut n = 0;
    while receiver.try_recv().is_ok() {
        n += 1;
    }
    n
}

#[tokio::test]
async fn test_burst_is_coalesced_into_last_snapshot() {
    let (_db, store, debouncer, mut receiver) = setup();

    debouncer.schedule(named(&["a"]), true);
    debouncer.schedule(named(&["a", "b"]), true);
    debouncer.schedule(named(&["a", "b", "c"]), true);
    assert!(debouncer.has_pending());
    assert!(store.load().is_empty());

    tokio::time::sleep(WINDOW * 4).await;

    assert_eq!(store.load().len(), 3);
    assert_eq!(saves(&mut receiver), 1);
    assert!(!debouncer.has_pending());
}

#[tokio::test]
async fn test_flush_writes_immediately_and_cancels_timer() {
    let (_db, store, debouncer, mut receiver) = setup();
    debouncer.schedule(named(&["a", "b"]), true);

    let flushed = debouncer.flush().unwrap().unwrap();
    assert_eq!(flushed.len(), 2);
    assert_eq!(store.load().len(), 2);

    tokio::time::sleep(WINDOW * 3).await;
    assert_eq!(saves(&mut receiver), 1);
    assert_eq!(debouncer.flush().unwrap(), None);
}

#[tokio::test]
async fn test_failed_background_save_is_reported() {
    let (db, _store, debouncer, _receiver) = setup();
    db.connection().execute_batch("DROP TABLE kv_store;").unwrap();

    debouncer.schedule(named(&["a"]), true);
    tokio::time::sleep(WINDOW * 4).await;

    assert!(debouncer.take_last_error().is_some());
    assert!(debouncer.take_last_error().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_flushed_snapshot_is_not_overwritten_by_older_timer() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let store = Arc::new(CollectionStore::new(db));
    let debouncer = SaveDebouncer::new(store.clone(), Duration::ZERO);

    for round in 0..50 {
        debouncer.schedule(named(&["old"]), true);
        if round % 2 == 0 {
            tokio::task::yield_now().await;
        }
        debouncer.schedule(named(&["new"]), true);
        debouncer.flush().unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        let ids: Vec<String> = store.load().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["new".to_string()], "round {}", round);
    }
}
