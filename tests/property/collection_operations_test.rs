//! Property-based tests for CollectionManager operations.
//!
//! These tests verify the tab-count invariant under arbitrary sequences of
//! adds, removes and moves across two collections, and that no collection
//! ever ends up holding two effectively-equal URLs through the manager.

use std::sync::Arc;

use proptest::prelude::*;
use tabshelf::database::Database;
use tabshelf::managers::collection_manager::{urls_equivalent, CollectionManager, CollectionManagerTrait};
use tabshelf::managers::collection_store::CollectionStore;
use tabshelf::types::errors::CollectionError;

/// Operations that can be performed on a pair of collections.
#[derive(Debug, Clone)]
enum CollectionOp {
    /// Add a URL (index into a small pool, so duplicates happen) to collection 0 or 1.
    Add(usize, usize, String),
    /// Remove the n-th tab (mod count) of a collection.
    Remove(usize, usize),
    /// Move the n-th tab (mod count) of one collection to an index in another (or the same).
    Move(usize, usize, usize, usize),
}

fn arb_ops() -> impl Strategy<Value = Vec<CollectionOp>> {
    prop::collection::vec(
        prop_oneof![
            4 => (0..2usize, 0..6usize, prop_oneof![Just(""), Just("?ref=x"), Just("#top")])
                .prop_map(|(c, u, suffix)| CollectionOp::Add(c, u, suffix.to_string())),
            1 => (0..2usize, 0..10usize).prop_map(|(c, n)| CollectionOp::Remove(c, n)),
            2 => (0..2usize, 0..10usize, 0..2usize, 0..10usize)
                .prop_map(|(f, n, t, i)| CollectionOp::Move(f, n, t, i)),
        ],
        1..40,
    )
}

fn setup() -> (CollectionManager, [String; 2]) {
    let db = Arc::new(Database::open_in_memory().expect("Failed to open in-memory database"));
    let mgr = CollectionManager::new(Arc::new(CollectionStore::new(db)));
    let a = mgr.create_collection("A", None).unwrap().id;
    let b = mgr.create_collection("B", None).unwrap().id;
    (mgr, [a, b])
}

fn tab_ids(mgr: &CollectionManager, id: &str) -> Vec<String> {
    mgr.get_collection(id).unwrap().tabs.into_iter().map(|t| t.id).collect()
}

// **Property 9: Tab count invariant**
//
// *For any* sequence of adds, removes and moves, the total tab count SHALL
// equal successful adds minus successful removes; moves never create or lose tabs.
//
// **Property 10: No duplicate URLs**
//
// *For any* such sequence, no collection SHALL hold two tabs whose URLs are
// equal up to query string and fragment.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn tab_count_and_uniqueness_hold(ops in arb_ops()) {
        let (mgr, ids) = setup();
        let mut expected: usize = 0;

        for op in &ops {
            match op {
                CollectionOp::Add(c, u, suffix) => {
                    let url = format!("https://site{}.example/page{}", u, suffix);
                    match mgr.add_tab(&ids[*c], &url, None, None) {
                        Ok(_) => expected += 1,
                        Err(CollectionError::DuplicateUrl(_)) => {}
                        Err(e) => prop_assert!(false, "unexpected error: {}", e),
                    }
                }
                CollectionOp::Remove(c, n) => {
                    let tabs = tab_ids(&mgr, &ids[*c]);
                    if tabs.is_empty() {
                        continue;
                    }
                    mgr.remove_tab(&ids[*c], &tabs[n % tabs.len()]).unwrap();
                    expected -= 1;
                }
                CollectionOp::Move(f, n, t, i) => {
                    let tabs = tab_ids(&mgr, &ids[*f]);
                    if tabs.is_empty() {
                        continue;
                    }
                    let _ = mgr.move_tab(&ids[*f], &tabs[n % tabs.len()], &ids[*t], *i);
                }
            }
        }

        let collections = mgr.list_collections();
        let total: usize = collections.iter().map(|c| c.tabs.len()).sum();
        prop_assert_eq!(total, expected);

        for collection in &collections {
            for (i, a) in collection.tabs.iter().enumerate() {
                for b in &collection.tabs[i + 1..] {
                    prop_assert!(!urls_equivalent(&a.url, &b.url), "{} ~ {}", a.url, b.url);
                }
            }
        }
    }
}

// **Property 11: Reordering within a collection is a permutation**
//
// *For any* collection and any valid move inside it, the tab id multiset
// SHALL be unchanged and the moved tab SHALL sit at the requested index.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn reorder_is_permutation(count in 1usize..8, pick in 0usize..8, target in 0usize..8) {
        let (mgr, ids) = setup();
        for i in 0..count {
            mgr.add_tab(&ids[0], &format!("https://example.com/{}", i), None, None).unwrap();
        }
        let before = tab_ids(&mgr, &ids[0]);
        let moved = before[pick % count].clone();
        let to_index = target % count;

        mgr.move_tab(&ids[0], &moved, &ids[0], to_index).unwrap();

        let after = tab_ids(&mgr, &ids[0]);
        prop_assert_eq!(&after[to_index], &moved);
        let mut sorted_before = before.clone();
        let mut sorted_after = after.clone();
        sorted_before.sort();
        sorted_after.sort();
        prop_assert_eq!(sorted_before, sorted_after);
    }
}
