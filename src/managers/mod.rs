// tabshelf state managers
// Managers own local state: the persisted collection list, user mutations, debounced saves.

pub mod collection_manager;
pub mod collection_store;
pub mod save_debouncer;
