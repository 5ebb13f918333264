// tabshelf services
// Services provide the sync pipeline (canonical form, merge, gist transport, orchestration) plus settings and import/export.

pub mod canonicalizer;
pub mod gist_client;
pub mod import_export;
pub mod merge_engine;
pub mod remote_store;
pub mod settings_engine;
pub mod sync_orchestrator;
pub mod sync_scheduler;
