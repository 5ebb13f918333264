//! App Core for tabshelf.
//!
//! Central struct holding the store, managers and sync services, managing application lifecycle.

use std::fs;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::database::connection::Database;
use crate::managers::collection_manager::CollectionManager;
use crate::managers::collection_store::CollectionStore;
use crate::managers::save_debouncer::SaveDebouncer;
use crate::platform;
use crate::services::gist_client::{GistApi, GistClient};
use crate::services::remote_store::RemoteStore;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::sync_orchestrator::{SyncGate, SyncOrchestrator};
use crate::services::sync_scheduler::{self, SchedulerMessage, SyncScheduler, SyncTrigger};
use crate::types::settings::AppSettings;

/// Central application struct.
///
/// Generic over the gist transport so tests can drive the whole stack
/// against an in-process fake.
pub struct App<A: GistApi + 'static = GistClient> {
    pub db: Arc<Database>,
    pub store: Arc<CollectionStore>,
    pub collection_manager: CollectionManager,
    pub save_debouncer: SaveDebouncer,
    pub orchestrator: Arc<SyncOrchestrator<A>>,
    pub settings_engine: Mutex<SettingsEngine>,
    sync_interval: Duration,
    scheduler_sender: mpsc::Sender<SchedulerMessage>,
    scheduler_receiver: Mutex<Option<mpsc::Receiver<SchedulerMessage>>>,
    scheduler: Mutex<Option<SyncScheduler>>,
}

impl App<GistClient> {
    /// Creates a new App from the settings file (platform default when `None`).
    ///
    /// The database lives under the platform data directory, or under
    /// `TABSHELF_DATA_DIR` when that is set.
    pub fn new(settings_path: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings_engine = SettingsEngine::new(settings_path);
        let settings = match settings_engine.load() {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("settings unreadable, using defaults: {}", e);
                AppSettings::default()
            }
        };
        let settings_engine = settings_engine.with_settings(settings.clone());

        let db_path = platform::database_path(&settings.storage.database_file);
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        log::info!("opening database at {}", db_path.display());
        let db = Arc::new(Database::open(&db_path)?);
        let api = GistClient::new(&settings.sync)?;

        Ok(App::with_api(db, settings_engine, api))
    }
}

impl<A: GistApi + 'static> App<A> {
    /// Wires the components around an already-open database and gist transport.
    pub fn with_api(db: Arc<Database>, settings_engine: SettingsEngine, api: A) -> Self {
        let settings = settings_engine.get_settings().clone();
        let gate = SyncGate::new();
        let (sender, receiver) = sync_scheduler::channel();

        let store = Arc::new(
            CollectionStore::new(db.clone()).with_sync_trigger(SyncTrigger::new(gate.clone(), sender.clone())),
        );
        let remote = RemoteStore::new(api, store.clone(), &settings.sync);
        let orchestrator = Arc::new(SyncOrchestrator::new(store.clone(), remote, gate));

        Self {
            db,
            collection_manager: CollectionManager::new(store.clone()),
            save_debouncer: SaveDebouncer::new(store.clone(), Duration::from_millis(settings.storage.debounce_ms)),
            store,
            orchestrator,
            settings_engine: Mutex::new(settings_engine),
            sync_interval: sync_scheduler::interval_from_secs(settings.sync.interval_secs),
            scheduler_sender: sender,
            scheduler_receiver: Mutex::new(Some(receiver)),
            scheduler: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> MutexGuard<'_, SettingsEngine> {
        self.settings_engine.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Startup sequence: start the background sync scheduler. Must run inside a tokio runtime.
    /// Calling it twice is a no-op.
    pub fn startup(&self) {
        let receiver = self
            .scheduler_receiver
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        let Some(receiver) = receiver else {
            log::debug!("scheduler already started");
            return;
        };

        let scheduler = sync_scheduler::start_sync_scheduler(
            self.orchestrator.clone(),
            self.scheduler_sender.clone(),
            receiver,
            self.sync_interval,
        );
        *self.scheduler.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(scheduler);
    }

    /// Asks the scheduler for an immediate sync without waiting for it.
    pub fn request_sync(&self) {
        if let Err(e) = self.scheduler_sender.try_send(SchedulerMessage::SyncNow) {
            log::debug!("sync request dropped: {}", e);
        }
    }

    /// Shutdown sequence: flush pending saves, stop the scheduler.
    pub async fn shutdown(&self) {
        if let Err(e) = self.save_debouncer.flush() {
            log::error!("failed to flush pending save on shutdown: {}", e);
        }
        if let Some(e) = self.save_debouncer.take_last_error() {
            log::error!("an earlier debounced save was lost: {}", e);
        }

        let scheduler = self
            .scheduler
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(scheduler) = scheduler {
            scheduler.shutdown();
            scheduler.join().await;
        }
    }
}
