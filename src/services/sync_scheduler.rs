//! Sync scheduler.
//!
//! A background tokio task that starts a sync attempt on a fixed interval,
//! after local saves, and on explicit request. Each attempt runs in its own
//! task; the orchestrator's gate turns overlapping triggers into no-ops.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::services::gist_client::GistApi;
use crate::services::sync_orchestrator::{SyncGate, SyncOrchestrator};

/// Lower bound for the periodic interval, to stay well inside API rate limits.
pub const MIN_INTERVAL_SECS: u64 = 30;
const CHANNEL_CAPACITY: usize = 32;

/// Message types for scheduler communication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerMessage {
    /// Local collections were written
    LocalSave,
    /// Sync requested by the user
    SyncNow,
    /// Stop the scheduler loop
    Shutdown,
}

pub fn channel() -> (mpsc::Sender<SchedulerMessage>, mpsc::Receiver<SchedulerMessage>) {
    mpsc::channel(CHANNEL_CAPACITY)
}

/// Clamps a configured interval to [`MIN_INTERVAL_SECS`].
pub fn interval_from_secs(secs: u64) -> Duration {
    Duration::from_secs(secs.max(MIN_INTERVAL_SECS))
}

/// Save-side hook: asks the scheduler for a sync after a local write.
///
/// Nothing is sent while an attempt is running, so the merge step's own
/// write does not schedule another round.
#[derive(Debug, Clone)]
pub struct SyncTrigger {
    gate: SyncGate,
    sender: mpsc::Sender<SchedulerMessage>,
}

impl SyncTrigger {
    pub fn new(gate: SyncGate, sender: mpsc::Sender<SchedulerMessage>) -> Self {
        Self { gate, sender }
    }

    pub fn fire(&self) {
        let phase = self.gate.phase();
        if !phase.is_idle() {
            log::debug!("save during sync ({:?}), not triggering", phase);
            return;
        }
        if let Err(e) = self.sender.try_send(SchedulerMessage::LocalSave) {
            log::debug!("sync trigger dropped: {}", e);
        }
    }
}

/// Handle to a running scheduler task.
pub struct SyncScheduler {
    sender: mpsc::Sender<SchedulerMessage>,
    handle: JoinHandle<()>,
}

impl SyncScheduler {
    pub fn shutdown(&self) {
        let _ = self.sender.try_send(SchedulerMessage::Shutdown);
    }

    /// Waits for the loop to exit after [`shutdown`](Self::shutdown).
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            log::warn!("sync scheduler task ended abnormally: {}", e);
        }
    }
}

/// Spawns the scheduler loop. Must be called inside a tokio runtime.
///
/// The first interval tick fires immediately, so an attempt runs at startup.
pub fn start_sync_scheduler<A: GistApi + 'static>(
    orchestrator: Arc<SyncOrchestrator<A>>,
    sender: mpsc::Sender<SchedulerMessage>,
    receiver: mpsc::Receiver<SchedulerMessage>,
    interval: Duration,
) -> SyncScheduler {
    let handle = tokio::spawn(scheduler_loop(orchestrator, receiver, interval));
    log::info!("sync scheduler started, interval {:?}", interval);
    SyncScheduler { sender, handle }
}

async fn scheduler_loop<A: GistApi + 'static>(
    orchestrator: Arc<SyncOrchestrator<A>>,
    mut receiver: mpsc::Receiver<SchedulerMessage>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => spawn_attempt(&orchestrator, "interval"),
            message = receiver.recv() => match message {
                Some(SchedulerMessage::LocalSave) => spawn_attempt(&orchestrator, "local save"),
                Some(SchedulerMessage::SyncNow) => spawn_attempt(&orchestrator, "manual"),
                Some(SchedulerMessage::Shutdown) | None => break,
            },
        }
    }
    log::info!("sync scheduler stopped");
}

fn spawn_attempt<A: GistApi + 'static>(orchestrator: &Arc<SyncOrchestrator<A>>, reason: &'static str) {
    let orchestrator = Arc::clone(orchestrator);
    tokio::spawn(async move {
        log::debug!("sync triggered by {}", reason);
        match orchestrator.sync().await {
            Err(e) if e.is_retryable() => log::debug!("{} sync attempt failed, next trigger retries: {}", reason, e),
            Err(e) => log::warn!("{} sync attempt failed: {}", reason, e),
            Ok(_) => {}
        }
    });
}
