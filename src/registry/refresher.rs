//! Registry Refresher
//!
//! Resynchronizes the [`RemoteBankRegistry`] with the central directory.
//!
//! - Single-flight: callers arriving while a refresh is running await the
//!   same shared future, so a burst of cache misses costs one outbound call.
//! - Every invocation gets its own deadline and its own cancellation channel;
//!   nothing is shared between consecutive refreshes.
//! - The work runs in a spawned task, so a caller that gives up (client
//!   disconnect) does not abort the refresh for the other waiters.
//! - The refresh task marks itself finished when it ends, whether or not
//!   anyone is still awaiting it, so an abandoned refresh never blocks the
//!   next one.
//! - Persisting the new snapshot happens off the waiters' path.
//! - A failed refresh never touches the current snapshot.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tracing::{debug, info, warn};

use super::directory::{CentralDirectory, DirectoryError};
use super::snapshot::RemoteBankRegistry;
use super::store::SnapshotStore;

/// Why a refresh did not produce a new snapshot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshFailure {
    #[error("central directory did not answer in time")]
    Timeout,

    #[error("refresh was cancelled")]
    Cancelled,

    #[error("central directory unreachable: {0}")]
    Transport(String),

    #[error("central directory responded with HTTP {0}")]
    Status(u16),

    #[error("central directory response malformed: {0}")]
    Decode(String),

    #[error("refresh task aborted: {0}")]
    Aborted(String),
}

impl From<DirectoryError> for RefreshFailure {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::Transport(msg) => RefreshFailure::Transport(msg),
            DirectoryError::Status(code) => RefreshFailure::Status(code),
            DirectoryError::Decode(msg) => RefreshFailure::Decode(msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Snapshot replaced; number of accepted entries
    Success(usize),
    Failure(RefreshFailure),
}

impl RefreshOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RefreshOutcome::Success(_))
    }
}

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

struct InFlight {
    future: SharedRefresh,
    cancel: Option<oneshot::Sender<()>>,
    finished: Arc<AtomicBool>,
}

impl InFlight {
    fn is_running(&self) -> bool {
        !self.finished.load(Ordering::Acquire)
    }
}

/// Owned by the refresh task; set when the task completes, panics or is aborted
struct FinishedOnDrop(Arc<AtomicBool>);

impl Drop for FinishedOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

pub struct RegistryRefresher {
    registry: Arc<RemoteBankRegistry>,
    directory: Arc<dyn CentralDirectory>,
    store: Option<Arc<dyn SnapshotStore>>,
    timeout: Duration,
    in_flight: Mutex<Option<InFlight>>,
    generation: AtomicU64,
    // Serializes snapshot writes so the newest snapshot is saved last
    persist_lock: Arc<AsyncMutex<()>>,
}

impl RegistryRefresher {
    pub fn new(
        registry: Arc<RemoteBankRegistry>,
        directory: Arc<dyn CentralDirectory>,
        timeout: Duration,
    ) -> Self {
        Self {
            registry,
            directory,
            store: None,
            timeout,
            in_flight: Mutex::new(None),
            generation: AtomicU64::new(0),
            persist_lock: Arc::new(AsyncMutex::new(())),
        }
    }

    /// Persist every successful snapshot to `store` (best effort)
    pub fn with_store(mut self, store: Arc<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn registry(&self) -> &Arc<RemoteBankRegistry> {
        &self.registry
    }

    /// True while a refresh task is running
    pub fn is_refreshing(&self) -> bool {
        let slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref().is_some_and(InFlight::is_running)
    }

    /// Refresh the registry, joining the running refresh if there is one
    pub async fn refresh(&self) -> RefreshOutcome {
        self.join_or_start().await
    }

    /// Abort the running refresh; its waiters see `Failure(Cancelled)`
    ///
    /// Returns false if nothing was in flight.
    pub fn cancel_in_flight(&self) -> bool {
        let mut slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        let running = slot.as_mut().filter(|f| f.is_running());
        match running.and_then(|f| f.cancel.take()) {
            Some(cancel) => {
                info!("Cancelling in-flight registry refresh");
                cancel.send(()).is_ok()
            }
            None => false,
        }
    }

    fn join_or_start(&self) -> SharedRefresh {
        let mut slot = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(running) = slot.as_ref()
            && running.is_running()
        {
            return running.future.clone();
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let job = RefreshJob {
            generation,
            registry: self.registry.clone(),
            directory: self.directory.clone(),
            store: self.store.clone(),
            persist_lock: self.persist_lock.clone(),
            timeout: self.timeout,
        };
        let finished = Arc::new(AtomicBool::new(false));
        let marker = FinishedOnDrop(finished.clone());
        let task = tokio::spawn(async move {
            let _marker = marker;
            job.run(cancel_rx).await
        });

        let future = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(e) => RefreshOutcome::Failure(RefreshFailure::Aborted(e.to_string())),
            }
        }
        .boxed()
        .shared();

        *slot = Some(InFlight {
            future: future.clone(),
            cancel: Some(cancel_tx),
            finished,
        });
        future
    }
}

struct RefreshJob {
    generation: u64,
    registry: Arc<RemoteBankRegistry>,
    directory: Arc<dyn CentralDirectory>,
    store: Option<Arc<dyn SnapshotStore>>,
    persist_lock: Arc<AsyncMutex<()>>,
    timeout: Duration,
}

impl RefreshJob {
    async fn run(self, mut cancel: oneshot::Receiver<()>) -> RefreshOutcome {
        let generation = self.generation;
        let started = Instant::now();
        info!(generation = generation, directory = self.directory.name(), "Registry refresh started");

        // A dropped sender disables the cancel branch instead of firing it
        let fetched = tokio::select! {
            result = tokio::time::timeout(self.timeout, self.directory.fetch_banks()) => result,
            Ok(()) = &mut cancel => {
                warn!(generation = generation, "Registry refresh cancelled");
                return RefreshOutcome::Failure(RefreshFailure::Cancelled);
            }
        };

        let entries = match fetched {
            Ok(Ok(entries)) => entries,
            Ok(Err(e)) => {
                warn!(generation = generation, error = %e, "Registry refresh failed");
                return RefreshOutcome::Failure(e.into());
            }
            Err(_) => {
                warn!(
                    generation = generation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Registry refresh timed out"
                );
                return RefreshOutcome::Failure(RefreshFailure::Timeout);
            }
        };

        let summary = self.registry.replace_snapshot(entries);

        if let Some(store) = self.store {
            spawn_persist(generation, self.registry, store, self.persist_lock);
        }

        info!(
            generation = generation,
            accepted = summary.accepted,
            skipped = summary.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Registry refresh completed"
        );
        RefreshOutcome::Success(summary.accepted)
    }
}

/// Save the current snapshot in the background; failures are logged only
fn spawn_persist(
    generation: u64,
    registry: Arc<RemoteBankRegistry>,
    store: Arc<dyn SnapshotStore>,
    persist_lock: Arc<AsyncMutex<()>>,
) {
    tokio::spawn(async move {
        let _guard = persist_lock.lock().await;
        // Taken under the lock: a later refresh may have swapped in a newer snapshot
        let snapshot = registry.snapshot();
        match store.save(&snapshot).await {
            Ok(()) => debug!(generation = generation, banks = snapshot.len(), "Registry snapshot persisted"),
            Err(e) => warn!(generation = generation, error = %e, "Failed to persist registry snapshot"),
        }
    });
}
