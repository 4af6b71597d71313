//! Registry Sync Worker
//!
//! Background task that keeps the registry warm so most remote transfers
//! never hit the refresh-on-miss path.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::refresher::{RefreshOutcome, RegistryRefresher};

pub struct RegistrySyncWorker {
    refresher: Arc<RegistryRefresher>,
    interval: Duration,
}

impl RegistrySyncWorker {
    pub fn new(refresher: Arc<RegistryRefresher>, interval: Duration) -> Self {
        Self {
            refresher,
            interval,
        }
    }

    /// Run the periodic refresh loop forever
    pub async fn run(&self) -> ! {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting registry sync worker"
        );

        loop {
            tokio::time::sleep(self.interval).await;
            self.sync_once().await;
        }
    }

    /// One refresh; shares the in-flight refresh with request-driven misses
    pub async fn sync_once(&self) -> RefreshOutcome {
        let outcome = self.refresher.refresh().await;
        match &outcome {
            RefreshOutcome::Success(count) => debug!(banks = count, "Periodic registry sync done"),
            RefreshOutcome::Failure(reason) => {
                warn!(reason = %reason, "Periodic registry sync failed; keeping current snapshot")
            }
        }
        outcome
    }

    /// Fetch the directory once at startup unless a persisted snapshot is already loaded
    pub async fn warm_up(&self) -> Option<RefreshOutcome> {
        if !self.refresher.registry().is_empty() {
            debug!("Registry already seeded, skipping warm-up");
            return None;
        }
        Some(self.sync_once().await)
    }
}
