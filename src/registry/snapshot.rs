//! Remote Bank Registry
//!
//! Copy-on-write cache of the central directory. A refresh builds a complete
//! new [`RegistrySnapshot`] off to the side and swaps one `Arc` pointer, so a
//! reader sees either the old snapshot or the new one, never an empty or
//! half-filled map.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::types::{EntryRejection, RemoteBank};

/// Immutable set of known remote banks keyed by bank prefix
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrySnapshot {
    banks: HashMap<String, RemoteBank>,
    refreshed_at: Option<DateTime<Utc>>,
}

/// Result of building a snapshot from directory entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReplaceSummary {
    pub accepted: usize,
    pub skipped: usize,
}

impl RegistrySnapshot {
    /// Build a snapshot from raw directory entries
    ///
    /// Malformed entries and repeated prefixes are skipped (first one wins).
    pub fn from_entries(entries: Vec<serde_json::Value>) -> (Self, ReplaceSummary) {
        let mut banks = HashMap::with_capacity(entries.len());
        let mut skipped = 0;

        for (index, value) in entries.into_iter().enumerate() {
            let result = RemoteBank::from_json(value).and_then(|bank| {
                if banks.contains_key(&bank.bank_prefix) {
                    Err(EntryRejection::DuplicatePrefix(bank.bank_prefix))
                } else {
                    Ok(bank)
                }
            });

            match result {
                Ok(bank) => {
                    banks.insert(bank.bank_prefix.clone(), bank);
                }
                Err(reason) => {
                    skipped += 1;
                    warn!(index = index, reason = %reason, "Skipping directory entry");
                }
            }
        }

        let summary = ReplaceSummary {
            accepted: banks.len(),
            skipped,
        };
        let snapshot = Self {
            banks,
            refreshed_at: Some(Utc::now()),
        };
        (snapshot, summary)
    }

    /// Snapshot from already-validated banks (e.g. loaded from the database)
    pub fn from_banks(banks: impl IntoIterator<Item = RemoteBank>) -> Self {
        Self {
            banks: banks
                .into_iter()
                .map(|b| (b.bank_prefix.clone(), b))
                .collect(),
            refreshed_at: None,
        }
    }

    pub fn get(&self, bank_prefix: &str) -> Option<&RemoteBank> {
        self.banks.get(bank_prefix)
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }

    pub fn banks(&self) -> impl Iterator<Item = &RemoteBank> {
        self.banks.values()
    }

    /// Same banks, ignoring when they were fetched
    pub fn same_banks(&self, other: &RegistrySnapshot) -> bool {
        self.banks == other.banks
    }

    /// When the snapshot was fetched; `None` if it was seeded from storage
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }
}

/// Shared registry; readers clone the current snapshot pointer
pub struct RemoteBankRegistry {
    current: RwLock<Arc<RegistrySnapshot>>,
}

impl RemoteBankRegistry {
    pub fn new() -> Self {
        Self::with_snapshot(RegistrySnapshot::default())
    }

    pub fn with_snapshot(snapshot: RegistrySnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Current snapshot
    ///
    /// The read lock is held only for the pointer clone.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn lookup(&self, bank_prefix: &str) -> Option<RemoteBank> {
        self.snapshot().get(bank_prefix).cloned()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// Validate `entries`, build the new snapshot and swap it in
    pub fn replace_snapshot(&self, entries: Vec<serde_json::Value>) -> ReplaceSummary {
        let (snapshot, summary) = RegistrySnapshot::from_entries(entries);
        self.install(snapshot);
        info!(
            accepted = summary.accepted,
            skipped = summary.skipped,
            "Remote bank registry replaced"
        );
        summary
    }

    /// Swap in a prepared snapshot
    pub fn install(&self, snapshot: RegistrySnapshot) {
        let next = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = next;
    }
}

impl Default for RemoteBankRegistry {
    fn default() -> Self {
        Self::new()
    }
}
