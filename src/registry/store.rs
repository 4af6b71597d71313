//! Persisted copy of the last good registry snapshot

use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};

use super::snapshot::RegistrySnapshot;
use super::types::RemoteBank;
use crate::db::{SafeRow, StoreError};

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Last saved bank list (empty if nothing was saved yet)
    async fn load(&self) -> Result<Vec<RemoteBank>, StoreError>;

    /// Replace the saved bank list with `snapshot`
    async fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), StoreError>;
}

/// Snapshot kept in the `remote_banks` table
pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn load(&self) -> Result<Vec<RemoteBank>, StoreError> {
        let rows = sqlx::query(
            "SELECT bank_prefix, name, transaction_url, api_key, owners, jwks_url
             FROM remote_banks ORDER BY bank_prefix",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut banks = Vec::with_capacity(rows.len());
        for row in &rows {
            let bank = (|| {
                Some(RemoteBank {
                    bank_prefix: row.try_get_log("bank_prefix")?,
                    name: row.try_get_log("name")?,
                    transaction_url: row.try_get_log("transaction_url")?,
                    api_key: row.try_get_log("api_key")?,
                    owners: row.try_get_log("owners")?,
                    jwks_url: row.try_get_log("jwks_url")?,
                })
            })();
            match bank {
                Some(bank) => banks.push(bank),
                None => warn!("Skipping unreadable remote_banks row"),
            }
        }
        Ok(banks)
    }

    async fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM remote_banks")
            .execute(&mut *tx)
            .await?;

        for bank in snapshot.banks() {
            sqlx::query(
                "INSERT INTO remote_banks (bank_prefix, name, transaction_url, api_key, owners, jwks_url)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(&bank.bank_prefix)
            .bind(&bank.name)
            .bind(&bank.transaction_url)
            .bind(&bank.api_key)
            .bind(&bank.owners)
            .bind(&bank.jwks_url)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(banks = snapshot.len(), "Registry snapshot persisted");
        Ok(())
    }
}

/// In-process snapshot store
#[derive(Default)]
pub struct MemorySnapshotStore {
    banks: Mutex<Vec<RemoteBank>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_banks(banks: Vec<RemoteBank>) -> Self {
        Self {
            banks: Mutex::new(banks),
        }
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> Result<Vec<RemoteBank>, StoreError> {
        Ok(self.banks.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn save(&self, snapshot: &RegistrySnapshot) -> Result<(), StoreError> {
        let mut banks: Vec<RemoteBank> = snapshot.banks().cloned().collect();
        banks.sort_by(|a, b| a.bank_prefix.cmp(&b.bank_prefix));
        *self.banks.lock().unwrap_or_else(|e| e.into_inner()) = banks;
        Ok(())
    }
}
