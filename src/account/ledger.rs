//! Account Ledger
//!
//! Owns account balances. Every balance change is a single atomic
//! read-modify-write on one account; a local transfer applies its debit and
//! credit legs as one unit.
//!
//! # Implementations
//!
//! - [`MemoryLedger`]: `DashMap` entries, per-account serialized mutation
//! - [`PgLedger`](super::repository::PgLedger): conditional `UPDATE`s inside
//!   one PostgreSQL transaction

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::models::Account;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Insufficient funds in {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: String,
        balance: i64,
        requested: i64,
    },

    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Balance overflow on account {0}")]
    Overflow(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(e: sqlx::Error) -> Self {
        LedgerError::Database(e.to_string())
    }
}

/// Balance store used by the transfer orchestrator
#[async_trait]
pub trait AccountLedger: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Account owned by `user_id`
    async fn find_account(&self, user_id: &str) -> Result<Account, LedgerError>;

    async fn find_account_by_number(&self, account_number: &str) -> Result<Account, LedgerError>;

    /// Atomically subtract `amount`; fails without change if the balance
    /// would go negative. Returns the account after the update.
    async fn debit(&self, account_number: &str, amount: i64) -> Result<Account, LedgerError>;

    /// Atomically add `amount`. Returns the account after the update.
    async fn credit(&self, account_number: &str, amount: i64) -> Result<Account, LedgerError>;

    /// Move `amount` from one account to another as one unit
    ///
    /// The default runs the two legs as a saga: if the credit leg fails after
    /// the debit committed, the debit is reversed before the error is
    /// returned. Backends with transactions override this.
    async fn transfer(&self, from: &str, to: &str, amount: i64) -> Result<(), LedgerError> {
        self.debit(from, amount).await?;

        if let Err(e) = self.credit(to, amount).await {
            warn!(
                ledger = self.name(),
                from = %from,
                to = %to,
                amount = amount,
                error = %e,
                "Credit leg failed, compensating debit"
            );
            if let Err(comp) = self.credit(from, amount).await {
                error!(
                    ledger = self.name(),
                    from = %from,
                    amount = amount,
                    error = %comp,
                    "Compensating credit failed: source account left debited"
                );
            }
            return Err(e);
        }

        Ok(())
    }
}

/// In-memory ledger
///
/// Each account lives in its own `DashMap` entry; `get_mut` holds the entry
/// lock for the whole check-and-update, so concurrent debits on the same
/// account are serialized.
pub struct MemoryLedger {
    /// account_number -> account
    accounts: DashMap<String, Account>,
    /// user_id -> account_number
    owners: DashMap<String, String>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            owners: DashMap::new(),
        }
    }

    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let ledger = Self::new();
        for account in accounts {
            ledger.open_account(account);
        }
        ledger
    }

    /// Register an account (accounts are created outside the transfer flow)
    pub fn open_account(&self, account: Account) {
        self.owners
            .insert(account.user_id.clone(), account.account_number.clone());
        self.accounts.insert(account.account_number.clone(), account);
    }

    pub fn balance(&self, account_number: &str) -> Option<i64> {
        self.accounts.get(account_number).map(|a| a.balance)
    }

    /// Sum of all balances
    pub fn total_balance(&self) -> i64 {
        self.accounts.iter().map(|a| a.balance).sum()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountLedger for MemoryLedger {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn find_account(&self, user_id: &str) -> Result<Account, LedgerError> {
        let account_number = self
            .owners
            .get(user_id)
            .map(|n| n.value().clone())
            .ok_or_else(|| LedgerError::NotFound(user_id.to_string()))?;
        self.find_account_by_number(&account_number).await
    }

    async fn find_account_by_number(&self, account_number: &str) -> Result<Account, LedgerError> {
        self.accounts
            .get(account_number)
            .map(|a| a.value().clone())
            .ok_or_else(|| LedgerError::NotFound(account_number.to_string()))
    }

    async fn debit(&self, account_number: &str, amount: i64) -> Result<Account, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let mut account = self
            .accounts
            .get_mut(account_number)
            .ok_or_else(|| LedgerError::NotFound(account_number.to_string()))?;

        if !account.can_cover(amount) {
            return Err(LedgerError::InsufficientFunds {
                account: account_number.to_string(),
                balance: account.balance,
                requested: amount,
            });
        }

        account.balance -= amount;
        debug!(account = %account_number, amount = amount, balance = account.balance, "Debited");
        Ok(account.clone())
    }

    async fn credit(&self, account_number: &str, amount: i64) -> Result<Account, LedgerError> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount);
        }

        let mut account = self
            .accounts
            .get_mut(account_number)
            .ok_or_else(|| LedgerError::NotFound(account_number.to_string()))?;

        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(account_number.to_string()))?;
        debug!(account = %account_number, amount = amount, balance = account.balance, "Credited");
        Ok(account.clone())
    }
}

/// Test doubles
#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Wraps a [`MemoryLedger`] and fails credits to selected accounts
    pub struct FlakyCreditLedger {
        pub inner: MemoryLedger,
        failing_credits: Mutex<HashSet<String>>,
    }

    impl FlakyCreditLedger {
        pub fn new(inner: MemoryLedger) -> Self {
            Self {
                inner,
                failing_credits: Mutex::new(HashSet::new()),
            }
        }

        pub fn fail_credits_to(&self, account_number: &str) {
            self.failing_credits
                .lock()
                .unwrap()
                .insert(account_number.to_string());
        }
    }

    #[async_trait]
    impl AccountLedger for FlakyCreditLedger {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn find_account(&self, user_id: &str) -> Result<Account, LedgerError> {
            self.inner.find_account(user_id).await
        }

        async fn find_account_by_number(
            &self,
            account_number: &str,
        ) -> Result<Account, LedgerError> {
            self.inner.find_account_by_number(account_number).await
        }

        async fn debit(&self, account_number: &str, amount: i64) -> Result<Account, LedgerError> {
            self.inner.debit(account_number, amount).await
        }

        async fn credit(&self, account_number: &str, amount: i64) -> Result<Account, LedgerError> {
            if self.failing_credits.lock().unwrap().contains(account_number) {
                return Err(LedgerError::Database("injected credit failure".to_string()));
            }
            self.inner.credit(account_number, amount).await
        }
    }
}
