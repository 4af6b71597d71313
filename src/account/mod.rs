//! Account Ledger module
//!
//! Accounts are created outside this service and only ever mutated through
//! [`AccountLedger`] debit / credit / transfer.

pub mod ledger;
pub mod models;
pub mod repository;
pub mod validation;

// Re-export commonly used types
pub use ledger::{AccountLedger, LedgerError, MemoryLedger};
pub use models::Account;
pub use repository::PgLedger;
pub use validation::{BANK_PREFIX_LEN, bank_prefix, is_valid_account_number, is_valid_bank_prefix};
