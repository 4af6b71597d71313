//! Transfer Error Types

use thiserror::Error;

use super::validation::ValidationError;
use crate::account::LedgerError;
use crate::db::StoreError;

/// Why a transfer request was rejected
///
/// Display strings are the messages returned to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    // === Request Errors ===
    #[error("{0}")]
    Validation(ValidationError),

    #[error("You shouldn't be making a transfer to this endpoint.")]
    WrongSourceBank,

    // === Caller Errors ===
    #[error("You must be logged in to make a transfer.")]
    NotAuthenticated,

    #[error(
        "You can only make transfers under your account. Please enter your account number again."
    )]
    OwnershipMismatch,

    // === Account Errors ===
    #[error("Insufficent funds!")]
    InsufficientFunds,

    #[error("Please enter correct receiving account number!")]
    AccountNotFound(String),

    // === Remote Bank Errors ===
    #[error("This prefix is not any of our banks!")]
    UnknownBankPrefix(String),

    #[error("Problems with central pank. Try again later.")]
    RegistryUnavailable(String),

    // === System Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransferError {
    /// Error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::Validation(_) => "VALIDATION_ERROR",
            TransferError::WrongSourceBank => "WRONG_SOURCE_BANK",
            TransferError::NotAuthenticated => "NOT_AUTHENTICATED",
            TransferError::OwnershipMismatch => "OWNERSHIP_MISMATCH",
            TransferError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            TransferError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            TransferError::UnknownBankPrefix(_) => "UNKNOWN_BANK_PREFIX",
            TransferError::RegistryUnavailable(_) => "REGISTRY_UNAVAILABLE",
            TransferError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::Validation(_)
            | TransferError::WrongSourceBank
            | TransferError::AccountNotFound(_)
            | TransferError::UnknownBankPrefix(_) => 400,
            TransferError::NotAuthenticated | TransferError::OwnershipMismatch => 401,
            TransferError::InsufficientFunds => 409,
            TransferError::RegistryUnavailable(_) => 502,
            TransferError::Internal(_) => 500,
        }
    }

    /// Request field the error refers to, if any
    pub fn field(&self) -> Option<&'static str> {
        match self {
            TransferError::Validation(e) => Some(e.field),
            TransferError::WrongSourceBank | TransferError::OwnershipMismatch => {
                Some("accountFrom")
            }
            TransferError::AccountNotFound(_) | TransferError::UnknownBankPrefix(_) => {
                Some("accountTo")
            }
            _ => None,
        }
    }
}

impl From<ValidationError> for TransferError {
    fn from(e: ValidationError) -> Self {
        TransferError::Validation(e)
    }
}

impl From<LedgerError> for TransferError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::InsufficientFunds { .. } => TransferError::InsufficientFunds,
            LedgerError::NotFound(account) => TransferError::AccountNotFound(account),
            LedgerError::InvalidAmount => {
                TransferError::Validation(ValidationError::new("amount", e.to_string()))
            }
            LedgerError::Overflow(_) | LedgerError::Database(_) => {
                TransferError::Internal(e.to_string())
            }
        }
    }
}

impl From<StoreError> for TransferError {
    fn from(e: StoreError) -> Self {
        TransferError::Internal(e.to_string())
    }
}
