//! Data models for bank accounts

use serde::{Deserialize, Serialize};

use super::validation::bank_prefix;

/// Bank account held at the local bank
///
/// `balance` is kept in minor currency units and is never negative once a
/// mutation has committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Owner reference (identity service user id)
    pub user_id: String,
    pub account_number: String,
    pub balance: i64,
    pub currency: String,
}

impl Account {
    pub fn new(
        user_id: impl Into<String>,
        account_number: impl Into<String>,
        balance: i64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            account_number: account_number.into(),
            balance,
            currency: currency.into(),
        }
    }

    /// Prefix of the bank owning this account
    pub fn bank_prefix(&self) -> Option<&str> {
        bank_prefix(&self.account_number)
    }

    pub fn can_cover(&self, amount: i64) -> bool {
        self.balance >= amount
    }
}
