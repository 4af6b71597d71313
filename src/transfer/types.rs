//! Transfer request / record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::registry::RemoteBank;

/// Body of `POST /transfer`
///
/// `amount` is in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub account_from: String,
    pub account_to: String,
    pub amount: i64,
    pub currency: String,
    pub explanation: String,
}

/// Caller identity established by the auth middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub user_id: String,
    pub first_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Local transfer, balances already moved
    Completed,
    /// Remote transfer handed to settlement
    Submitted,
    Failed,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Completed => "completed",
            TransferStatus::Submitted => "submitted",
            TransferStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(TransferStatus::Completed),
            "submitted" => Some(TransferStatus::Submitted),
            "failed" => Some(TransferStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable log entry for an accepted transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: Uuid,
    pub user_id: String,
    pub amount: i64,
    pub currency: String,
    pub account_from: String,
    pub account_to: String,
    pub explanation: String,
    pub status: TransferStatus,
    pub sender_name: String,
    pub created_at: DateTime<Utc>,
}

impl TransferRecord {
    pub fn new(sender: &Sender, request: &TransferRequest, status: TransferStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: sender.user_id.clone(),
            amount: request.amount,
            currency: request.currency.clone(),
            account_from: request.account_from.clone(),
            account_to: request.account_to.clone(),
            explanation: request.explanation.trim().to_string(),
            status,
            sender_name: sender.first_name.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Where the money goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Local,
    Remote(RemoteBank),
}

pub const LOCAL_TRANSFER_MESSAGE: &str = "Local transfer completed!";
pub const REMOTE_TRANSFER_MESSAGE: &str = "Remote transfer added!";

/// Successful outcome returned to the caller (201 body)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub message: &'static str,
    pub transfer: TransferRecord,
}

impl TransferReceipt {
    pub fn local(transfer: TransferRecord) -> Self {
        Self {
            message: LOCAL_TRANSFER_MESSAGE,
            transfer,
        }
    }

    pub fn remote(transfer: TransferRecord) -> Self {
        Self {
            message: REMOTE_TRANSFER_MESSAGE,
            transfer,
        }
    }
}
