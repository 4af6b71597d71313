//! Remote settlement hand-off
//!
//! Cross-bank transfers are recorded as `submitted` and passed to a
//! [`SettlementClient`] addressed at the remote bank's `transactionUrl`. The
//! bank-to-bank protocol lives behind this trait.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use super::types::TransferRecord;
use crate::registry::RemoteBank;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("Remote bank rejected transfer: {0}")]
    Rejected(String),

    #[error("Remote bank unreachable: {0}")]
    Unreachable(String),
}

#[async_trait]
pub trait SettlementClient: Send + Sync {
    fn name(&self) -> &'static str;

    /// Deliver `record` to `bank`
    async fn submit(&self, bank: &RemoteBank, record: &TransferRecord) -> Result<(), SettlementError>;
}

/// Settlement client that only logs the hand-off
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSettlementClient;

#[async_trait]
impl SettlementClient for LoggingSettlementClient {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn submit(&self, bank: &RemoteBank, record: &TransferRecord) -> Result<(), SettlementError> {
        info!(
            transfer_id = %record.id,
            bank_prefix = %bank.bank_prefix,
            transaction_url = %bank.transaction_url,
            amount = record.amount,
            currency = %record.currency,
            "Remote transfer handed off for settlement"
        );
        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use tokio::sync::mpsc;

    #[derive(Debug, Clone)]
    pub struct Handoff {
        pub transaction_url: String,
        pub record: TransferRecord,
    }

    /// Forwards every hand-off to a channel the test can await
    pub struct RecordingSettlementClient {
        tx: mpsc::UnboundedSender<Handoff>,
        failure: Option<SettlementError>,
    }

    impl RecordingSettlementClient {
        pub fn new() -> (Self, mpsc::UnboundedReceiver<Handoff>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Self { tx, failure: None }, rx)
        }

        pub fn failing(error: SettlementError) -> (Self, mpsc::UnboundedReceiver<Handoff>) {
            let (mut client, rx) = Self::new();
            client.failure = Some(error);
            (client, rx)
        }
    }

    #[async_trait]
    impl SettlementClient for RecordingSettlementClient {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn submit(
            &self,
            bank: &RemoteBank,
            record: &TransferRecord,
        ) -> Result<(), SettlementError> {
            let _ = self.tx.send(Handoff {
                transaction_url: bank.transaction_url.clone(),
                record: record.clone(),
            });
            match &self.failure {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }
    }
}
