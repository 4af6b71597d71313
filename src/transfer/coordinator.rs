//! Transfer Coordinator
//!
//! Drives one transfer request through the pipeline stages and decides
//! between the local and the cross-bank path.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::error::TransferError;
use super::settlement::SettlementClient;
use super::state::TransferStage;
use super::store::TransferStore;
use super::types::{
    Route, Sender, TransferReceipt, TransferRecord, TransferRequest, TransferStatus,
};
use super::validation::validate_request;
use crate::account::{AccountLedger, LedgerError, bank_prefix};
use crate::registry::{RefreshOutcome, RegistryRefresher, RemoteBank, RemoteBankRegistry};

pub struct TransferCoordinator {
    local_prefix: String,
    ledger: Arc<dyn AccountLedger>,
    store: Arc<dyn TransferStore>,
    refresher: Arc<RegistryRefresher>,
    settlement: Arc<dyn SettlementClient>,
}

impl TransferCoordinator {
    pub fn new(
        local_prefix: impl Into<String>,
        ledger: Arc<dyn AccountLedger>,
        store: Arc<dyn TransferStore>,
        refresher: Arc<RegistryRefresher>,
        settlement: Arc<dyn SettlementClient>,
    ) -> Self {
        Self {
            local_prefix: local_prefix.into(),
            ledger,
            store,
            refresher,
            settlement,
        }
    }

    pub fn local_prefix(&self) -> &str {
        &self.local_prefix
    }

    pub fn registry(&self) -> &Arc<RemoteBankRegistry> {
        self.refresher.registry()
    }

    pub fn refresher(&self) -> &Arc<RegistryRefresher> {
        &self.refresher
    }

    /// Execute a transfer on behalf of `sender`
    pub async fn submit(
        &self,
        sender: &Sender,
        request: TransferRequest,
    ) -> Result<TransferReceipt, TransferError> {
        let mut stage = TransferStage::Validating;
        let result = self.drive(&mut stage, sender, &request).await;

        match &result {
            Ok(receipt) => info!(
                transfer_id = %receipt.transfer.id,
                user_id = %sender.user_id,
                from = %request.account_from,
                to = %request.account_to,
                amount = request.amount,
                status = %receipt.transfer.status,
                stage = %TransferStage::Done,
                "Transfer accepted"
            ),
            Err(e) => {
                let failed_at = stage.reject();
                warn!(
                    user_id = %sender.user_id,
                    from = %request.account_from,
                    to = %request.account_to,
                    amount = request.amount,
                    failed_at = %failed_at,
                    stage = %stage,
                    code = e.code(),
                    error = %e,
                    "Transfer rejected"
                )
            }
        }
        result
    }

    /// Transfer history of `sender`, newest first
    pub async fn list_transfers(&self, sender: &Sender) -> Result<Vec<TransferRecord>, TransferError> {
        Ok(self.store.list_for_user(&sender.user_id).await?)
    }

    async fn drive(
        &self,
        stage: &mut TransferStage,
        sender: &Sender,
        request: &TransferRequest,
    ) -> Result<TransferReceipt, TransferError> {
        validate_request(request)?;

        *stage = TransferStage::Resolving;
        if bank_prefix(&request.account_from) != Some(self.local_prefix.as_str()) {
            return Err(TransferError::WrongSourceBank);
        }

        let account = match self.ledger.find_account(&sender.user_id).await {
            Ok(account) => account,
            Err(LedgerError::NotFound(_)) => return Err(TransferError::NotAuthenticated),
            Err(e) => return Err(e.into()),
        };
        if account.account_number != request.account_from {
            return Err(TransferError::OwnershipMismatch);
        }
        if !account.can_cover(request.amount) {
            return Err(TransferError::InsufficientFunds);
        }

        *stage = TransferStage::Executing;
        let route = match bank_prefix(&request.account_to) {
            Some(prefix) if prefix == self.local_prefix => Route::Local,
            Some(prefix) => Route::Remote(self.resolve_remote_bank(prefix).await?),
            None => return Err(TransferError::AccountNotFound(request.account_to.clone())),
        };

        match route {
            Route::Local => self.execute_local(stage, sender, request).await,
            Route::Remote(bank) => self.execute_remote(stage, sender, request, bank).await,
        }
    }

    async fn execute_local(
        &self,
        stage: &mut TransferStage,
        sender: &Sender,
        request: &TransferRequest,
    ) -> Result<TransferReceipt, TransferError> {
        self.ledger
            .find_account_by_number(&request.account_to)
            .await?;
        self.ledger
            .transfer(&request.account_from, &request.account_to, request.amount)
            .await?;

        *stage = TransferStage::Recording;
        let record = TransferRecord::new(sender, request, TransferStatus::Completed);
        if let Err(e) = self.store.append(&record).await {
            error!(
                transfer_id = %record.id,
                error = %e,
                "Failed to record local transfer, reversing ledger movement"
            );
            self.reverse_local(request).await;
            return Err(e.into());
        }

        Ok(TransferReceipt::local(record))
    }

    async fn reverse_local(&self, request: &TransferRequest) {
        match self
            .ledger
            .transfer(&request.account_to, &request.account_from, request.amount)
            .await
        {
            Ok(()) => info!(
                from = %request.account_from,
                to = %request.account_to,
                amount = request.amount,
                "Unrecorded local transfer reversed"
            ),
            Err(e) => error!(
                from = %request.account_from,
                to = %request.account_to,
                amount = request.amount,
                error = %e,
                "Failed to reverse unrecorded local transfer: manual reconciliation required"
            ),
        }
    }

    async fn execute_remote(
        &self,
        stage: &mut TransferStage,
        sender: &Sender,
        request: &TransferRequest,
        bank: RemoteBank,
    ) -> Result<TransferReceipt, TransferError> {
        *stage = TransferStage::Recording;
        let record = TransferRecord::new(sender, request, TransferStatus::Submitted);
        self.store.append(&record).await?;

        self.hand_off(bank, record.clone());
        Ok(TransferReceipt::remote(record))
    }

    /// Registry lookup; on a miss refresh once and look up once more
    async fn resolve_remote_bank(&self, prefix: &str) -> Result<RemoteBank, TransferError> {
        if let Some(bank) = self.registry().lookup(prefix) {
            return Ok(bank);
        }

        info!(bank_prefix = %prefix, "Bank prefix not in registry, refreshing");
        if let RefreshOutcome::Failure(reason) = self.refresher.refresh().await {
            return Err(TransferError::RegistryUnavailable(reason.to_string()));
        }

        self.registry()
            .lookup(prefix)
            .ok_or_else(|| TransferError::UnknownBankPrefix(prefix.to_string()))
    }

    /// Fire-and-forget delivery to the remote bank
    fn hand_off(&self, bank: RemoteBank, record: TransferRecord) {
        let settlement = self.settlement.clone();
        tokio::spawn(async move {
            match settlement.submit(&bank, &record).await {
                Ok(()) => debug!(
                    transfer_id = %record.id,
                    client = settlement.name(),
                    "Settlement hand-off done"
                ),
                Err(e) => error!(
                    transfer_id = %record.id,
                    bank_prefix = %bank.bank_prefix,
                    error = %e,
                    "Settlement hand-off failed"
                ),
            }
        });
    }
}
