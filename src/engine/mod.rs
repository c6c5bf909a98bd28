//! Transfer Engine
//!
//! Orchestrates the movement of funds between two accounts: amount
//! normalization, the atomic debit/credit scope against the account store,
//! then the ledger append and recipient notification. Every invocation
//! re-reads current state through the store; nothing is cached across calls.


use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::{TransferAmount, TransferError};
use crate::ledger::TransferLedger;
use crate::notify::{MoneyReceived, Notifier};
use crate::store::{AccountStore, StoreError};

/// Default bound on the atomic scope, including lock waits.
const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a completed transfer.
///
/// `ledger_record` is `None` when the balances moved but the history record
/// could not be written; that gap is reconciled out of band and is the only
/// inconsistency the engine tolerates. The reverse (record without balance
/// movement) cannot happen because the append runs strictly after commit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub amount: Decimal,
    pub amount_minor: i64,
    pub ledger_record: Option<Uuid>,
}

/// Engine for atomic balance transfers between two accounts
pub struct TransferEngine<S, L, N> {
    store: S,
    ledger: L,
    notifier: N,
    timeout: Duration,
}

impl<S, L, N> TransferEngine<S, L, N>
where
    S: AccountStore,
    L: TransferLedger,
    N: Notifier,
{
    pub fn new(store: S, ledger: L, notifier: N) -> Self {
        Self {
            store,
            ledger,
            notifier,
            timeout: DEFAULT_TRANSFER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Move `amount` (decimal major units) from sender to recipient.
    ///
    /// The debit and credit apply atomically or not at all; there is no
    /// automatic retry on conflict. Once the store reports the commit the
    /// transfer is final, whatever happens to the ledger append or the
    /// notification afterwards.
    pub async fn transfer(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        amount: Decimal,
    ) -> Result<TransferReceipt, TransferError> {
        // The route validates this too; re-checked here as an invariant.
        if sender_id == recipient_id {
            return Err(TransferError::SelfTransfer);
        }

        let amount = TransferAmount::from_major(amount)
            .map_err(|e| TransferError::InvalidAmount(e.to_string()))?;

        let apply = self
            .store
            .apply_transfer(sender_id, recipient_id, amount.minor_units());

        match tokio::time::timeout(self.timeout, apply).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(map_store_error(e, sender_id)),
            Err(_) => {
                tracing::error!(
                    %sender_id,
                    %recipient_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "transfer timed out before commit"
                );
                return Err(TransferError::StorageUnavailable);
            }
        }

        let ledger_record = match self
            .ledger
            .append(sender_id, recipient_id, amount.major_units())
            .await
        {
            Ok(record_id) => Some(record_id),
            Err(e) => {
                tracing::error!(
                    %sender_id,
                    %recipient_id,
                    amount = %amount,
                    error = %e,
                    "transfer committed but ledger append failed; needs reconciliation"
                );
                None
            }
        };

        if let Some(transaction_id) = ledger_record {
            let event =
                MoneyReceived::new(amount.major_units(), sender_id, recipient_id, transaction_id);
            if let Err(e) = self.notifier.money_received(event).await {
                tracing::warn!(%recipient_id, error = %e, "money_received notification failed");
            }
        }

        Ok(TransferReceipt {
            sender_id,
            recipient_id,
            amount: amount.major_units(),
            amount_minor: amount.minor_units(),
            ledger_record,
        })
    }
}

/// Map store failures onto the transfer error taxonomy. The store reports a
/// missing account by id; which side it was decides the kind.
fn map_store_error(err: StoreError, sender_id: Uuid) -> TransferError {
    match err {
        StoreError::AccountNotFound(id) if id == sender_id => TransferError::SenderNotFound,
        StoreError::AccountNotFound(_) => TransferError::RecipientNotFound,
        StoreError::InsufficientBalance { .. } => TransferError::InsufficientBalance,
        StoreError::Conflict => TransferError::CommitConflict,
        StoreError::Database(e) => {
            tracing::error!(error = %e, "transfer aborted by storage failure");
            TransferError::StorageUnavailable
        }
        // open/close-only failures; apply_transfer never produces them
        StoreError::AccountExists(_) | StoreError::BalanceNotZero(_) => {
            TransferError::StorageUnavailable
        }
    }
}
