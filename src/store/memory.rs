//! In-memory Account Store
//!
//! Reference implementation of the locking protocol: one mutex per account,
//! acquired in ascending `user_id` order, with the existence and sufficiency
//! checks performed under the same locks as the writes. Used by the engine's
//! unit tests; the PostgreSQL store encodes the same protocol in SQL.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

use super::{AccountStore, StoreError};

/// Account store held entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<BTreeMap<Uuid, Arc<Mutex<i64>>>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn balance(&self, user_id: Uuid) -> Result<Option<i64>, StoreError> {
        let accounts = self.accounts.read().expect("account map lock poisoned");
        Ok(accounts
            .get(&user_id)
            .map(|cell| *cell.lock().expect("account lock poisoned")))
    }

    async fn open(&self, user_id: Uuid, initial_minor: i64) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().expect("account map lock poisoned");
        if accounts.contains_key(&user_id) {
            return Err(StoreError::AccountExists(user_id));
        }
        accounts.insert(user_id, Arc::new(Mutex::new(initial_minor)));
        Ok(())
    }

    async fn close(&self, user_id: Uuid) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().expect("account map lock poisoned");
        let balance = match accounts.get(&user_id) {
            Some(cell) => *cell.lock().expect("account lock poisoned"),
            None => return Err(StoreError::AccountNotFound(user_id)),
        };
        if balance != 0 {
            return Err(StoreError::BalanceNotZero(balance));
        }
        accounts.remove(&user_id);
        Ok(())
    }

    async fn apply_transfer(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        amount_minor: i64,
    ) -> Result<(), StoreError> {
        // The map read lock is held for the whole scope so a concurrent
        // close() cannot remove either record mid-transfer.
        let accounts = self.accounts.read().expect("account map lock poisoned");

        let sender_cell = accounts
            .get(&sender_id)
            .ok_or(StoreError::AccountNotFound(sender_id))?;
        let recipient_cell = accounts.get(&recipient_id);

        let Some(recipient_cell) = recipient_cell else {
            // Sufficiency is still checked first: an overdraw is reported
            // even when the recipient is missing.
            let sender_balance = *sender_cell.lock().expect("account lock poisoned");
            if sender_balance < amount_minor {
                return Err(StoreError::InsufficientBalance {
                    required: amount_minor,
                    available: sender_balance,
                });
            }
            return Err(StoreError::AccountNotFound(recipient_id));
        };

        // Ascending id order; sender == recipient is rejected upstream.
        let (mut sender_balance, mut recipient_balance) = if sender_id < recipient_id {
            let s = sender_cell.lock().expect("account lock poisoned");
            let r = recipient_cell.lock().expect("account lock poisoned");
            (s, r)
        } else {
            let r = recipient_cell.lock().expect("account lock poisoned");
            let s = sender_cell.lock().expect("account lock poisoned");
            (s, r)
        };

        if *sender_balance < amount_minor {
            return Err(StoreError::InsufficientBalance {
                required: amount_minor,
                available: *sender_balance,
            });
        }

        *sender_balance -= amount_minor;
        *recipient_balance += amount_minor;

        Ok(())
    }
}
