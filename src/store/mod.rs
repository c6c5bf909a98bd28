//! Account Store module
//!
//! One balance record per user, held behind an explicit storage interface.
//! Balances are integer minor units and only ever change through the paired
//! debit/credit of [`AccountStore::apply_transfer`]; nothing else writes them.

mod memory;
mod postgres;

pub use memory::MemoryAccountStore;
pub use postgres::PgAccountStore;

use async_trait::async_trait;
use uuid::Uuid;

/// Errors that can occur in the account store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Referenced account does not exist
    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    /// An account already exists for this user
    #[error("Account already exists: {0}")]
    AccountExists(Uuid),

    /// Debit would overdraw the account
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: i64, available: i64 },

    /// Account cannot be closed while funds remain
    #[error("Account balance is not zero: {0}")]
    BalanceNotZero(i64),

    /// The transaction lost to a concurrent writer and was rolled back
    #[error("Conflicting concurrent update")]
    Conflict,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage interface for account balance records.
///
/// Implementations must guarantee that `apply_transfer` runs its existence
/// and sufficiency checks and both balance writes inside one atomic scope,
/// serialized against any concurrent operation touching either account.
/// Locks are taken in ascending `user_id` order so that two transfers over
/// the same pair of accounts cannot deadlock.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Current balance in minor units, or `None` if no account exists.
    async fn balance(&self, user_id: Uuid) -> Result<Option<i64>, StoreError>;

    /// Create the balance record for a newly registered user.
    async fn open(&self, user_id: Uuid, initial_minor: i64) -> Result<(), StoreError>;

    /// Delete the balance record. Fails with [`StoreError::BalanceNotZero`]
    /// unless the balance is exactly zero.
    async fn close(&self, user_id: Uuid) -> Result<(), StoreError>;

    /// Atomically move `amount_minor` from sender to recipient.
    ///
    /// Checks, in order and under the same locks as the writes: sender
    /// exists, sender balance is sufficient, recipient exists. Either both
    /// balances change or neither does.
    async fn apply_transfer(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        amount_minor: i64,
    ) -> Result<(), StoreError>;
}

#[async_trait]
impl<T: AccountStore + ?Sized> AccountStore for std::sync::Arc<T> {
    async fn balance(&self, user_id: Uuid) -> Result<Option<i64>, StoreError> {
        (**self).balance(user_id).await
    }

    async fn open(&self, user_id: Uuid, initial_minor: i64) -> Result<(), StoreError> {
        (**self).open(user_id, initial_minor).await
    }

    async fn close(&self, user_id: Uuid) -> Result<(), StoreError> {
        (**self).close(user_id).await
    }

    async fn apply_transfer(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        amount_minor: i64,
    ) -> Result<(), StoreError> {
        (**self).apply_transfer(sender_id, recipient_id, amount_minor).await
    }
}
