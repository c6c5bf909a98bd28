//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Outcome kinds for a failed transfer.
///
/// These represent business rule violations and operational failures at the
/// engine boundary. They are independent of the web/infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// Amount failed normalization, or is zero or negative
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Sender and recipient are the same account
    #[error("Cannot transfer to the same account")]
    SelfTransfer,

    /// Sender has no account record
    #[error("Sender account not found")]
    SenderNotFound,

    /// Recipient has no account record
    #[error("Recipient account not found")]
    RecipientNotFound,

    /// Sender balance is less than the requested amount at check time
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// The atomic scope lost to a concurrent modification; the caller may retry
    #[error("Transfer conflicted with a concurrent operation")]
    CommitConflict,

    /// Storage unreachable or timed out; the transfer was not applied
    #[error("Account storage unavailable")]
    StorageUnavailable,
}

impl TransferError {
    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::SelfTransfer
                | Self::SenderNotFound
                | Self::RecipientNotFound
                | Self::InsufficientBalance
        )
    }

    /// Check if retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CommitConflict)
    }
}
