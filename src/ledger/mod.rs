//! Transaction Ledger module
//!
//! Append-only record of completed transfers, used for history display, not
//! for balance computation. Records are written once, immediately after the
//! transfer commits, and never mutated.

mod memory;
mod postgres;

pub use memory::MemoryLedger;
pub use postgres::PgLedger;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Largest accepted page size for history listings
pub const MAX_PAGE_SIZE: i64 = 100;

/// Whether a listed transfer left or entered the queried user's account.
/// Derived at read time from the record's endpoints, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

/// A completed transfer as listed for one user.
///
/// `amount` is the decimal major-unit value as originally requested; the
/// account store keeps minor units, the ledger keeps the display form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub direction: Direction,
}

/// One page of a user's transfer history, newest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub transactions: Vec<TransactionRecord>,
    pub current_page: i64,
    pub total_pages: i64,
    pub total_transactions: i64,
}

/// Ledger errors
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Append-only store of completed transfers.
#[async_trait]
pub trait TransferLedger: Send + Sync {
    /// Record a committed transfer. Returns the new record's id.
    async fn append(
        &self,
        from_user_id: Uuid,
        to_user_id: Uuid,
        amount: Decimal,
    ) -> Result<Uuid, LedgerError>;

    /// List transfers touching `user_id`, newest first. `page` is 1-indexed;
    /// out-of-range values are clamped.
    async fn list(
        &self,
        user_id: Uuid,
        page: i64,
        page_size: i64,
    ) -> Result<TransactionPage, LedgerError>;

    /// Delete every record touching `user_id`. Only used by the
    /// account-closure cascade. Returns the number of records removed.
    async fn purge_user(&self, user_id: Uuid) -> Result<u64, LedgerError>;
}

#[async_trait]
impl<T: TransferLedger + ?Sized> TransferLedger for std::sync::Arc<T> {
    async fn append(
        &self,
        from_user_id: Uuid,
        to_user_id: Uuid,
        amount: Decimal,
    ) -> Result<Uuid, LedgerError> {
        (**self).append(from_user_id, to_user_id, amount).await
    }

    async fn list(
        &self,
        user_id: Uuid,
        page: i64,
        page_size: i64,
    ) -> Result<TransactionPage, LedgerError> {
        (**self).list(user_id, page, page_size).await
    }

    async fn purge_user(&self, user_id: Uuid) -> Result<u64, LedgerError> {
        (**self).purge_user(user_id).await
    }
}

/// Clamp listing parameters: page >= 1, 1 <= page_size <= MAX_PAGE_SIZE.
pub(crate) fn clamp_paging(page: i64, page_size: i64) -> (i64, i64) {
    (page.max(1), page_size.clamp(1, MAX_PAGE_SIZE))
}

/// `ceil(total / page_size)`; zero records means zero pages.
pub(crate) fn total_pages(total: i64, page_size: i64) -> i64 {
    (total + page_size - 1) / page_size
}

pub(crate) fn direction_for(from_user_id: Uuid, user_id: Uuid) -> Direction {
    if from_user_id == user_id {
        Direction::Sent
    } else {
        Direction::Received
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_paging() {
        assert_eq!(clamp_paging(0, 10), (1, 10));
        assert_eq!(clamp_paging(-3, 0), (1, 1));
        assert_eq!(clamp_paging(2, 1000), (2, MAX_PAGE_SIZE));
        assert_eq!(clamp_paging(5, 25), (5, 25));
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(95, 10), 10);
    }

    #[test]
    fn test_direction_for() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(direction_for(a, a), Direction::Sent);
        assert_eq!(direction_for(a, b), Direction::Received);
    }
}
