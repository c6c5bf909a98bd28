//! In-memory Transaction Ledger
//!
//! Same contract as the PostgreSQL ledger; used by the engine's unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Mutex;
use uuid::Uuid;

use super::{
    clamp_paging, direction_for, total_pages, LedgerError, TransactionPage, TransactionRecord,
    TransferLedger,
};

#[derive(Debug, Clone)]
struct StoredTransaction {
    id: Uuid,
    from_user_id: Uuid,
    to_user_id: Uuid,
    amount: Decimal,
    created_at: DateTime<Utc>,
}

/// Ledger held in process memory, append order preserved
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: Mutex<Vec<StoredTransaction>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransferLedger for MemoryLedger {
    async fn append(
        &self,
        from_user_id: Uuid,
        to_user_id: Uuid,
        amount: Decimal,
    ) -> Result<Uuid, LedgerError> {
        let id = Uuid::new_v4();
        let mut records = self.records.lock().expect("ledger lock poisoned");
        records.push(StoredTransaction {
            id,
            from_user_id,
            to_user_id,
            amount,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn list(
        &self,
        user_id: Uuid,
        page: i64,
        page_size: i64,
    ) -> Result<TransactionPage, LedgerError> {
        let (page, page_size) = clamp_paging(page, page_size);
        let skip = ((page - 1) * page_size) as usize;

        let records = self.records.lock().expect("ledger lock poisoned");
        // Append order doubles as creation order, so newest-first is a
        // reverse walk.
        let matching: Vec<&StoredTransaction> = records
            .iter()
            .rev()
            .filter(|r| r.from_user_id == user_id || r.to_user_id == user_id)
            .collect();

        let total = matching.len() as i64;
        let transactions = matching
            .into_iter()
            .skip(skip)
            .take(page_size as usize)
            .map(|r| TransactionRecord {
                id: r.id,
                from_user_id: r.from_user_id,
                to_user_id: r.to_user_id,
                amount: r.amount,
                created_at: r.created_at,
                direction: direction_for(r.from_user_id, user_id),
            })
            .collect();

        Ok(TransactionPage {
            transactions,
            current_page: page,
            total_pages: total_pages(total, page_size),
            total_transactions: total,
        })
    }

    async fn purge_user(&self, user_id: Uuid) -> Result<u64, LedgerError> {
        let mut records = self.records.lock().expect("ledger lock poisoned");
        let before = records.len();
        records.retain(|r| r.from_user_id != user_id && r.to_user_id != user_id);
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Direction;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_append_and_list_direction() {
        let ledger = MemoryLedger::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        ledger.append(alice, bob, dec!(3.00)).await.unwrap();
        ledger.append(bob, alice, dec!(1.50)).await.unwrap();

        let page = ledger.list(alice, 1, 10).await.unwrap();
        assert_eq!(page.total_transactions, 2);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);

        // Newest first: the bob -> alice transfer comes back on top
        assert_eq!(page.transactions[0].direction, Direction::Received);
        assert_eq!(page.transactions[0].amount, dec!(1.50));
        assert_eq!(page.transactions[1].direction, Direction::Sent);
        assert_eq!(page.transactions[1].amount, dec!(3.00));
    }

    #[tokio::test]
    async fn test_list_excludes_other_users() {
        let ledger = MemoryLedger::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let carol = Uuid::new_v4();

        ledger.append(alice, bob, dec!(1.00)).await.unwrap();
        ledger.append(bob, carol, dec!(2.00)).await.unwrap();

        let page = ledger.list(alice, 1, 10).await.unwrap();
        assert_eq!(page.total_transactions, 1);
        assert_eq!(page.transactions[0].amount, dec!(1.00));
    }

    #[tokio::test]
    async fn test_pagination() {
        let ledger = MemoryLedger::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        for i in 1..=25 {
            ledger
                .append(alice, bob, Decimal::new(i, 2))
                .await
                .unwrap();
        }

        let page1 = ledger.list(alice, 1, 10).await.unwrap();
        assert_eq!(page1.transactions.len(), 10);
        assert_eq!(page1.total_transactions, 25);
        assert_eq!(page1.total_pages, 3);
        // Newest first: the last append (0.25) leads page one
        assert_eq!(page1.transactions[0].amount, dec!(0.25));

        let page3 = ledger.list(alice, 3, 10).await.unwrap();
        assert_eq!(page3.transactions.len(), 5);
        assert_eq!(page3.transactions[4].amount, dec!(0.01));

        // Past the end: empty page, same totals
        let page4 = ledger.list(alice, 4, 10).await.unwrap();
        assert!(page4.transactions.is_empty());
        assert_eq!(page4.total_pages, 3);
    }

    #[tokio::test]
    async fn test_purge_user() {
        let ledger = MemoryLedger::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let carol = Uuid::new_v4();

        ledger.append(alice, bob, dec!(1.00)).await.unwrap();
        ledger.append(bob, alice, dec!(2.00)).await.unwrap();
        ledger.append(bob, carol, dec!(3.00)).await.unwrap();

        let removed = ledger.purge_user(alice).await.unwrap();
        assert_eq!(removed, 2);

        let page = ledger.list(bob, 1, 10).await.unwrap();
        assert_eq!(page.total_transactions, 1);
        assert_eq!(page.transactions[0].amount, dec!(3.00));
    }
}
