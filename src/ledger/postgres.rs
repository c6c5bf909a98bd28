//! PostgreSQL Transaction Ledger

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    clamp_paging, direction_for, total_pages, LedgerError, TransactionPage, TransactionRecord,
    TransferLedger,
};

/// Ledger backed by the `transactions` table
#[derive(Debug, Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransferLedger for PgLedger {
    async fn append(
        &self,
        from_user_id: Uuid,
        to_user_id: Uuid,
        amount: Decimal,
    ) -> Result<Uuid, LedgerError> {
        let record_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO transactions (from_user_id, to_user_id, amount)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(from_user_id)
        .bind(to_user_id)
        .bind(amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(record_id)
    }

    async fn list(
        &self,
        user_id: Uuid,
        page: i64,
        page_size: i64,
    ) -> Result<TransactionPage, LedgerError> {
        let (page, page_size) = clamp_paging(page, page_size);
        let skip = (page - 1) * page_size;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM transactions
            WHERE from_user_id = $1 OR to_user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<(Uuid, Uuid, Uuid, Decimal, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT id, from_user_id, to_user_id, amount, created_at
            FROM transactions
            WHERE from_user_id = $1 OR to_user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(page_size)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        let transactions = rows
            .into_iter()
            .map(|(id, from_user_id, to_user_id, amount, created_at)| TransactionRecord {
                id,
                from_user_id,
                to_user_id,
                amount,
                created_at,
                direction: direction_for(from_user_id, user_id),
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
        let result = sqlx::query(
            r#"
            DELETE FROM transactions
            WHERE from_user_id = $1 OR to_user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
