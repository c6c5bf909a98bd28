//! PostgreSQL Account Store
//!
//! Balance records live in the `accounts` table. The transfer scope is a
//! single transaction that locks both rows with `SELECT ... FOR UPDATE` in
//! ascending `user_id` order; the table's non-negative CHECK constraint
//! backstops the sufficiency check at write time.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{AccountStore, StoreError};

/// Account store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map serialization failures, deadlocks, and CHECK violations to
/// [`StoreError::Conflict`]; everything else stays a database error.
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        match db_err.code().as_deref() {
            // serialization_failure, deadlock_detected, check_violation
            Some("40001") | Some("40P01") | Some("23514") => return StoreError::Conflict,
            _ => {}
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn balance(&self, user_id: Uuid) -> Result<Option<i64>, StoreError> {
        let balance: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT balance_minor FROM accounts WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(balance)
    }

    async fn open(&self, user_id: Uuid, initial_minor: i64) -> Result<(), StoreError> {
        let rows_affected = sqlx::query(
            r#"
            INSERT INTO accounts (user_id, balance_minor)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(initial_minor)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Err(StoreError::AccountExists(user_id));
        }

        Ok(())
    }

    async fn close(&self, user_id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let balance: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT balance_minor FROM accounts WHERE user_id = $1 FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let balance = balance.ok_or(StoreError::AccountNotFound(user_id))?;
        if balance != 0 {
            return Err(StoreError::BalanceNotZero(balance));
        }

        sqlx::query("DELETE FROM accounts WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn apply_transfer(
        &self,
        sender_id: Uuid,
        recipient_id: Uuid,
        amount_minor: i64,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        // Lock both rows in ascending user_id order. A failed check below
        // drops the transaction, which rolls it back.
        let locked: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT user_id, balance_minor
            FROM accounts
            WHERE user_id IN ($1, $2)
            ORDER BY user_id
            FOR UPDATE
            "#,
        )
        .bind(sender_id)
        .bind(recipient_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_db_error)?;

        let sender_balance = locked
            .iter()
            .find(|(id, _)| *id == sender_id)
            .map(|(_, balance)| *balance)
            .ok_or(StoreError::AccountNotFound(sender_id))?;

        if sender_balance < amount_minor {
            return Err(StoreError::InsufficientBalance {
                required: amount_minor,
                available: sender_balance,
            });
        }

        if !locked.iter().any(|(id, _)| *id == recipient_id) {
            return Err(StoreError::AccountNotFound(recipient_id));
        }

        sqlx::query(
            r#"
            UPDATE accounts SET balance_minor = balance_minor - $2 WHERE user_id = $1
            "#,
        )
        .bind(sender_id)
        .bind(amount_minor)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        sqlx::query(
            r#"
            UPDATE accounts SET balance_minor = balance_minor + $2 WHERE user_id = $1
            "#,
        )
        .bind(recipient_id)
        .bind(amount_minor)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        Ok(())
    }
}
