//! Common test utilities

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

/// Connect to the test database and make sure the schema exists.
/// Tests isolate themselves with fresh user ids rather than truncation, so
/// they can run in parallel against one database.
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    let schema = [
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            user_id UUID PRIMARY KEY,
            balance_minor BIGINT NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            CONSTRAINT accounts_balance_non_negative CHECK (balance_minor >= 0)
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS transactions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            from_user_id UUID NOT NULL,
            to_user_id UUID NOT NULL,
            amount NUMERIC(20, 2) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_transactions_from_user
            ON transactions (from_user_id, created_at DESC)
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS idx_transactions_to_user
            ON transactions (to_user_id, created_at DESC)
        "#,
    ];

    for statement in schema {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("Failed to apply test schema");
    }

    pool
}

/// Insert an account with a known balance and return its user id
pub async fn seed_account(pool: &PgPool, balance_minor: i64) -> Uuid {
    let user_id = Uuid::new_v4();
    sqlx::query("INSERT INTO accounts (user_id, balance_minor) VALUES ($1, $2)")
        .bind(user_id)
        .bind(balance_minor)
        .execute(pool)
        .await
        .expect("Failed to seed account");
    user_id
}

/// Read a balance directly, bypassing the API
pub async fn raw_balance(pool: &PgPool, user_id: Uuid) -> Option<i64> {
    sqlx::query_scalar("SELECT balance_minor FROM accounts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .expect("Failed to read balance")
}
