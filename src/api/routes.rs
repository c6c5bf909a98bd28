//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::money::to_major_units;
use crate::domain::TransferError;
use crate::engine::TransferEngine;
use crate::error::AppError;
use crate::ledger::{PgLedger, TransactionPage, TransferLedger};
use crate::notify::LogNotifier;
use crate::store::{AccountStore, PgAccountStore};

use super::middleware::AuthenticatedUser;
use super::AppState;

/// Initial balance seed range for new accounts, in minor units
/// (1.00 to 10000.00)
const INITIAL_BALANCE_MIN_MINOR: i64 = 100;
const INITIAL_BALANCE_MAX_MINOR: i64 = 1_000_000;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub recipient_id: Uuid,
    /// Decimal major units; normalized to integer cents before any arithmetic
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct TransferResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAccountRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAccountResponse {
    pub user_id: Uuid,
    pub balance: Decimal,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        // Balance and transfers for the authenticated user
        .route("/account/balance", get(get_balance))
        .route("/account/transfer", post(transfer))
        .route("/account/transactions", get(list_transactions))
        // Account lifecycle, driven by the registration flow
        .route("/accounts", post(open_account))
        .route("/accounts/:user_id", delete(close_account))
}

// =========================================================================
// GET /account/balance
// =========================================================================

/// Get the authenticated user's balance
async fn get_balance(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<BalanceResponse>, AppError> {
    let store = PgAccountStore::new(state.pool);

    let balance_minor = store
        .balance(user.user_id)
        .await?
        .ok_or(AppError::AccountNotFound(user.user_id))?;

    Ok(Json(BalanceResponse {
        balance: to_major_units(balance_minor),
    }))
}

// =========================================================================
// POST /account/transfer
// =========================================================================

/// Transfer funds from the authenticated user to a recipient
async fn transfer(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, AppError> {
    // Also re-checked inside the engine
    if request.recipient_id == user.user_id {
        return Err(TransferError::SelfTransfer.into());
    }

    let engine = TransferEngine::new(
        PgAccountStore::new(state.pool.clone()),
        PgLedger::new(state.pool.clone()),
        LogNotifier::new(),
    )
    .with_timeout(state.transfer_timeout);

    engine
        .transfer(user.user_id, request.recipient_id, request.amount)
        .await?;

    Ok(Json(TransferResponse {
        message: "Transfer successful".to_string(),
    }))
}

// =========================================================================
// GET /account/transactions
// =========================================================================

/// List the authenticated user's transfer history, newest first
async fn list_transactions(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Json<TransactionPage>, AppError> {
    let ledger = PgLedger::new(state.pool);

    let page = ledger.list(user.user_id, query.page, query.limit).await?;

    Ok(Json(page))
}

// =========================================================================
// POST /accounts
// =========================================================================

/// Provision the balance record for a newly registered user
async fn open_account(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(request): Json<OpenAccountRequest>,
) -> Result<(StatusCode, Json<OpenAccountResponse>), AppError> {
    if request.user_id != user.user_id {
        return Err(AppError::Forbidden(
            "Cannot provision an account for another user".to_string(),
        ));
    }

    let initial_minor =
        rand::thread_rng().gen_range(INITIAL_BALANCE_MIN_MINOR..=INITIAL_BALANCE_MAX_MINOR);

    let store = PgAccountStore::new(state.pool);
    store.open(request.user_id, initial_minor).await?;

    tracing::info!(user_id = %request.user_id, "account provisioned");

    Ok((
        StatusCode::CREATED,
        Json(OpenAccountResponse {
            user_id: request.user_id,
            balance: to_major_units(initial_minor),
        }),
    ))
}

// =========================================================================
// DELETE /accounts/:user_id
// =========================================================================

/// Close an account: only allowed for the owner, only at zero balance.
/// Cascades deletion of the user's ledger records.
async fn close_account(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if user_id != user.user_id {
        return Err(AppError::Forbidden(
            "Cannot close another user's account".to_string(),
        ));
    }

    let store = PgAccountStore::new(state.pool.clone());
    store.close(user_id).await?;

    let removed = PgLedger::new(state.pool).purge_user(user_id).await?;
    tracing::info!(%user_id, records_removed = removed, "account closed");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transfer_request_deserialize() {
        let json = r#"{
            "recipientId": "550e8400-e29b-41d4-a716-446655440002",
            "amount": 100.50
        }"#;

        let request: TransferRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.amount, dec!(100.50));
    }

    #[test]
    fn test_transfer_request_rejects_missing_amount() {
        let json = r#"{"recipientId": "550e8400-e29b-41d4-a716-446655440002"}"#;
        let result: Result<TransferRequest, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_transactions_query_defaults() {
        let query: TransactionsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 10);
    }

    #[test]
    fn test_initial_balance_range_is_valid() {
        use crate::domain::money::is_valid_minor_amount;
        assert!(is_valid_minor_amount(INITIAL_BALANCE_MIN_MINOR));
        assert!(is_valid_minor_amount(INITIAL_BALANCE_MAX_MINOR));
        assert!(INITIAL_BALANCE_MIN_MINOR < INITIAL_BALANCE_MAX_MINOR);
    }
}
