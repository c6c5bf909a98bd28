//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::money::to_major_units;
use crate::domain::TransferError;
use crate::store::StoreError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Account not found")]
    AccountNotFound(Uuid),

    #[error("Account already exists")]
    AccountExists(Uuid),

    #[error("Cannot delete account with remaining balance of ${0:.2}. Please transfer or withdraw your balance first.")]
    BalanceNotZero(rust_decimal::Decimal),

    // Transfer outcomes
    #[error(transparent)]
    Transfer(#[from] TransferError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AccountNotFound(id) => AppError::AccountNotFound(id),
            StoreError::AccountExists(id) => AppError::AccountExists(id),
            StoreError::BalanceNotZero(minor) => AppError::BalanceNotZero(to_major_units(minor)),
            StoreError::InsufficientBalance { .. } => {
                AppError::Transfer(TransferError::InsufficientBalance)
            }
            StoreError::Conflict => AppError::Transfer(TransferError::CommitConflict),
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<crate::ledger::LedgerError> for AppError {
    fn from(err: crate::ledger::LedgerError) -> Self {
        match err {
            crate::ledger::LedgerError::Database(e) => AppError::Database(e),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }
            AppError::AccountNotFound(id) => {
                (StatusCode::BAD_REQUEST, "account_not_found", Some(id.to_string()))
            }
            AppError::AccountExists(id) => {
                (StatusCode::BAD_REQUEST, "account_exists", Some(id.to_string()))
            }
            AppError::BalanceNotZero(_) => {
                (StatusCode::BAD_REQUEST, "balance_not_zero", None)
            }

            // 401 Unauthorized
            AppError::MissingHeader(header) => {
                (StatusCode::UNAUTHORIZED, "missing_header", Some(header.clone()))
            }

            // 403 Forbidden
            AppError::Forbidden(msg) => {
                (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone()))
            }

            // Transfer outcomes map by kind
            AppError::Transfer(ref transfer_err) => match transfer_err {
                TransferError::InvalidAmount(msg) => {
                    (StatusCode::BAD_REQUEST, "invalid_amount", Some(msg.clone()))
                }
                TransferError::SelfTransfer => {
                    (StatusCode::BAD_REQUEST, "self_transfer", None)
                }
                TransferError::SenderNotFound => {
                    (StatusCode::BAD_REQUEST, "sender_not_found", None)
                }
                TransferError::RecipientNotFound => {
                    (StatusCode::BAD_REQUEST, "recipient_not_found", None)
                }
                TransferError::InsufficientBalance => {
                    (StatusCode::BAD_REQUEST, "insufficient_balance", None)
                }
                TransferError::CommitConflict => {
                    (StatusCode::CONFLICT, "commit_conflict", None)
                }
                TransferError::StorageUnavailable => {
                    tracing::error!("Transfer failed: storage unavailable");
                    (StatusCode::INTERNAL_SERVER_ERROR, "storage_unavailable", None)
                }
            },

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
