//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;

pub use routes::create_router;

use sqlx::PgPool;
use std::time::Duration;

/// Shared state for route handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub transfer_timeout: Duration,
}

impl AppState {
    pub fn new(pool: PgPool, transfer_timeout: Duration) -> Self {
        Self {
            pool,
            transfer_timeout,
        }
    }
}
