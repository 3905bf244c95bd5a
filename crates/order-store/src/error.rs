//! Store error types.

use domain::{OrderStatus, StatusParseError};
use thiserror::Error;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No order header exists for the given id.
    #[error("order not found: {0}")]
    OrderNotFound(i64),

    /// The requested status change is not allowed by the lifecycle table.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// A line item carried a negative quantity.
    #[error("invalid line item quantity: {0}")]
    InvalidQuantity(i32),

    /// No cancellation token with the given value exists.
    #[error("cancel token not found")]
    TokenNotFound,

    /// The cancellation token has passed its expiry timestamp.
    #[error("cancel token expired")]
    TokenExpired,

    /// The cancellation token was already redeemed.
    #[error("cancel token already used")]
    TokenConsumed,

    /// A stored status string no longer parses as a lifecycle stage.
    #[error("invalid status in storage: {0}")]
    InvalidStoredStatus(#[from] StatusParseError),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
