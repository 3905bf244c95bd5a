//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use order_store::StoreError;
use wholesaler::WholesalerError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order store error.
    Store(StoreError),
    /// Wholesaler API error.
    Wholesaler(WholesalerError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Store(err) => store_error_to_response(err),
            ApiError::Wholesaler(err) => {
                tracing::error!(error = %err, "wholesaler call failed");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn store_error_to_response(err: StoreError) -> (StatusCode, String) {
    match &err {
        StoreError::OrderNotFound(_) | StoreError::TokenNotFound => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        StoreError::InvalidTransition { .. } | StoreError::TokenConsumed => {
            (StatusCode::CONFLICT, err.to_string())
        }
        StoreError::TokenExpired => (StatusCode::GONE, err.to_string()),
        StoreError::InvalidQuantity(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        _ => {
            tracing::error!(error = %err, "order store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Store(err)
    }
}

impl From<WholesalerError> for ApiError {
    fn from(err: WholesalerError) -> Self {
        ApiError::Wholesaler(err)
    }
}
