//! Wholesaler client error types.

use thiserror::Error;

/// Errors surfaced by the wholesaler client.
///
/// Only the export path raises these; the enrichment fetchers fail closed
/// and return `None` instead.
#[derive(Debug, Error)]
pub enum WholesalerError {
    /// Transport or HTTP-level failure talking to the wholesaler.
    #[error("wholesaler transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Payload could not be serialized.
    #[error("payload serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for wholesaler operations.
pub type Result<T> = std::result::Result<T, WholesalerError>;
