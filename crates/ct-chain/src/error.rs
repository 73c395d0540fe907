//! Chain read errors.

use thiserror::Error;

/// Errors from contract reads and receipt lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("RPC transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Failed to decode contract response: {0}")]
    Decode(String),
}

/// Result type alias for chain operations.
pub type ChainResult<T> = std::result::Result<T, ChainError>;
