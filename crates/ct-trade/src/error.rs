//! Stage-local error types and their mapping onto the terminal failure
//! taxonomy.

use alloy::primitives::B256;
use thiserror::Error;

use ct_chain::{ChainError, WalletError};
use ct_core::TradeFailure;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors from the quote engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// Quantity was zero or above the per-trade cap.
    #[error("Quantity {quantity} outside 1..={max}")]
    QuantityOutOfRange { quantity: u64, max: u64 },

    /// The bonding-curve oracle could not be read.
    #[error("Pricing oracle unavailable: {0}")]
    OracleUnavailable(String),
}

impl From<QuoteError> for TradeFailure {
    fn from(e: QuoteError) -> Self {
        match e {
            QuoteError::QuantityOutOfRange { .. } => TradeFailure::InvalidQuantity,
            QuoteError::OracleUnavailable(_) => TradeFailure::OracleUnavailable,
        }
    }
}

/// Errors from the allowance gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllowanceError {
    /// The current allowance could not be read.
    #[error("Failed to read allowance: {0}")]
    AllowanceRead(#[from] ChainError),

    /// The user (or wallet) declined the network switch.
    #[error("Network switch was denied by the wallet")]
    NetworkSwitchDenied,

    /// The settlement network could not be added to the wallet.
    #[error("Settlement network could not be added to the wallet")]
    NetworkAddFailed,

    /// The wallet refused or failed to submit the approval.
    #[error("Wallet error during approval: {0}")]
    Wallet(WalletError),

    /// The approval transaction was mined but reverted.
    #[error("Approval transaction {tx_hash} reverted")]
    ApprovalReverted { tx_hash: B256 },

    /// The approval transaction was not confirmed within the wait bound.
    #[error("Approval transaction {tx_hash} not confirmed in time")]
    ApprovalTimeout { tx_hash: B256 },
}

impl From<AllowanceError> for TradeFailure {
    fn from(e: AllowanceError) -> Self {
        match e {
            // An unreadable allowance is the same situation as an
            // unreadable oracle: a transient chain read failure the user
            // can retry.
            AllowanceError::AllowanceRead(_) => TradeFailure::OracleUnavailable,
            AllowanceError::NetworkSwitchDenied => TradeFailure::NetworkSwitchDenied,
            AllowanceError::NetworkAddFailed => TradeFailure::NetworkAddFailed,
            AllowanceError::Wallet(e) => TradeFailure::WalletUnavailable(e.to_string()),
            AllowanceError::ApprovalReverted { .. } => TradeFailure::ApprovalReverted,
            AllowanceError::ApprovalTimeout { .. } => TradeFailure::ApprovalTimeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_error_maps_to_failure() {
        let e = QuoteError::QuantityOutOfRange {
            quantity: 0,
            max: 100,
        };
        assert_eq!(TradeFailure::from(e), TradeFailure::InvalidQuantity);

        let e = QuoteError::OracleUnavailable("rpc down".to_string());
        assert_eq!(TradeFailure::from(e), TradeFailure::OracleUnavailable);
    }

    #[test]
    fn test_allowance_error_maps_to_failure() {
        let hash = B256::repeat_byte(0x01);
        assert_eq!(
            TradeFailure::from(AllowanceError::ApprovalReverted { tx_hash: hash }),
            TradeFailure::ApprovalReverted
        );
        assert_eq!(
            TradeFailure::from(AllowanceError::NetworkSwitchDenied),
            TradeFailure::NetworkSwitchDenied
        );
        assert!(matches!(
            TradeFailure::from(AllowanceError::Wallet(WalletError::UserRejected)),
            TradeFailure::WalletUnavailable(_)
        ));
    }
}
