//! Terminal trade outcomes and the failure taxonomy.

use alloy::primitives::B256;
use thiserror::Error;

/// Why a trade attempt failed.
///
/// Every failure is terminal for its trade attempt and surfaces to the
/// user as an inline message; the flow never silently swallows one and
/// proceeds to the next stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TradeFailure {
    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Pricing oracle unavailable")]
    OracleUnavailable,

    #[error("Network switch was denied by the wallet")]
    NetworkSwitchDenied,

    #[error("Settlement network could not be added to the wallet")]
    NetworkAddFailed,

    #[error("Spending approval was reverted on-chain")]
    ApprovalReverted,

    #[error("Spending approval was not confirmed in time")]
    ApprovalTimeout,

    #[error("Settlement reverted on-chain")]
    SettlementReverted,

    #[error("Settlement was not confirmed in time")]
    SettlementTimeout,

    #[error("A trade for this account is already in progress")]
    TradeInProgress,

    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),
}

impl TradeFailure {
    /// True if the user may simply retry the whole flow from Idle.
    ///
    /// Timeouts are retryable in the sense that the true state is
    /// reconcilable later via balance refresh; the original transaction
    /// may still confirm out-of-band.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::OracleUnavailable | Self::ApprovalTimeout | Self::SettlementTimeout
        )
    }
}

/// Result of one trade attempt. Produced exactly once per request and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TradeOutcome {
    /// Settlement was mined with status success.
    Succeeded {
        /// Number of tokens settled.
        settled_quantity: u64,
        /// Settlement transaction hash.
        tx_hash: B256,
    },
    /// The attempt ended without settling.
    Failed {
        /// Terminal failure reason.
        reason: TradeFailure,
    },
}

impl TradeOutcome {
    /// Convenience constructor for the failure branch.
    #[must_use]
    pub fn failed(reason: TradeFailure) -> Self {
        Self::Failed { reason }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// The failure reason, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&TradeFailure> {
        match self {
            Self::Failed { reason } => Some(reason),
            Self::Succeeded { .. } => None,
        }
    }
}
