//! Trade request types and identifiers.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::CoreError;

/// Trade action: buy or sell creator tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    /// Returns true for the buy side (the only side that needs an allowance).
    #[must_use]
    pub fn is_buy(&self) -> bool {
        matches!(self, Self::Buy)
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// One user-initiated trade attempt.
///
/// Immutable once handed to the executor; a new interaction creates a
/// new request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeRequest {
    /// Acting account.
    pub account: Address,
    /// Creator token contract.
    pub token: Address,
    /// Buy or sell.
    pub action: TradeAction,
    /// Number of tokens to trade. Must be at least 1.
    pub quantity: u64,
}

impl TradeRequest {
    /// Create a validated trade request.
    pub fn new(
        account: Address,
        token: Address,
        action: TradeAction,
        quantity: u64,
    ) -> Result<Self, CoreError> {
        let request = Self {
            account,
            token,
            action,
            quantity,
        };
        request.validate()?;
        Ok(request)
    }

    /// Validate the request before any network call is made.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.quantity == 0 {
            return Err(CoreError::InvalidQuantity(self.quantity));
        }
        Ok(())
    }
}

/// Unique identifier for one trade attempt, used for log correlation.
///
/// Format: `ct_{timestamp_ms}_{uuid_short}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeId(String);

impl TradeId {
    /// Create a new unique trade ID.
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().to_string()[..8];
        Self(format!("ct_{ts}_{uuid_short}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TradeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_rejects_zero_quantity() {
        let result = TradeRequest::new(
            Address::repeat_byte(0x11),
            Address::repeat_byte(0x22),
            TradeAction::Buy,
            0,
        );
        assert!(matches!(result, Err(CoreError::InvalidQuantity(0))));
    }

    #[test]
    fn test_request_accepts_positive_quantity() {
        let request = TradeRequest::new(
            Address::repeat_byte(0x11),
            Address::repeat_byte(0x22),
            TradeAction::Sell,
            3,
        )
        .unwrap();
        assert_eq!(request.quantity, 3);
        assert!(!request.action.is_buy());
    }

    #[test]
    fn test_trade_id_unique() {
        let a = TradeId::new();
        let b = TradeId::new();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("ct_"));
    }
}
