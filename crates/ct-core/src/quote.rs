//! Price quotes derived from the bonding-curve oracle.

use std::time::{Duration, Instant};

use crate::amount::UsdcAmount;
use crate::trade::TradeAction;

/// A freshly fetched price quote for one trade attempt.
///
/// Quotes are always derived from the on-chain oracle at the current
/// supply point and never persisted. Unit prices follow the bonding
/// curve, so `total` for quantity 3 is not three times the quantity-1
/// total.
///
/// A stale quote must not be used for settlement; the executor refetches
/// instead of trusting it silently.
#[derive(Debug, Clone)]
pub struct PriceQuote {
    /// Action the quote was computed for.
    pub action: TradeAction,
    /// Quantity the quote covers.
    pub quantity: u64,
    /// Marginal price of each successive unit at the current supply point.
    /// `unit_prices[i]` is the price of the (i+1)-th unit.
    pub unit_prices: Vec<UsdcAmount>,
    /// Total price (buy: amount paid, sell: proceeds received).
    pub total: UsdcAmount,
    /// When the oracle was read.
    pub fetched_at: Instant,
    /// How long the quote may be used before it must be refetched.
    pub ttl: Duration,
}

impl PriceQuote {
    /// True once the quote has outlived its TTL.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.fetched_at.elapsed() >= self.ttl
    }

    /// Price of the first unit, if any (display helper).
    #[must_use]
    pub fn first_unit_price(&self) -> Option<UsdcAmount> {
        self.unit_prices.first().copied()
    }
}
