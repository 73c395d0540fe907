//! Quote engine: marginal price schedules from the bonding-curve oracle.

use std::time::Instant;

use alloy::primitives::Address;
use tracing::debug;

use ct_chain::TokenReader;
use ct_core::{PriceQuote, TradeAction, UsdcAmount};

use crate::config::TradeConfig;
use crate::error::QuoteError;

/// Reads bonding-curve prices and produces per-unit quote schedules.
///
/// The oracle exposes cumulative prices (`priceToBuyNext(q)` is the
/// total for the next `q` units); the engine derives the marginal price
/// of each unit by differencing successive cumulative reads.
#[derive(Clone)]
pub struct QuoteEngine {
    tokens: TokenReader,
    config: TradeConfig,
}

impl QuoteEngine {
    #[must_use]
    pub fn new(tokens: TokenReader, config: TradeConfig) -> Self {
        Self { tokens, config }
    }

    /// Fetch a quote for trading `quantity` tokens at the current supply
    /// point.
    ///
    /// Buy quotes use `priceToBuyNext`, sell quotes `priceToSellNext`;
    /// either way `unit_prices[i]` is the marginal price of the (i+1)-th
    /// unit and `total` is the cumulative read at `quantity`.
    pub async fn get_quote(
        &self,
        token: Address,
        action: TradeAction,
        quantity: u64,
    ) -> Result<PriceQuote, QuoteError> {
        if quantity == 0 || quantity > self.config.max_quote_quantity {
            return Err(QuoteError::QuantityOutOfRange {
                quantity,
                max: self.config.max_quote_quantity,
            });
        }

        let mut unit_prices = Vec::with_capacity(quantity as usize);
        let mut previous = UsdcAmount::ZERO;

        for q in 1..=quantity {
            let cumulative = match action {
                TradeAction::Buy => self.tokens.price_to_buy_next(token, q).await,
                TradeAction::Sell => self.tokens.price_to_sell_next(token, q).await,
            }
            .map_err(|e| QuoteError::OracleUnavailable(e.to_string()))?;

            unit_prices.push(cumulative.saturating_sub(previous));
            previous = cumulative;
        }

        debug!(
            token = %token,
            action = %action,
            quantity,
            total = %previous,
            "Quote fetched"
        );

        Ok(PriceQuote {
            action,
            quantity,
            unit_prices,
            total: previous,
            fetched_at: Instant::now(),
            ttl: self.config.quote_ttl(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use ct_chain::MockChainReader;
    use std::sync::Arc;

    fn engine(mock: Arc<MockChainReader>) -> QuoteEngine {
        QuoteEngine::new(TokenReader::new(mock), TradeConfig::default())
    }

    #[tokio::test]
    async fn test_buy_quote_derives_marginal_prices() {
        let mock = Arc::new(MockChainReader::new());
        let token = Address::repeat_byte(0x44);
        // Quadratic cumulative curve: q^2 USDC for the next q units.
        mock.set_buy_curve(|q| U256::from(q * q) * U256::from(1_000_000u64));

        let quote = engine(mock)
            .get_quote(token, TradeAction::Buy, 3)
            .await
            .unwrap();

        // Marginals: 1, 3, 5 USDC; total 9 USDC.
        let units: Vec<u64> = quote
            .unit_prices
            .iter()
            .map(|p| u64::try_from(p.base_units()).unwrap())
            .collect();
        assert_eq!(units, vec![1_000_000, 3_000_000, 5_000_000]);
        assert_eq!(quote.total.base_units(), U256::from(9_000_000u64));
        assert!(!quote.is_stale());
    }

    #[tokio::test]
    async fn test_sell_quote_uses_sell_curve() {
        let mock = Arc::new(MockChainReader::new());
        let token = Address::repeat_byte(0x44);
        mock.set_sell_curve(|q| U256::from(q) * U256::from(2_000_000u64));

        let quote = engine(mock)
            .get_quote(token, TradeAction::Sell, 2)
            .await
            .unwrap();

        assert_eq!(quote.total.base_units(), U256::from(4_000_000u64));
        assert_eq!(quote.unit_prices.len(), 2);
    }

    #[tokio::test]
    async fn test_rejects_quantity_out_of_range() {
        let mock = Arc::new(MockChainReader::new());
        let token = Address::repeat_byte(0x44);
        let engine = engine(mock.clone());

        let zero = engine.get_quote(token, TradeAction::Buy, 0).await;
        assert!(matches!(
            zero,
            Err(QuoteError::QuantityOutOfRange { quantity: 0, .. })
        ));

        let over = engine.get_quote(token, TradeAction::Buy, 101).await;
        assert!(matches!(over, Err(QuoteError::QuantityOutOfRange { .. })));

        // No oracle read happens for rejected quantities
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_oracle_failure_surfaces() {
        let mock = Arc::new(MockChainReader::new());
        let token = Address::repeat_byte(0x44);
        mock.set_buy_curve(|q| U256::from(q) * U256::from(1_000_000u64));
        mock.set_fail_calls(true);

        let result = engine(mock).get_quote(token, TradeAction::Buy, 1).await;
        assert!(matches!(result, Err(QuoteError::OracleUnavailable(_))));
    }
}
