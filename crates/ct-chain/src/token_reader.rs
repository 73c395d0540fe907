//! Typed contract reads over a `ChainReader`.

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;

use ct_core::UsdcAmount;

use crate::abi::{ICreatorToken, IERC20};
use crate::error::{ChainError, ChainResult};
use crate::reader::DynChainReader;

/// Typed read helpers for the stablecoin and creator token contracts.
#[derive(Clone)]
pub struct TokenReader {
    reader: DynChainReader,
}

impl TokenReader {
    #[must_use]
    pub fn new(reader: DynChainReader) -> Self {
        Self { reader }
    }

    /// The underlying raw reader (shared with the receipt poller).
    #[must_use]
    pub fn raw(&self) -> &DynChainReader {
        &self.reader
    }

    /// ERC-20 `allowance(owner, spender)` on the stablecoin contract.
    pub async fn erc20_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> ChainResult<UsdcAmount> {
        let data = IERC20::allowanceCall { owner, spender }.abi_encode();
        let raw = self.reader.call(token, data).await?;
        let decoded = IERC20::allowanceCall::abi_decode_returns(&raw, true)
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        Ok(UsdcAmount::from_base_units(decoded.remaining))
    }

    /// Total cost of buying the next `quantity` units at the current
    /// supply point.
    pub async fn price_to_buy_next(
        &self,
        token: Address,
        quantity: u64,
    ) -> ChainResult<UsdcAmount> {
        let data = ICreatorToken::priceToBuyNextCall {
            quantity: U256::from(quantity),
        }
        .abi_encode();
        let raw = self.reader.call(token, data).await?;
        let decoded = ICreatorToken::priceToBuyNextCall::abi_decode_returns(&raw, true)
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        Ok(UsdcAmount::from_base_units(decoded.totalPrice))
    }

    /// Total proceeds of selling the next `quantity` units at the
    /// current supply point.
    pub async fn price_to_sell_next(
        &self,
        token: Address,
        quantity: u64,
    ) -> ChainResult<UsdcAmount> {
        let data = ICreatorToken::priceToSellNextCall {
            quantity: U256::from(quantity),
        }
        .abi_encode();
        let raw = self.reader.call(token, data).await?;
        let decoded = ICreatorToken::priceToSellNextCall::abi_decode_returns(&raw, true)
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        Ok(UsdcAmount::from_base_units(decoded.totalProceeds))
    }

    /// Creator token `balanceOf(owner)` as a whole-token count.
    pub async fn creator_token_balance(
        &self,
        token: Address,
        owner: Address,
    ) -> ChainResult<u64> {
        let data = ICreatorToken::balanceOfCall { owner }.abi_encode();
        let raw = self.reader.call(token, data).await?;
        let decoded = ICreatorToken::balanceOfCall::abi_decode_returns(&raw, true)
            .map_err(|e| ChainError::Decode(e.to_string()))?;
        Ok(decoded.balance.try_into().unwrap_or(u64::MAX))
    }
}
