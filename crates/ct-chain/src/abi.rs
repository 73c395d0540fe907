//! Contract ABI surface for the trade flow.
//!
//! Only the functions the core actually calls are declared: the ERC-20
//! allowance/approve pair on the stablecoin, and the bonding-curve
//! pricing and settlement entry points on the creator token contract.

use alloy::primitives::{Address, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    /// Minimal ERC-20 surface used by the allowance gate.
    interface IERC20 {
        function allowance(address owner, address spender) external view returns (uint256 remaining);
        function approve(address spender, uint256 amount) external returns (bool ok);
        function balanceOf(address owner) external view returns (uint256 balance);
    }

    /// Creator token bonding-curve contract.
    ///
    /// Pricing depends on current circulating supply: `priceToBuyNext(q)`
    /// returns the total cost of the next `q` units from the current
    /// supply point, not `q` times the single-unit price.
    interface ICreatorToken {
        function priceToBuyNext(uint256 quantity) external view returns (uint256 totalPrice);
        function priceToSellNext(uint256 quantity) external view returns (uint256 totalProceeds);
        function buy(uint256 quantity, uint256 maxPayment) external;
        function sell(uint256 quantity, uint256 minProceeds) external;
        function balanceOf(address owner) external view returns (uint256 balance);
    }
}

/// Calldata for `approve(spender, amount)`.
#[must_use]
pub fn approve_calldata(spender: Address, amount: U256) -> Vec<u8> {
    IERC20::approveCall { spender, amount }.abi_encode()
}

/// Calldata for `buy(quantity, maxPayment)`.
///
/// `max_payment` is the slippage-bounded upper limit; the contract
/// reverts instead of settling above it.
#[must_use]
pub fn buy_calldata(quantity: u64, max_payment: U256) -> Vec<u8> {
    ICreatorToken::buyCall {
        quantity: U256::from(quantity),
        maxPayment: max_payment,
    }
    .abi_encode()
}

/// Calldata for `sell(quantity, minProceeds)`.
///
/// `min_proceeds` is the slippage-bounded lower limit; the contract
/// reverts instead of settling below it.
#[must_use]
pub fn sell_calldata(quantity: u64, min_proceeds: U256) -> Vec<u8> {
    ICreatorToken::sellCall {
        quantity: U256::from(quantity),
        minProceeds: min_proceeds,
    }
    .abi_encode()
}
