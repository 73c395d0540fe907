//! Settlement network definitions.
//!
//! The wallet may not know the settlement network yet; the full
//! definition is what `WalletClient::add_chain` submits on the
//! unknown-chain recovery path.

use serde::{Deserialize, Serialize};

/// A network the wallet can be asked to switch to or add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDefinition {
    /// EIP-155 chain ID.
    pub chain_id: u64,
    /// Human-readable network name.
    pub name: String,
    /// Default public RPC endpoint.
    pub rpc_url: String,
    /// Native currency symbol.
    pub currency_symbol: String,
}

/// Base mainnet, the production settlement network.
#[must_use]
pub fn base() -> ChainDefinition {
    ChainDefinition {
        chain_id: 8453,
        name: "Base".to_string(),
        rpc_url: "https://mainnet.base.org".to_string(),
        currency_symbol: "ETH".to_string(),
    }
}

/// Base Sepolia, the development settlement network.
#[must_use]
pub fn base_sepolia() -> ChainDefinition {
    ChainDefinition {
        chain_id: 84532,
        name: "Base Sepolia".to_string(),
        rpc_url: "https://sepolia.base.org".to_string(),
        currency_symbol: "ETH".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_chain_ids() {
        assert_eq!(base().chain_id, 8453);
        assert_eq!(base_sepolia().chain_id, 84532);
        assert_ne!(base(), base_sepolia());
    }
}
