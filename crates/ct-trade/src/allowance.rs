//! Allowance gate: ensures the token contract may pull exactly the
//! quoted payment before a buy settles.
//!
//! The gate is idempotent per required amount: a sufficient existing
//! allowance short-circuits with no wallet interaction. Approvals are
//! for the exact required amount, never unlimited.

use alloy::primitives::{Address, B256};
use tracing::{debug, info, warn};

use ct_chain::{
    abi, ChainDefinition, DynWalletClient, ReceiptError, ReceiptPoller, TokenReader, TxRequest,
    WalletError,
};
use ct_core::UsdcAmount;

use crate::error::AllowanceError;

/// How a sufficient allowance was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approval {
    /// The existing allowance already covered the required amount.
    AlreadySufficient,
    /// A new approval was submitted and confirmed.
    Confirmed { tx_hash: B256 },
}

/// Checks and establishes ERC-20 spending allowances on the settlement
/// network.
pub struct AllowanceGate {
    wallet: DynWalletClient,
    tokens: TokenReader,
    poller: ReceiptPoller,
    settlement_chain: ChainDefinition,
    usdc: Address,
}

impl AllowanceGate {
    #[must_use]
    pub fn new(
        wallet: DynWalletClient,
        tokens: TokenReader,
        poller: ReceiptPoller,
        settlement_chain: ChainDefinition,
        usdc: Address,
    ) -> Self {
        Self {
            wallet,
            tokens,
            poller,
            settlement_chain,
            usdc,
        }
    }

    /// Ensure `spender` may pull at least `required` stablecoin from
    /// `owner`.
    ///
    /// Reads the current allowance first; if insufficient, moves the
    /// wallet onto the settlement network, submits an exact-amount
    /// approval, and waits for it to confirm.
    pub async fn ensure_allowance(
        &self,
        owner: Address,
        spender: Address,
        required: UsdcAmount,
    ) -> Result<Approval, AllowanceError> {
        let current = self
            .tokens
            .erc20_allowance(self.usdc, owner, spender)
            .await?;

        if current >= required {
            debug!(
                owner = %owner,
                spender = %spender,
                current = %current,
                required = %required,
                "Existing allowance sufficient"
            );
            return Ok(Approval::AlreadySufficient);
        }

        self.ensure_network().await?;

        let data = abi::approve_calldata(spender, required.base_units());
        let tx_hash = self
            .wallet
            .send_transaction(TxRequest::call(owner, self.usdc, data))
            .await
            .map_err(AllowanceError::Wallet)?;

        info!(
            owner = %owner,
            spender = %spender,
            amount = %required,
            tx_hash = %tx_hash,
            "Approval submitted"
        );

        match self.poller.wait_for_receipt(self.tokens.raw().as_ref(), tx_hash).await {
            Ok(receipt) if receipt.is_success() => Ok(Approval::Confirmed { tx_hash }),
            Ok(_) => Err(AllowanceError::ApprovalReverted { tx_hash }),
            Err(ReceiptError::Timeout { .. }) => Err(AllowanceError::ApprovalTimeout { tx_hash }),
        }
    }

    /// Move the wallet onto the settlement network if it is elsewhere.
    ///
    /// An unknown-chain rejection is recovered by adding the chain
    /// definition and retrying the switch once; a second refusal is
    /// terminal. Also called by the executor before settlement, since a
    /// short-circuited allowance check never touches the network.
    pub async fn ensure_network(&self) -> Result<(), AllowanceError> {
        let target = self.settlement_chain.chain_id;
        if self.wallet.active_chain_id() == target {
            return Ok(());
        }

        match self.wallet.switch_chain(target).await {
            Ok(()) => Ok(()),
            Err(WalletError::UnknownChain { .. }) => {
                info!(
                    chain_id = target,
                    chain = %self.settlement_chain.name,
                    "Wallet does not know settlement network, adding it"
                );
                self.wallet
                    .add_chain(&self.settlement_chain)
                    .await
                    .map_err(|e| {
                        warn!(chain_id = target, error = %e, "Failed to add settlement network");
                        AllowanceError::NetworkAddFailed
                    })?;
                self.wallet.switch_chain(target).await.map_err(|e| {
                    warn!(chain_id = target, error = %e, "Switch denied after adding network");
                    AllowanceError::NetworkSwitchDenied
                })
            }
            Err(e) => {
                warn!(chain_id = target, error = %e, "Network switch denied");
                Err(AllowanceError::NetworkSwitchDenied)
            }
        }
    }
}
