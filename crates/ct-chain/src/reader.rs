//! Chain reader trait and test double.
//!
//! `ChainReader` abstracts raw contract reads and receipt lookups so the
//! orchestration crates can be tested without a live RPC endpoint.

use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolCall;
use parking_lot::Mutex;

use crate::abi::{ICreatorToken, IERC20};
use crate::error::{ChainError, ChainResult};

/// Boxed future for dyn-compatible async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Mined transaction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    /// Transaction executed successfully.
    Success,
    /// Transaction was mined but reverted.
    Reverted,
}

/// Transaction receipt as returned by the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction hash.
    pub tx_hash: B256,
    /// Execution status.
    pub status: ReceiptStatus,
    /// Block the transaction was mined in.
    pub block_number: u64,
}

impl TxReceipt {
    /// True if the transaction executed successfully.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ReceiptStatus::Success
    }
}

/// Trait for raw chain reads.
///
/// Implementations must be side-effect free: `call` is an `eth_call`
/// style read, never a state mutation.
pub trait ChainReader: Send + Sync {
    /// Execute a read-only contract call and return the raw return data.
    fn call(&self, to: Address, data: Vec<u8>) -> BoxFuture<'_, ChainResult<Vec<u8>>>;

    /// Look up the receipt for a transaction, `None` while still pending.
    fn transaction_receipt(&self, tx_hash: B256) -> BoxFuture<'_, ChainResult<Option<TxReceipt>>>;
}

/// Arc wrapper for ChainReader trait objects.
pub type DynChainReader = Arc<dyn ChainReader>;

/// Bonding-curve function: quantity -> cumulative total in base units.
pub type CurveFn = Arc<dyn Fn(u64) -> U256 + Send + Sync>;

/// A recorded contract read (target and 4-byte selector).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub to: Address,
    pub selector: [u8; 4],
}

#[derive(Default)]
struct MockChainState {
    allowances: HashMap<(Address, Address), U256>,
    /// balanceOf answers keyed by (contract, owner); serves both the
    /// stablecoin and the creator token contract.
    balances: HashMap<(Address, Address), U256>,
    buy_curve: Option<CurveFn>,
    sell_curve: Option<CurveFn>,
    /// Scripted receipt sequences per hash; the last entry is sticky.
    receipts: HashMap<B256, VecDeque<Option<TxReceipt>>>,
    fail_calls: bool,
    calls: Vec<RecordedCall>,
}

/// In-memory chain double for tests.
///
/// Decodes the same calldata the real reader would send and answers from
/// configured state, so orchestration tests exercise the full encode and
/// decode path.
#[derive(Default)]
pub struct MockChainReader {
    state: Mutex<MockChainState>,
}

impl MockChainReader {
    /// Create an empty mock chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stored allowance for an owner/spender pair.
    pub fn set_allowance(&self, owner: Address, spender: Address, amount: U256) {
        self.state.lock().allowances.insert((owner, spender), amount);
    }

    /// Set a `balanceOf` answer for an owner on a contract (stablecoin
    /// or creator token).
    pub fn set_balance(&self, contract: Address, owner: Address, amount: U256) {
        self.state.lock().balances.insert((contract, owner), amount);
    }

    /// Install the buy-side bonding curve (quantity -> cumulative total).
    pub fn set_buy_curve(&self, curve: impl Fn(u64) -> U256 + Send + Sync + 'static) {
        self.state.lock().buy_curve = Some(Arc::new(curve));
    }

    /// Install the sell-side bonding curve (quantity -> cumulative total).
    pub fn set_sell_curve(&self, curve: impl Fn(u64) -> U256 + Send + Sync + 'static) {
        self.state.lock().sell_curve = Some(Arc::new(curve));
    }

    /// Script the receipt-poll answers for a transaction.
    ///
    /// Entries are returned in order; the final entry repeats forever.
    /// An unscripted hash stays pending (`None`) indefinitely.
    pub fn script_receipts(&self, tx_hash: B256, sequence: Vec<Option<TxReceipt>>) {
        self.state.lock().receipts.insert(tx_hash, sequence.into());
    }

    /// Make every contract read fail (oracle outage).
    pub fn set_fail_calls(&self, fail: bool) {
        self.state.lock().fail_calls = fail;
    }

    /// All contract reads made so far.
    #[must_use]
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.state.lock().calls.clone()
    }

    /// Number of contract reads made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    fn answer_call(&self, to: Address, data: &[u8]) -> ChainResult<Vec<u8>> {
        let mut state = self.state.lock();

        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ChainError::Decode("calldata shorter than selector".to_string()))?;
        state.calls.push(RecordedCall { to, selector });

        if state.fail_calls {
            return Err(ChainError::Transport("mock: reads disabled".to_string()));
        }

        if selector == IERC20::allowanceCall::SELECTOR {
            let call = IERC20::allowanceCall::abi_decode(data, true)
                .map_err(|e| ChainError::Decode(e.to_string()))?;
            let amount = state
                .allowances
                .get(&(call.owner, call.spender))
                .copied()
                .unwrap_or(U256::ZERO);
            return Ok(IERC20::allowanceCall::abi_encode_returns(&(amount,)));
        }

        if selector == IERC20::balanceOfCall::SELECTOR {
            let call = IERC20::balanceOfCall::abi_decode(data, true)
                .map_err(|e| ChainError::Decode(e.to_string()))?;
            let amount = state
                .balances
                .get(&(to, call.owner))
                .copied()
                .unwrap_or(U256::ZERO);
            return Ok(IERC20::balanceOfCall::abi_encode_returns(&(amount,)));
        }

        if selector == ICreatorToken::priceToBuyNextCall::SELECTOR {
            let call = ICreatorToken::priceToBuyNextCall::abi_decode(data, true)
                .map_err(|e| ChainError::Decode(e.to_string()))?;
            let quantity = call.quantity.to::<u64>();
            let curve = state.buy_curve.clone().ok_or_else(|| {
                ChainError::Rpc {
                    code: 3,
                    message: "mock: no buy curve configured".to_string(),
                }
            })?;
            let total = curve(quantity);
            return Ok(ICreatorToken::priceToBuyNextCall::abi_encode_returns(&(
                total,
            )));
        }

        if selector == ICreatorToken::priceToSellNextCall::SELECTOR {
            let call = ICreatorToken::priceToSellNextCall::abi_decode(data, true)
                .map_err(|e| ChainError::Decode(e.to_string()))?;
            let quantity = call.quantity.to::<u64>();
            let curve = state.sell_curve.clone().ok_or_else(|| {
                ChainError::Rpc {
                    code: 3,
                    message: "mock: no sell curve configured".to_string(),
                }
            })?;
            let total = curve(quantity);
            return Ok(ICreatorToken::priceToSellNextCall::abi_encode_returns(&(
                total,
            )));
        }

        Err(ChainError::Rpc {
            code: 3,
            message: format!("mock: unhandled selector 0x{}", hex::encode(selector)),
        })
    }
}

impl ChainReader for MockChainReader {
    fn call(&self, to: Address, data: Vec<u8>) -> BoxFuture<'_, ChainResult<Vec<u8>>> {
        Box::pin(async move { self.answer_call(to, &data) })
    }

    fn transaction_receipt(&self, tx_hash: B256) -> BoxFuture<'_, ChainResult<Option<TxReceipt>>> {
        Box::pin(async move {
            let mut state = self.state.lock();
            match state.receipts.get_mut(&tx_hash) {
                Some(queue) => {
                    if queue.len() > 1 {
                        Ok(queue.pop_front().unwrap_or(None))
                    } else {
                        Ok(queue.front().cloned().unwrap_or(None))
                    }
                }
                None => Ok(None),
            }
        })
    }
}
