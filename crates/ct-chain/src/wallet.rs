//! Wallet client seam.
//!
//! The wallet session is externally owned: the core reads the active
//! address and network, requests network switches, and submits prepared
//! transactions for signing. Key material never enters this crate.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};
use parking_lot::Mutex;
use thiserror::Error;

use crate::network::ChainDefinition;
use crate::reader::BoxFuture;

/// Wallet operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// The wallet has no connected account.
    #[error("No active account")]
    NoActiveAccount,

    /// The wallet does not know the requested chain (EIP-4902); the
    /// caller should add the chain definition and retry the switch.
    #[error("Unknown chain: {chain_id}")]
    UnknownChain { chain_id: u64 },

    /// The user declined the request in the wallet UI.
    #[error("Request rejected by user")]
    UserRejected,

    /// Provider-level failure.
    #[error("Wallet provider error: {0}")]
    Provider(String),
}

/// A prepared transaction for the wallet to sign and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    /// Sending account.
    pub from: Address,
    /// Target contract.
    pub to: Address,
    /// ABI-encoded calldata.
    pub data: Vec<u8>,
    /// Native value attached (always zero in this flow).
    pub value: U256,
}

impl TxRequest {
    /// Create a zero-value contract call.
    #[must_use]
    pub fn call(from: Address, to: Address, data: Vec<u8>) -> Self {
        Self {
            from,
            to,
            data,
            value: U256::ZERO,
        }
    }
}

/// Trait for the externally owned wallet session.
pub trait WalletClient: Send + Sync {
    /// Currently connected account, if any.
    fn active_address(&self) -> Option<Address>;

    /// Chain the wallet is currently on.
    fn active_chain_id(&self) -> u64;

    /// Ask the wallet to switch to a chain it already knows.
    fn switch_chain(&self, chain_id: u64) -> BoxFuture<'_, Result<(), WalletError>>;

    /// Ask the wallet to add a chain definition (unknown-chain recovery).
    fn add_chain(&self, definition: &ChainDefinition) -> BoxFuture<'_, Result<(), WalletError>>;

    /// Sign and broadcast a transaction, returning its hash.
    fn send_transaction(&self, tx: TxRequest) -> BoxFuture<'_, Result<B256, WalletError>>;
}

/// Arc wrapper for WalletClient trait objects.
pub type DynWalletClient = Arc<dyn WalletClient>;

#[derive(Default)]
struct MockWalletState {
    switch_results: VecDeque<Result<(), WalletError>>,
    add_results: VecDeque<Result<(), WalletError>>,
    send_results: VecDeque<Result<B256, WalletError>>,
    switch_requests: Vec<u64>,
    added_chains: Vec<ChainDefinition>,
    sent_transactions: Vec<TxRequest>,
}

/// Recording wallet double for tests.
///
/// Results are scripted per call; an unscripted switch/add succeeds, and
/// an unscripted send returns a deterministic hash derived from a
/// counter. A successful switch updates the active chain.
pub struct MockWalletClient {
    address: Mutex<Option<Address>>,
    chain_id: AtomicU64,
    state: Mutex<MockWalletState>,
    tx_counter: AtomicU64,
}

impl MockWalletClient {
    /// Create a wallet connected as `address` on `chain_id`.
    #[must_use]
    pub fn new(address: Address, chain_id: u64) -> Self {
        Self {
            address: Mutex::new(Some(address)),
            chain_id: AtomicU64::new(chain_id),
            state: Mutex::new(MockWalletState::default()),
            tx_counter: AtomicU64::new(1),
        }
    }

    /// Create a wallet with no connected account.
    #[must_use]
    pub fn disconnected(chain_id: u64) -> Self {
        Self {
            address: Mutex::new(None),
            chain_id: AtomicU64::new(chain_id),
            state: Mutex::new(MockWalletState::default()),
            tx_counter: AtomicU64::new(1),
        }
    }

    /// Queue the result of the next `switch_chain` call.
    pub fn push_switch_result(&self, result: Result<(), WalletError>) {
        self.state.lock().switch_results.push_back(result);
    }

    /// Queue the result of the next `add_chain` call.
    pub fn push_add_result(&self, result: Result<(), WalletError>) {
        self.state.lock().add_results.push_back(result);
    }

    /// Queue the result of the next `send_transaction` call.
    pub fn push_send_result(&self, result: Result<B256, WalletError>) {
        self.state.lock().send_results.push_back(result);
    }

    /// Chain IDs requested via `switch_chain`.
    #[must_use]
    pub fn switch_requests(&self) -> Vec<u64> {
        self.state.lock().switch_requests.clone()
    }

    /// Chain definitions submitted via `add_chain`.
    #[must_use]
    pub fn added_chains(&self) -> Vec<ChainDefinition> {
        self.state.lock().added_chains.clone()
    }

    /// Transactions submitted via `send_transaction`.
    #[must_use]
    pub fn sent_transactions(&self) -> Vec<TxRequest> {
        self.state.lock().sent_transactions.clone()
    }

    fn next_tx_hash(&self) -> B256 {
        let n = self.tx_counter.fetch_add(1, Ordering::AcqRel);
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&n.to_be_bytes());
        B256::from(bytes)
    }
}

impl WalletClient for MockWalletClient {
    fn active_address(&self) -> Option<Address> {
        *self.address.lock()
    }

    fn active_chain_id(&self) -> u64 {
        self.chain_id.load(Ordering::Acquire)
    }

    fn switch_chain(&self, chain_id: u64) -> BoxFuture<'_, Result<(), WalletError>> {
        Box::pin(async move {
            let result = {
                let mut state = self.state.lock();
                state.switch_requests.push(chain_id);
                state.switch_results.pop_front().unwrap_or(Ok(()))
            };
            if result.is_ok() {
                self.chain_id.store(chain_id, Ordering::Release);
            }
            result
        })
    }

    fn add_chain(&self, definition: &ChainDefinition) -> BoxFuture<'_, Result<(), WalletError>> {
        let definition = definition.clone();
        Box::pin(async move {
            let mut state = self.state.lock();
            state.added_chains.push(definition);
            state.add_results.pop_front().unwrap_or(Ok(()))
        })
    }

    fn send_transaction(&self, tx: TxRequest) -> BoxFuture<'_, Result<B256, WalletError>> {
        Box::pin(async move {
            let scripted = {
                let mut state = self.state.lock();
                state.sent_transactions.push(tx);
                state.send_results.pop_front()
            };
            match scripted {
                Some(result) => result,
                None => Ok(self.next_tx_hash()),
            }
        })
    }
}
