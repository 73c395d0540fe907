//! Chain plumbing for the creator token trade flow.
//!
//! This crate holds the seams to everything the core does not own:
//! - `WalletClient`: the externally owned wallet session (address, active
//!   network, transaction signing). The core never touches key material.
//! - `ChainReader`: raw contract reads and receipt lookups, with a
//!   JSON-RPC implementation (`RpcChainReader`).
//! - `TokenReader`: typed ERC-20 and creator-token reads over a reader.
//! - `ReceiptPoller`: the shared fixed-interval confirmation primitive
//!   used by both the allowance gate and the trade executor.

pub mod abi;
pub mod error;
pub mod network;
pub mod reader;
pub mod receipt;
pub mod rpc;
pub mod token_reader;
pub mod wallet;

pub use error::{ChainError, ChainResult};
pub use network::{base, base_sepolia, ChainDefinition};
pub use reader::{
    BoxFuture, ChainReader, DynChainReader, MockChainReader, ReceiptStatus, TxReceipt,
};
pub use receipt::{ReceiptError, ReceiptPoller};
pub use rpc::RpcChainReader;
pub use token_reader::TokenReader;
pub use wallet::{DynWalletClient, MockWalletClient, TxRequest, WalletClient, WalletError};
