//! Core domain types for the creator token trade flow.
//!
//! This crate provides the fundamental types shared by the trade
//! orchestration crates:
//! - `TradeRequest`, `TradeAction`: user intent for one trade attempt
//! - `UsdcAmount`: precision-safe stablecoin amount (6 decimals)
//! - `PriceQuote`: freshly derived bonding-curve pricing
//! - `TradeOutcome`, `TradeFailure`: terminal result and failure taxonomy

pub mod amount;
pub mod error;
pub mod outcome;
pub mod quote;
pub mod trade;

pub use amount::UsdcAmount;
pub use error::{CoreError, Result};
pub use outcome::{TradeFailure, TradeOutcome};
pub use quote::PriceQuote;
pub use trade::{TradeAction, TradeId, TradeRequest};
