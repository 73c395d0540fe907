//! Creator token trade orchestration.
//!
//! The crate drives one user-initiated trade attempt end to end:
//! - [`QuoteEngine`] reads the bonding-curve oracle and derives per-unit
//!   price schedules.
//! - [`AllowanceGate`] establishes exact-amount stablecoin approvals,
//!   moving the wallet onto the settlement network first when needed.
//! - [`TradeExecutor`] is the state machine tying it together, with
//!   per-account single-flight and slippage-bounded settlement.
//!
//! Everything chain-facing goes through the seams in `ct-chain`, so the
//! whole flow is testable against in-memory doubles.

pub mod allowance;
pub mod config;
pub mod error;
pub mod executor;
pub mod quote;

pub use allowance::{AllowanceGate, Approval};
pub use config::TradeConfig;
pub use error::{AllowanceError, ConfigError, QuoteError};
pub use executor::{TradeExecutor, TradePhase};
pub use quote::QuoteEngine;
