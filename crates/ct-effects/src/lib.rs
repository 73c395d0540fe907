//! Post-trade effects.
//!
//! Once the executor produces a terminal outcome, the surrounding
//! application reacts: balances refresh, a first buy unlocks the
//! creator's channel, successful buys land on the share screen, and
//! failures surface inline. The coordinator here sequences those
//! reactions through an [`EffectsSink`] seam; effects never change the
//! outcome they react to, and a failing sink is logged and skipped.

pub mod coordinator;
pub mod error;
pub mod sink;

pub use coordinator::{EffectsCoordinator, TradeContext};
pub use error::EffectsError;
pub use sink::{DynEffectsSink, EffectsSink, MockEffectsSink, SinkEvent};
