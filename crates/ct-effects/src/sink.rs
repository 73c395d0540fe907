//! Effects sink seam and its test double.

use std::sync::Arc;

use alloy::primitives::Address;
use parking_lot::Mutex;

use ct_chain::BoxFuture;
use ct_core::TradeFailure;

use crate::error::EffectsError;

/// Application-edge reactions to a finished trade.
///
/// Implementations talk to whatever the host application uses for
/// state, navigation and messaging; the coordinator only decides which
/// of these fire and in what order.
pub trait EffectsSink: Send + Sync {
    /// Invalidate any cached balances for `account` on `token`.
    fn refresh_balance(
        &self,
        account: Address,
        token: Address,
    ) -> BoxFuture<'_, Result<(), EffectsError>>;

    /// The account now holds the creator's token for the first time;
    /// the creator's channel opens to it.
    fn channel_unlocked(
        &self,
        account: Address,
        creator_id: u64,
    ) -> BoxFuture<'_, Result<(), EffectsError>>;

    /// Send the user to the post-buy share screen for the creator, with
    /// the quantity just collected.
    fn redirect_to_share(
        &self,
        creator_username: &str,
        collected_count: u64,
    ) -> BoxFuture<'_, Result<(), EffectsError>>;

    /// Surface a terminal failure to the user.
    fn show_failure(&self, reason: &TradeFailure) -> BoxFuture<'_, Result<(), EffectsError>>;
}

/// Arc wrapper for EffectsSink trait objects.
pub type DynEffectsSink = Arc<dyn EffectsSink>;

/// What a mock sink observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    BalanceRefreshed {
        account: Address,
        token: Address,
    },
    ChannelUnlocked {
        account: Address,
        creator_id: u64,
    },
    RedirectedToShare {
        creator_username: String,
        collected_count: u64,
    },
    FailureShown {
        reason: TradeFailure,
    },
}

#[derive(Default)]
struct MockSinkState {
    events: Vec<SinkEvent>,
    fail_refresh: bool,
}

/// Recording sink double for tests.
#[derive(Default)]
pub struct MockEffectsSink {
    state: Mutex<MockSinkState>,
}

impl MockEffectsSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `refresh_balance` fail (the coordinator must carry on).
    pub fn set_fail_refresh(&self, fail: bool) {
        self.state.lock().fail_refresh = fail;
    }

    /// Events observed so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<SinkEvent> {
        self.state.lock().events.clone()
    }
}

impl EffectsSink for MockEffectsSink {
    fn refresh_balance(
        &self,
        account: Address,
        token: Address,
    ) -> BoxFuture<'_, Result<(), EffectsError>> {
        Box::pin(async move {
            let mut state = self.state.lock();
            state.events.push(SinkEvent::BalanceRefreshed { account, token });
            if state.fail_refresh {
                return Err(EffectsError("mock: refresh disabled".to_string()));
            }
            Ok(())
        })
    }

    fn channel_unlocked(
        &self,
        account: Address,
        creator_id: u64,
    ) -> BoxFuture<'_, Result<(), EffectsError>> {
        Box::pin(async move {
            self.state
                .lock()
                .events
                .push(SinkEvent::ChannelUnlocked { account, creator_id });
            Ok(())
        })
    }

    fn redirect_to_share(
        &self,
        creator_username: &str,
        collected_count: u64,
    ) -> BoxFuture<'_, Result<(), EffectsError>> {
        let creator_username = creator_username.to_string();
        Box::pin(async move {
            self.state.lock().events.push(SinkEvent::RedirectedToShare {
                creator_username,
                collected_count,
            });
            Ok(())
        })
    }

    fn show_failure(&self, reason: &TradeFailure) -> BoxFuture<'_, Result<(), EffectsError>> {
        let reason = reason.clone();
        Box::pin(async move {
            self.state.lock().events.push(SinkEvent::FailureShown { reason });
            Ok(())
        })
    }
}
