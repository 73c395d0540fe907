//! Sequences post-trade effects from a terminal outcome.

use alloy::primitives::Address;
use tracing::{debug, warn};

use ct_core::{TradeAction, TradeOutcome};

use crate::sink::DynEffectsSink;

/// Context the effects need beyond the outcome itself: who traded whose
/// token, and the creator-token balance captured before the attempt
/// started.
#[derive(Debug, Clone)]
pub struct TradeContext {
    /// Acting account.
    pub account: Address,
    /// Creator token contract.
    pub token: Address,
    /// Creator the token belongs to.
    pub creator_id: u64,
    /// Creator's username, for the share screen.
    pub creator_username: String,
    /// Token balance before the trade. Zero plus a successful buy means
    /// this is the account's first holding of the token.
    pub balance_before: u64,
}

impl TradeContext {
    /// True when a successful buy would be the account's first.
    #[must_use]
    pub fn is_first_buy(&self, action: TradeAction) -> bool {
        action.is_buy() && self.balance_before == 0
    }
}

/// Drives the effects sink from trade outcomes.
///
/// Effects are observers only: a failing sink is logged and the rest of
/// the sequence continues, and nothing here feeds back into the trade
/// flow.
pub struct EffectsCoordinator {
    sink: DynEffectsSink,
}

impl EffectsCoordinator {
    #[must_use]
    pub fn new(sink: DynEffectsSink) -> Self {
        Self { sink }
    }

    /// React to one terminal outcome.
    ///
    /// On success: refresh balances, then on a first buy unlock the
    /// creator's channel, then on any buy redirect to the share screen
    /// with the settled quantity. On failure: surface the reason and
    /// nothing else.
    pub async fn on_outcome(
        &self,
        context: &TradeContext,
        action: TradeAction,
        outcome: &TradeOutcome,
    ) {
        match outcome {
            TradeOutcome::Succeeded {
                settled_quantity, ..
            } => {
                debug!(
                    account = %context.account,
                    token = %context.token,
                    action = %action,
                    quantity = settled_quantity,
                    first_buy = context.is_first_buy(action),
                    "Running post-trade effects"
                );
                if let Err(e) = self.sink.refresh_balance(context.account, context.token).await {
                    warn!(account = %context.account, error = %e, "Balance refresh failed");
                }
                if context.is_first_buy(action) {
                    if let Err(e) = self
                        .sink
                        .channel_unlocked(context.account, context.creator_id)
                        .await
                    {
                        warn!(creator_id = context.creator_id, error = %e, "Channel unlock effect failed");
                    }
                }
                if action.is_buy() {
                    if let Err(e) = self
                        .sink
                        .redirect_to_share(&context.creator_username, *settled_quantity)
                        .await
                    {
                        warn!(creator = %context.creator_username, error = %e, "Share redirect failed");
                    }
                }
            }
            TradeOutcome::Failed { reason } => {
                if let Err(e) = self.sink.show_failure(reason).await {
                    warn!(reason = %reason, error = %e, "Failed to surface trade failure");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::B256;
    use ct_core::TradeFailure;
    use std::sync::Arc;

    use crate::sink::{MockEffectsSink, SinkEvent};

    fn context(balance_before: u64) -> TradeContext {
        TradeContext {
            account: Address::repeat_byte(0x11),
            token: Address::repeat_byte(0x44),
            creator_id: 7,
            creator_username: "maria".to_string(),
            balance_before,
        }
    }

    fn succeeded(settled_quantity: u64) -> TradeOutcome {
        TradeOutcome::Succeeded {
            settled_quantity,
            tx_hash: B256::repeat_byte(0xcc),
        }
    }

    #[tokio::test]
    async fn test_first_buy_unlocks_then_redirects() {
        let sink = Arc::new(MockEffectsSink::new());
        let coordinator = EffectsCoordinator::new(sink.clone());
        let ctx = context(0);

        coordinator
            .on_outcome(&ctx, TradeAction::Buy, &succeeded(2))
            .await;

        assert_eq!(
            sink.events(),
            vec![
                SinkEvent::BalanceRefreshed {
                    account: ctx.account,
                    token: ctx.token,
                },
                SinkEvent::ChannelUnlocked {
                    account: ctx.account,
                    creator_id: 7,
                },
                SinkEvent::RedirectedToShare {
                    creator_username: "maria".to_string(),
                    collected_count: 2,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_repeat_buy_redirects_without_unlock() {
        let sink = Arc::new(MockEffectsSink::new());
        let coordinator = EffectsCoordinator::new(sink.clone());
        let ctx = context(3);

        coordinator
            .on_outcome(&ctx, TradeAction::Buy, &succeeded(1))
            .await;

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SinkEvent::BalanceRefreshed { .. }));
        // The redirect carries the settled quantity, not the resulting
        // holding count.
        assert_eq!(
            events[1],
            SinkEvent::RedirectedToShare {
                creator_username: "maria".to_string(),
                collected_count: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_sell_only_refreshes_balance() {
        let sink = Arc::new(MockEffectsSink::new());
        let coordinator = EffectsCoordinator::new(sink.clone());
        // Zero prior balance on a sell must not unlock anything.
        let ctx = context(0);

        coordinator
            .on_outcome(&ctx, TradeAction::Sell, &succeeded(1))
            .await;

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SinkEvent::BalanceRefreshed { .. }));
    }

    #[tokio::test]
    async fn test_failure_is_surfaced_and_nothing_else_fires() {
        let sink = Arc::new(MockEffectsSink::new());
        let coordinator = EffectsCoordinator::new(sink.clone());
        let outcome = TradeOutcome::failed(TradeFailure::SettlementReverted);

        coordinator
            .on_outcome(&context(0), TradeAction::Buy, &outcome)
            .await;

        assert_eq!(
            sink.events(),
            vec![SinkEvent::FailureShown {
                reason: TradeFailure::SettlementReverted,
            }]
        );
    }

    #[tokio::test]
    async fn test_failing_refresh_does_not_stop_sequence() {
        let sink = Arc::new(MockEffectsSink::new());
        sink.set_fail_refresh(true);
        let coordinator = EffectsCoordinator::new(sink.clone());

        coordinator
            .on_outcome(&context(0), TradeAction::Buy, &succeeded(1))
            .await;

        // Refresh failed but unlock and redirect still ran.
        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[1], SinkEvent::ChannelUnlocked { .. }));
        assert!(matches!(events[2], SinkEvent::RedirectedToShare { .. }));
    }
}
