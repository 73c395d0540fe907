//! Trade executor: the per-attempt state machine.
//!
//! Each call to [`TradeExecutor::execute`] drives one trade attempt
//! through Quoting, (Approving,) Settling and Confirming, and always
//! returns a terminal [`TradeOutcome`]. Failures never panic and never
//! escape as `Err`; every exit is an outcome the caller can surface.
//!
//! Per-account single-flight is enforced with an in-flight registry: a
//! second request for an account whose trade is still running fails
//! immediately with `TradeInProgress`, without touching the network.

use std::fmt;

use alloy::primitives::Address;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use ct_chain::{
    abi, DynChainReader, DynWalletClient, ReceiptPoller, TokenReader, TxRequest, WalletError,
};
use ct_core::{PriceQuote, TradeAction, TradeFailure, TradeId, TradeOutcome, TradeRequest};

use crate::allowance::AllowanceGate;
use crate::config::TradeConfig;
use crate::error::ConfigError;
use crate::quote::QuoteEngine;

/// Stage a trade attempt is in, used for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradePhase {
    Idle,
    Quoting,
    Approving,
    Settling,
    Confirming,
    Succeeded,
    Failed,
}

impl fmt::Display for TradePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Quoting => "quoting",
            Self::Approving => "approving",
            Self::Settling => "settling",
            Self::Confirming => "confirming",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Releases the in-flight slot on every exit path, including drops from
/// cancellation.
struct InFlightGuard<'a> {
    registry: &'a DashMap<Address, TradeId>,
    account: Address,
}

impl<'a> InFlightGuard<'a> {
    fn try_acquire(
        registry: &'a DashMap<Address, TradeId>,
        account: Address,
        trade_id: TradeId,
    ) -> Option<Self> {
        match registry.entry(account) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(trade_id);
                Some(Self { registry, account })
            }
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry.remove(&self.account);
    }
}

/// Orchestrates one trade attempt end to end.
pub struct TradeExecutor {
    config: TradeConfig,
    wallet: DynWalletClient,
    tokens: TokenReader,
    quotes: QuoteEngine,
    gate: AllowanceGate,
    poller: ReceiptPoller,
    in_flight: DashMap<Address, TradeId>,
}

impl TradeExecutor {
    /// Build an executor from validated configuration and the chain
    /// seams.
    pub fn new(
        config: TradeConfig,
        wallet: DynWalletClient,
        reader: DynChainReader,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let usdc = config.usdc()?;

        let tokens = TokenReader::new(reader);
        let poller = config.receipt_poller();
        let quotes = QuoteEngine::new(tokens.clone(), config.clone());
        let gate = AllowanceGate::new(
            wallet.clone(),
            tokens.clone(),
            poller.clone(),
            config.settlement_chain.clone(),
            usdc,
        );

        Ok(Self {
            config,
            wallet,
            tokens,
            quotes,
            gate,
            poller,
            in_flight: DashMap::new(),
        })
    }

    /// True while a trade for `account` is running.
    #[must_use]
    pub fn has_in_flight(&self, account: Address) -> bool {
        self.in_flight.contains_key(&account)
    }

    /// Run one trade attempt to its terminal outcome.
    ///
    /// Validation happens before any network call; the in-flight slot is
    /// taken next and held for the whole attempt.
    pub async fn execute(&self, request: TradeRequest) -> TradeOutcome {
        let trade_id = TradeId::new();

        if request.validate().is_err() {
            warn!(
                trade_id = %trade_id,
                account = %request.account,
                quantity = request.quantity,
                "Rejected invalid trade request"
            );
            return TradeOutcome::failed(TradeFailure::InvalidQuantity);
        }

        let _guard = match InFlightGuard::try_acquire(&self.in_flight, request.account, trade_id.clone())
        {
            Some(guard) => guard,
            None => {
                warn!(
                    trade_id = %trade_id,
                    account = %request.account,
                    "Trade already in progress for account"
                );
                return TradeOutcome::failed(TradeFailure::TradeInProgress);
            }
        };

        let outcome = self.run(&trade_id, &request).await;
        match &outcome {
            TradeOutcome::Succeeded {
                settled_quantity,
                tx_hash,
            } => {
                info!(
                    trade_id = %trade_id,
                    phase = %TradePhase::Succeeded,
                    account = %request.account,
                    quantity = settled_quantity,
                    tx_hash = %tx_hash,
                    "Trade settled"
                );
            }
            TradeOutcome::Failed { reason } => {
                warn!(
                    trade_id = %trade_id,
                    phase = %TradePhase::Failed,
                    account = %request.account,
                    reason = %reason,
                    retryable = reason.is_retryable(),
                    "Trade failed"
                );
            }
        }
        outcome
    }

    async fn run(&self, trade_id: &TradeId, request: &TradeRequest) -> TradeOutcome {
        if self.wallet.active_address().is_none() {
            warn!(trade_id = %trade_id, "No active wallet account");
            return TradeOutcome::failed(TradeFailure::WalletUnavailable(
                WalletError::NoActiveAccount.to_string(),
            ));
        }

        info!(
            trade_id = %trade_id,
            phase = %TradePhase::Quoting,
            account = %request.account,
            token = %request.token,
            action = %request.action,
            quantity = request.quantity,
            "Trade started"
        );

        let mut quote = match self.fetch_quote(request).await {
            Ok(quote) => quote,
            Err(outcome) => return outcome,
        };

        // Only buys spend the stablecoin, so only buys need an allowance.
        let mut approved_for = None;
        if request.action.is_buy() {
            debug!(
                trade_id = %trade_id,
                phase = %TradePhase::Approving,
                required = %quote.total,
                "Ensuring allowance"
            );
            match self
                .gate
                .ensure_allowance(request.account, request.token, quote.total)
                .await
            {
                Ok(_) => approved_for = Some(quote.total),
                Err(e) => return TradeOutcome::failed(e.into()),
            }
        }

        // A quote that outlived its TTL (a slow approval, say) is
        // refetched rather than settled against silently.
        if quote.is_stale() {
            debug!(trade_id = %trade_id, "Quote stale before settlement, refetching");
            quote = match self.fetch_quote(request).await {
                Ok(quote) => quote,
                Err(outcome) => return outcome,
            };
            if let Some(approved) = approved_for {
                if quote.total > approved {
                    debug!(
                        trade_id = %trade_id,
                        approved = %approved,
                        required = %quote.total,
                        "Refetched quote exceeds approved amount, re-running gate"
                    );
                    if let Err(e) = self
                        .gate
                        .ensure_allowance(request.account, request.token, quote.total)
                        .await
                    {
                        return TradeOutcome::failed(e.into());
                    }
                }
            }
        }

        // The allowance check can short-circuit without moving networks,
        // and sells skip it entirely, so settle only after an explicit
        // network check.
        if let Err(e) = self.gate.ensure_network().await {
            return TradeOutcome::failed(e.into());
        }

        let data = match request.action {
            TradeAction::Buy => abi::buy_calldata(
                request.quantity,
                quote
                    .total
                    .with_slippage_up(self.config.slippage_bps)
                    .base_units(),
            ),
            TradeAction::Sell => abi::sell_calldata(
                request.quantity,
                quote
                    .total
                    .with_slippage_down(self.config.slippage_bps)
                    .base_units(),
            ),
        };

        debug!(
            trade_id = %trade_id,
            phase = %TradePhase::Settling,
            total = %quote.total,
            slippage_bps = self.config.slippage_bps,
            "Submitting settlement"
        );
        let tx_hash = match self
            .wallet
            .send_transaction(TxRequest::call(request.account, request.token, data))
            .await
        {
            Ok(hash) => hash,
            Err(e) => return TradeOutcome::failed(TradeFailure::WalletUnavailable(e.to_string())),
        };

        debug!(
            trade_id = %trade_id,
            phase = %TradePhase::Confirming,
            tx_hash = %tx_hash,
            "Waiting for settlement receipt"
        );
        match self
            .poller
            .wait_for_receipt(self.tokens.raw().as_ref(), tx_hash)
            .await
        {
            Ok(receipt) if receipt.is_success() => TradeOutcome::Succeeded {
                settled_quantity: request.quantity,
                tx_hash,
            },
            Ok(_) => TradeOutcome::failed(TradeFailure::SettlementReverted),
            Err(_) => TradeOutcome::failed(TradeFailure::SettlementTimeout),
        }
    }

    async fn fetch_quote(&self, request: &TradeRequest) -> Result<PriceQuote, TradeOutcome> {
        self.quotes
            .get_quote(request.token, request.action, request.quantity)
            .await
            .map_err(|e| TradeOutcome::failed(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{B256, U256};
    use ct_chain::{
        MockChainReader, MockWalletClient, ReceiptStatus, TxReceipt, WalletClient, WalletError,
    };
    use ct_chain::abi::ICreatorToken;
    use alloy::sol_types::SolCall;
    use std::sync::Arc;

    const ACCOUNT: Address = Address::repeat_byte(0x11);
    const TOKEN: Address = Address::repeat_byte(0x44);

    struct Harness {
        wallet: Arc<MockWalletClient>,
        chain: Arc<MockChainReader>,
        executor: Arc<TradeExecutor>,
    }

    fn harness_with(config: TradeConfig, wallet_chain_id: u64) -> Harness {
        let wallet = Arc::new(MockWalletClient::new(ACCOUNT, wallet_chain_id));
        let chain = Arc::new(MockChainReader::new());
        let executor = Arc::new(
            TradeExecutor::new(config, wallet.clone(), chain.clone()).unwrap(),
        );
        Harness {
            wallet,
            chain,
            executor,
        }
    }

    fn harness() -> Harness {
        harness_with(TradeConfig::default(), 8453)
    }

    fn mined(tx_hash: B256, status: ReceiptStatus) -> TxReceipt {
        TxReceipt {
            tx_hash,
            status,
            block_number: 42,
        }
    }

    fn request(action: TradeAction, quantity: u64) -> TradeRequest {
        TradeRequest {
            account: ACCOUNT,
            token: TOKEN,
            action,
            quantity,
        }
    }

    /// Constant-marginal buy curve: 5 USDC per unit, cumulative.
    fn flat_buy_curve(h: &Harness) {
        h.chain
            .set_buy_curve(|q| U256::from(q) * U256::from(5_000_000u64));
    }

    #[tokio::test]
    async fn test_invalid_quantity_makes_no_network_calls() {
        let h = harness();

        let outcome = h.executor.execute(request(TradeAction::Buy, 0)).await;

        assert_eq!(outcome.failure(), Some(&TradeFailure::InvalidQuantity));
        assert_eq!(h.chain.call_count(), 0);
        assert!(h.wallet.sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_disconnected_wallet_fails_without_network_calls() {
        let wallet = Arc::new(MockWalletClient::disconnected(8453));
        let chain = Arc::new(MockChainReader::new());
        let executor =
            TradeExecutor::new(TradeConfig::default(), wallet.clone(), chain.clone()).unwrap();

        let outcome = executor.execute(request(TradeAction::Buy, 1)).await;

        assert!(matches!(
            outcome.failure(),
            Some(TradeFailure::WalletUnavailable(_))
        ));
        assert_eq!(chain.call_count(), 0);
        assert!(wallet.sent_transactions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_buy_with_existing_allowance_settles_directly() {
        let h = harness();
        flat_buy_curve(&h);
        h.chain
            .set_allowance(ACCOUNT, TOKEN, U256::from(100_000_000u64));
        let hash = B256::repeat_byte(0xb1);
        h.wallet.push_send_result(Ok(hash));
        h.chain
            .script_receipts(hash, vec![None, Some(mined(hash, ReceiptStatus::Success))]);

        let outcome = h.executor.execute(request(TradeAction::Buy, 2)).await;

        assert_eq!(
            outcome,
            TradeOutcome::Succeeded {
                settled_quantity: 2,
                tx_hash: hash,
            }
        );
        // One transaction only: the settlement, no approval.
        let sent = h.wallet.sent_transactions();
        assert_eq!(sent.len(), 1);
        let call = ICreatorToken::buyCall::abi_decode(&sent[0].data, true).unwrap();
        assert_eq!(call.quantity, U256::from(2u64));
        // 10 USDC total with 100 bps tolerance
        assert_eq!(call.maxPayment, U256::from(10_100_000u64));
    }

    #[tokio::test(start_paused = true)]
    async fn test_buy_without_allowance_approves_exact_total_first() {
        let h = harness();
        flat_buy_curve(&h);
        let approve_hash = B256::repeat_byte(0xb2);
        let buy_hash = B256::repeat_byte(0xb3);
        h.wallet.push_send_result(Ok(approve_hash));
        h.wallet.push_send_result(Ok(buy_hash));
        h.chain.script_receipts(
            approve_hash,
            vec![Some(mined(approve_hash, ReceiptStatus::Success))],
        );
        h.chain.script_receipts(
            buy_hash,
            vec![Some(mined(buy_hash, ReceiptStatus::Success))],
        );

        let outcome = h.executor.execute(request(TradeAction::Buy, 1)).await;

        assert!(outcome.is_success());
        let sent = h.wallet.sent_transactions();
        assert_eq!(sent.len(), 2);
        // Approval is for exactly the quoted total, not the bounded max.
        assert_eq!(
            sent[0].data,
            abi::approve_calldata(TOKEN, U256::from(5_000_000u64))
        );
        let call = ICreatorToken::buyCall::abi_decode(&sent[1].data, true).unwrap();
        assert_eq!(call.maxPayment, U256::from(5_050_000u64));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sell_skips_allowance_and_bounds_proceeds_down() {
        let h = harness();
        h.chain
            .set_sell_curve(|q| U256::from(q) * U256::from(4_000_000u64));
        let hash = B256::repeat_byte(0xb4);
        h.wallet.push_send_result(Ok(hash));
        h.chain
            .script_receipts(hash, vec![Some(mined(hash, ReceiptStatus::Success))]);

        let outcome = h.executor.execute(request(TradeAction::Sell, 2)).await;

        assert!(outcome.is_success());
        let sent = h.wallet.sent_transactions();
        assert_eq!(sent.len(), 1);
        let call = ICreatorToken::sellCall::abi_decode(&sent[0].data, true).unwrap();
        // 8 USDC total with 100 bps tolerance down
        assert_eq!(call.minProceeds, U256::from(7_920_000u64));
        // No allowance read happened: only the two sell-curve reads.
        assert_eq!(h.chain.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sell_switches_to_settlement_network() {
        let h = harness_with(TradeConfig::default(), 1);
        h.chain
            .set_sell_curve(|q| U256::from(q) * U256::from(4_000_000u64));
        let hash = B256::repeat_byte(0xb5);
        h.wallet.push_send_result(Ok(hash));
        h.chain
            .script_receipts(hash, vec![Some(mined(hash, ReceiptStatus::Success))]);

        let outcome = h.executor.execute(request(TradeAction::Sell, 1)).await;

        assert!(outcome.is_success());
        assert_eq!(h.wallet.switch_requests(), vec![8453]);
        assert_eq!(h.wallet.active_chain_id(), 8453);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reverted_settlement_fails_terminally() {
        let h = harness();
        h.chain
            .set_sell_curve(|q| U256::from(q) * U256::from(4_000_000u64));
        let hash = B256::repeat_byte(0xb6);
        h.wallet.push_send_result(Ok(hash));
        h.chain
            .script_receipts(hash, vec![Some(mined(hash, ReceiptStatus::Reverted))]);

        // Oversell: the contract reverts, the executor does not pre-check
        // the token balance.
        let outcome = h.executor.execute(request(TradeAction::Sell, 5)).await;

        assert_eq!(outcome.failure(), Some(&TradeFailure::SettlementReverted));
        assert!(!h.executor.has_in_flight(ACCOUNT));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfirmed_settlement_times_out() {
        let config = TradeConfig {
            receipt_max_wait_ms: 6_000,
            ..TradeConfig::default()
        };
        let h = harness_with(config, 8453);
        flat_buy_curve(&h);
        h.chain
            .set_allowance(ACCOUNT, TOKEN, U256::from(100_000_000u64));
        let hash = B256::repeat_byte(0xb7);
        h.wallet.push_send_result(Ok(hash));
        // No receipt scripted: stays pending

        let outcome = h.executor.execute(request(TradeAction::Buy, 1)).await;

        assert_eq!(outcome.failure(), Some(&TradeFailure::SettlementTimeout));
        assert!(outcome.failure().unwrap().is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_quote_is_refetched_and_bound_uses_fresh_price() {
        let config = TradeConfig {
            quote_ttl_ms: 0,
            ..TradeConfig::default()
        };
        let h = harness_with(config, 8453);
        // The curve moves between the first read and the refetch:
        // 5 USDC/unit initially, 6 USDC/unit afterwards.
        let reads = Arc::new(std::sync::atomic::AtomicU64::new(0));
        h.chain.set_buy_curve(move |q| {
            let n = reads.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let unit = if n == 0 { 5_000_000u64 } else { 6_000_000u64 };
            U256::from(q) * U256::from(unit)
        });
        h.chain
            .set_allowance(ACCOUNT, TOKEN, U256::from(100_000_000u64));
        let hash = B256::repeat_byte(0xb8);
        h.wallet.push_send_result(Ok(hash));
        h.chain
            .script_receipts(hash, vec![Some(mined(hash, ReceiptStatus::Success))]);

        let outcome = h.executor.execute(request(TradeAction::Buy, 1)).await;

        assert!(outcome.is_success());
        // The slippage bound comes from the refetched 6 USDC quote, not
        // the stale 5 USDC one.
        let sent = h.wallet.sent_transactions();
        let call = ICreatorToken::buyCall::abi_decode(&sent[0].data, true).unwrap();
        assert_eq!(call.maxPayment, U256::from(6_060_000u64));
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_accounts_trade_independently() {
        let h = harness();
        flat_buy_curve(&h);
        let other = Address::repeat_byte(0x12);
        h.chain
            .set_allowance(ACCOUNT, TOKEN, U256::from(100_000_000u64));
        h.chain
            .set_allowance(other, TOKEN, U256::from(100_000_000u64));

        let hash1 = B256::repeat_byte(0xbb);
        h.wallet.push_send_result(Ok(hash1));
        // First account's trade parks on receipt polling.
        h.chain.script_receipts(
            hash1,
            vec![None, None, Some(mined(hash1, ReceiptStatus::Success))],
        );

        let first = {
            let executor = h.executor.clone();
            tokio::spawn(async move { executor.execute(request(TradeAction::Buy, 1)).await })
        };
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(h.executor.has_in_flight(ACCOUNT));

        // The other account is not blocked by the first one's slot.
        let hash2 = B256::repeat_byte(0xbc);
        h.wallet.push_send_result(Ok(hash2));
        h.chain
            .script_receipts(hash2, vec![Some(mined(hash2, ReceiptStatus::Success))]);
        let second = h
            .executor
            .execute(TradeRequest {
                account: other,
                token: TOKEN,
                action: TradeAction::Buy,
                quantity: 1,
            })
            .await;
        assert!(second.is_success());

        assert!(first.await.unwrap().is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_oracle_outage_fails_before_any_transaction() {
        let h = harness();
        h.chain.set_fail_calls(true);

        let outcome = h.executor.execute(request(TradeAction::Buy, 1)).await;

        assert_eq!(outcome.failure(), Some(&TradeFailure::OracleUnavailable));
        assert!(h.wallet.sent_transactions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wallet_rejection_during_settlement() {
        let h = harness();
        h.chain
            .set_sell_curve(|q| U256::from(q) * U256::from(4_000_000u64));
        h.wallet.push_send_result(Err(WalletError::UserRejected));

        let outcome = h.executor.execute(request(TradeAction::Sell, 1)).await;

        assert!(matches!(
            outcome.failure(),
            Some(TradeFailure::WalletUnavailable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_trade_for_same_account_is_rejected() {
        let h = harness();
        flat_buy_curve(&h);
        h.chain
            .set_allowance(ACCOUNT, TOKEN, U256::from(100_000_000u64));
        let hash = B256::repeat_byte(0xb9);
        h.wallet.push_send_result(Ok(hash));
        // First trade parks on receipt polling before confirming.
        h.chain.script_receipts(
            hash,
            vec![None, None, Some(mined(hash, ReceiptStatus::Success))],
        );

        let first = {
            let executor = h.executor.clone();
            tokio::spawn(async move { executor.execute(request(TradeAction::Buy, 1)).await })
        };
        // Let the first trade reach the receipt poll and park there.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(h.executor.has_in_flight(ACCOUNT));

        let second = h.executor.execute(request(TradeAction::Buy, 1)).await;
        assert_eq!(second.failure(), Some(&TradeFailure::TradeInProgress));

        let first = first.await.unwrap();
        assert!(first.is_success());
        assert!(!h.executor.has_in_flight(ACCOUNT));

        // Slot released: a fresh trade goes through again.
        let hash2 = B256::repeat_byte(0xba);
        h.wallet.push_send_result(Ok(hash2));
        h.chain
            .script_receipts(hash2, vec![Some(mined(hash2, ReceiptStatus::Success))]);
        let third = h.executor.execute(request(TradeAction::Buy, 1)).await;
        assert!(third.is_success());
    }
}
