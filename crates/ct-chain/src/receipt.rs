//! Fixed-interval transaction confirmation polling.
//!
//! Both the allowance gate and the trade executor block on transaction
//! confirmation; this primitive is the single place that polling lives.
//! Dropping the returned future cancels the poll with no side effects.

use std::time::Duration;

use alloy::primitives::B256;
use thiserror::Error;
use tracing::{debug, warn};

use crate::reader::{ChainReader, TxReceipt};

/// Errors from receipt polling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiptError {
    /// No receipt appeared within the maximum wait. The transaction may
    /// still confirm later; callers surface this as a timeout and rely
    /// on a later balance refresh to reconcile.
    #[error("Transaction {tx_hash} not confirmed within {waited_ms}ms")]
    Timeout { tx_hash: B256, waited_ms: u128 },
}

/// Polls for a transaction receipt at a fixed interval with a bounded
/// maximum wait.
#[derive(Debug, Clone)]
pub struct ReceiptPoller {
    interval: Duration,
    max_wait: Duration,
}

impl ReceiptPoller {
    /// Create a poller with the given interval and maximum wait.
    #[must_use]
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }

    /// Poll until the transaction is mined or the deadline passes.
    ///
    /// Transient read errors are logged and retried on the next tick;
    /// a persistent outage therefore surfaces as a timeout.
    pub async fn wait_for_receipt(
        &self,
        reader: &dyn ChainReader,
        tx_hash: B256,
    ) -> Result<TxReceipt, ReceiptError> {
        let started = tokio::time::Instant::now();

        loop {
            match reader.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    debug!(
                        tx_hash = %tx_hash,
                        block = receipt.block_number,
                        success = receipt.is_success(),
                        "Transaction mined"
                    );
                    return Ok(receipt);
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed, retrying");
                }
            }

            if started.elapsed() + self.interval > self.max_wait {
                return Err(ReceiptError::Timeout {
                    tx_hash,
                    waited_ms: started.elapsed().as_millis(),
                });
            }
            tokio::time::sleep(self.interval).await;
        }
    }
}
