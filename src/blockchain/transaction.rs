//! Submitted transactions and confirmation monitoring.
//!
//! # Responsibilities
//! - Identify a submitted state change by hash, method and sender
//! - Poll receipts until the transaction is mined or the deadline passes
//! - Tell reverted transactions apart from timeouts and network failures

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::primitives::{Address, TxHash};
use tokio::time::{interval, timeout};

use crate::blockchain::transport::Transport;
use crate::blockchain::types::{ConfirmationPolicy, ConfirmationStatus, MinedReceipt};
use crate::error::{SdkError, SdkResult};
use crate::observability::metrics;

/// Lower bound on the receipt polling period; `tokio::time::interval` rejects zero.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A state change accepted by the node but not yet known to be mined.
#[derive(Clone)]
pub struct PendingTransaction {
    tx_hash: TxHash,
    method: String,
    from: Address,
    transport: Arc<dyn Transport>,
}

impl PendingTransaction {
    pub(crate) fn new(
        tx_hash: TxHash,
        method: impl Into<String>,
        from: Address,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            tx_hash,
            method: method.into(),
            from,
            transport,
        }
    }

    pub fn hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Contract method this transaction invoked.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Sender the transaction was signed for.
    pub fn from(&self) -> Address {
        self.from
    }

    /// Poll the node once.
    pub async fn status(&self, required_blocks: u32) -> SdkResult<ConfirmationStatus> {
        let receipt = match self.transport.receipt(self.tx_hash).await? {
            Some(receipt) => receipt,
            None => return Ok(ConfirmationStatus::Pending),
        };

        if !receipt.success {
            return Ok(ConfirmationStatus::Reverted {
                block_number: receipt.block_number,
            });
        }

        if required_blocks == 0 {
            return Ok(ConfirmationStatus::Confirmed {
                block_number: receipt.block_number,
            });
        }

        let current_block = self.transport.block_number().await?;
        let confirmations =
            u32::try_from(current_block.saturating_sub(receipt.block_number)).unwrap_or(u32::MAX);

        if confirmations >= required_blocks {
            Ok(ConfirmationStatus::Confirmed {
                block_number: receipt.block_number,
            })
        } else {
            Ok(ConfirmationStatus::Confirming {
                current: confirmations,
                required: required_blocks,
            })
        }
    }

    /// Wait until the transaction is included in a block, ignoring extra depth.
    pub async fn wait_mined(&self, policy: &ConfirmationPolicy) -> SdkResult<MinedReceipt> {
        let policy = ConfirmationPolicy {
            confirmation_blocks: 0,
            ..*policy
        };
        self.confirm(&policy).await
    }

    /// Wait until the transaction has `policy.confirmation_blocks` blocks on top.
    ///
    /// Fails with [`SdkError::Reverted`] when mined with a failure status and
    /// with [`SdkError::ConfirmationTimeout`] when `policy.timeout` elapses.
    pub async fn confirm(&self, policy: &ConfirmationPolicy) -> SdkResult<MinedReceipt> {
        let started = Instant::now();
        let required = policy.confirmation_blocks;

        let result = timeout(policy.timeout, async {
            let mut ticker = interval(policy.poll_interval.max(MIN_POLL_INTERVAL));

            loop {
                ticker.tick().await;

                match self.status(required).await? {
                    ConfirmationStatus::Pending => {
                        tracing::debug!(
                            tx_hash = %self.tx_hash,
                            method = %self.method,
                            "Transaction pending"
                        );
                    }
                    ConfirmationStatus::Confirming { current, required } => {
                        tracing::debug!(
                            tx_hash = %self.tx_hash,
                            confirmations = current,
                            required = required,
                            "Waiting for confirmations"
                        );
                    }
                    ConfirmationStatus::Confirmed { block_number } => {
                        return Ok(MinedReceipt {
                            tx_hash: self.tx_hash,
                            block_number,
                            success: true,
                        });
                    }
                    ConfirmationStatus::Reverted { block_number } => {
                        return Err(SdkError::Reverted {
                            tx_hash: self.tx_hash,
                            block_number,
                        });
                    }
                }
            }
        })
        .await;

        let elapsed = started.elapsed();
        let outcome = match &result {
            Ok(Ok(_)) => "mined",
            Ok(Err(SdkError::Reverted { .. })) => "reverted",
            Ok(Err(_)) => "error",
            Err(_) => "timeout",
        };
        metrics::record_confirmation_wait(elapsed, outcome);

        match result {
            Ok(Ok(receipt)) => {
                tracing::debug!(
                    tx_hash = %self.tx_hash,
                    block_number = receipt.block_number,
                    "Transaction mined"
                );
                Ok(receipt)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                tracing::warn!(
                    tx_hash = %self.tx_hash,
                    method = %self.method,
                    waited = ?elapsed,
                    "Transaction not mined before deadline"
                );
                Err(SdkError::ConfirmationTimeout {
                    tx_hash: self.tx_hash,
                    waited: policy.timeout,
                })
            }
        }
    }
}

impl std::fmt::Debug for PendingTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTransaction")
            .field("tx_hash", &self.tx_hash)
            .field("method", &self.method)
            .field("from", &self.from)
            .finish()
    }
}
