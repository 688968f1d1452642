//! Chain-level value types shared by the transport, bindings and facades.

use std::time::Duration;

use alloy::primitives::{TxHash, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::schema::ConfirmationConfig;
use crate::error::SdkError;

/// Token and stake quantities. Unsigned and exact.
pub type Amount = U256;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Opaque key identifying a staking account. Not a chain address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upper bound of a block range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockTag {
    /// Resolved to the chain head when the query starts.
    #[default]
    Latest,
    Number(u64),
}

/// Inclusive block range for historical log queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockRange {
    pub from: u64,
    pub to: BlockTag,
}

impl BlockRange {
    /// From `from` up to the chain head.
    pub fn since(from: u64) -> Self {
        Self {
            from,
            to: BlockTag::Latest,
        }
    }

    /// Fixed `[from, to]` range.
    pub fn between(from: u64, to: u64) -> Self {
        Self {
            from,
            to: BlockTag::Number(to),
        }
    }
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinedReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// False when the transaction was mined but reverted.
    pub success: bool,
}

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Transaction is pending in mempool.
    Pending,
    /// Transaction has been mined but not enough confirmations.
    Confirming { current: u32, required: u32 },
    /// Transaction is confirmed with required block depth.
    Confirmed { block_number: u64 },
    /// Transaction was mined and reverted.
    Reverted { block_number: u64 },
}

/// How long and how often to wait for a transaction to be mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Blocks on top of the inclusion block; 0 means mined is enough.
    pub confirmation_blocks: u32,
}

impl Default for ConfirmationPolicy {
    fn default() -> Self {
        Self::from(&ConfirmationConfig::default())
    }
}

impl From<&ConfirmationConfig> for ConfirmationPolicy {
    fn from(config: &ConfirmationConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            confirmation_blocks: config.confirmation_blocks,
        }
    }
}

/// Errors reported by a [`Transport`](crate::blockchain::transport::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// Endpoint unreachable or connection dropped.
    #[error("{0}")]
    Connection(String),

    /// The node answered with an error (revert, insufficient funds, bad nonce...).
    #[error("{0}")]
    Rejected(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0:?}")]
    Timeout(Duration),

    /// Session already released by its owner.
    #[error("transport session closed")]
    Closed,
}

impl TransportError {
    /// Map into the SDK taxonomy for a read-only call.
    pub(crate) fn into_call_error(self, method: &str) -> SdkError {
        match self {
            TransportError::Rejected(reason) => SdkError::Call {
                method: method.to_string(),
                reason,
            },
            other => SdkError::Connection(other.to_string()),
        }
    }

    /// Map into the SDK taxonomy for a state-changing call.
    pub(crate) fn into_transact_error(self, method: &str) -> SdkError {
        match self {
            TransportError::Rejected(reason) => SdkError::Transact {
                method: method.to_string(),
                reason,
            },
            other => SdkError::Connection(other.to_string()),
        }
    }
}

impl From<TransportError> for SdkError {
    fn from(err: TransportError) -> Self {
        SdkError::Connection(err.to_string())
    }
}
