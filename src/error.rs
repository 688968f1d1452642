//! Error taxonomy shared by every layer of the SDK.
//!
//! # Design Decisions
//! - One error enum for the whole public surface; layers add context, never swallow
//! - Contract-level rejections carry the node's reason verbatim
//! - Stake workflow failures are tagged with the phase that failed

use std::time::Duration;

use alloy::primitives::TxHash;
use thiserror::Error;

/// Phase of the approve → stake workflow in which a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakePhase {
    /// Token allowance for the stake contract (submission or mining).
    Approve,
    /// The staking call itself.
    Stake,
}

impl std::fmt::Display for StakePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StakePhase::Approve => write!(f, "approve"),
            StakePhase::Stake => write!(f, "stake"),
        }
    }
}

/// Errors that can occur while driving the token and stake contracts.
#[derive(Debug, Error)]
pub enum SdkError {
    /// Transport unreachable or session closed.
    #[error("connection error: {0}")]
    Connection(String),

    /// Node serves a different chain than configured.
    #[error("chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// A write path was used without a credential.
    #[error("wallet not authenticated: set a private key first")]
    Unauthenticated,

    /// Malformed private key material.
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    /// Read-only call rejected by the contract or node.
    #[error("call to {method} failed: {reason}")]
    Call { method: String, reason: String },

    /// State-changing call rejected at submission.
    #[error("transaction {method} failed: {reason}")]
    Transact { method: String, reason: String },

    /// Response does not match the expected schema.
    #[error("decode error in {context}: {reason}")]
    Decode { context: String, reason: String },

    /// Mining wait exceeded its deadline.
    #[error("transaction {tx_hash} not mined within {waited:?}")]
    ConfirmationTimeout { tx_hash: TxHash, waited: Duration },

    /// Transaction was mined but reverted.
    #[error("transaction {tx_hash} reverted in block {block_number}")]
    Reverted { tx_hash: TxHash, block_number: u64 },

    /// Live log stream dropped.
    #[error("subscription error: {0}")]
    Subscription(String),

    /// Unknown method/event, argument mismatch or malformed schema.
    #[error("ABI error: {0}")]
    Abi(String),

    /// Optional component was not configured.
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    /// Failure inside the stake workflow, tagged with its phase.
    #[error("stake failed during {phase} phase: {source}")]
    Stake {
        phase: StakePhase,
        #[source]
        source: Box<SdkError>,
    },
}

impl SdkError {
    /// Tag an error with the stake phase it happened in.
    pub fn in_phase(self, phase: StakePhase) -> Self {
        SdkError::Stake {
            phase,
            source: Box::new(self),
        }
    }

    /// Stake phase this error belongs to, if any.
    pub fn phase(&self) -> Option<StakePhase> {
        match self {
            SdkError::Stake { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// The underlying cause with phase tags removed.
    pub fn root(&self) -> &SdkError {
        match self {
            SdkError::Stake { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn decode(context: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        SdkError::Decode {
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;
